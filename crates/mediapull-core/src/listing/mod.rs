//! Cursor-driven resource listing.
//!
//! Drains the paginated listing endpoint into one ordered sequence of
//! [`ResourceRecord`]s: one request per page, strictly sequential, until a
//! response carries no `next_cursor`. The transport sits behind
//! [`PageSource`] so the loop can be driven by a scripted source in tests.

mod client;
mod parse;

pub use client::CurlPageSource;
pub use parse::{parse_page, parse_rate_limit, ListingEntry, RateLimit};

use crate::error::PullError;
use crate::record::ResourceRecord;

/// Parameters of one listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page_size: u32,
    /// Continuation token from the previous response; absent on the first request.
    pub cursor: Option<String>,
    pub prefix: Option<String>,
}

impl PageRequest {
    /// Query parameters in wire order. Absent cursor/prefix are omitted
    /// entirely rather than sent empty.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("max_results", self.page_size.to_string())];
        if let Some(cursor) = &self.cursor {
            pairs.push(("next_cursor", cursor.clone()));
        }
        if let Some(prefix) = &self.prefix {
            pairs.push(("prefix", prefix.clone()));
        }
        pairs
    }
}

/// One decoded listing response.
#[derive(Debug, Clone, Default)]
pub struct RawPage {
    pub entries: Vec<ListingEntry>,
    pub next_cursor: Option<String>,
    /// Quota telemetry from response headers, if the server sent any.
    pub rate_limit: Option<RateLimit>,
}

/// Fetches a single listing page.
pub trait PageSource {
    /// Endpoint description for log lines.
    fn endpoint(&self) -> String;

    fn fetch_page(&mut self, request: &PageRequest) -> Result<RawPage, PullError>;
}

/// Lists every resource, following cursors until the last page.
///
/// Any page failure aborts the whole listing; nothing accumulated so far is
/// returned. Records come back in page order then within-page order, with
/// `sequence_index` still unassigned (0).
pub fn list_all<S: PageSource + ?Sized>(
    source: &mut S,
    prefix: Option<&str>,
    page_size: u32,
) -> Result<Vec<ResourceRecord>, PullError> {
    let mut records: Vec<ResourceRecord> = Vec::new();
    let mut request = PageRequest {
        page_size,
        cursor: None,
        prefix: prefix.map(str::to_string),
    };
    let mut page_no = 0usize;

    loop {
        page_no += 1;
        let page = source.fetch_page(&request)?;
        let count = page.entries.len();
        match &page.rate_limit {
            Some(rl) => tracing::info!(
                page = page_no,
                entries = count,
                remaining = ?rl.remaining,
                limit = ?rl.limit,
                reset = ?rl.reset,
                "listing page received"
            ),
            None => tracing::info!(page = page_no, entries = count, "listing page received"),
        }

        records.extend(page.entries.into_iter().map(ListingEntry::into_record));

        match page.next_cursor {
            Some(cursor) if !cursor.is_empty() => request.cursor = Some(cursor),
            _ => break,
        }
    }

    tracing::debug!(pages = page_no, records = records.len(), "listing complete");
    Ok(records)
}
