//! Decode listing response bodies and rate-limit headers.

use serde::Deserialize;

use super::RawPage;
use crate::error::PullError;
use crate::record::ResourceRecord;

/// The four fields kept from a listing entry; everything else in the
/// response is ignored during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListingEntry {
    pub public_id: String,
    pub format: String,
    pub bytes: u64,
    pub secure_url: String,
}

impl ListingEntry {
    pub fn into_record(self) -> ResourceRecord {
        ResourceRecord {
            identifier: self.public_id,
            format: self.format,
            size_bytes: self.bytes,
            source_url: self.secure_url,
            sequence_index: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListingBody {
    #[serde(default)]
    resources: Vec<ListingEntry>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Quota telemetry from `X-FeatureRateLimit-*` headers. Log-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    /// Reset time as sent by the server (an HTTP date).
    pub reset: Option<String>,
}

/// Parse a listing body plus the response header lines into a page.
pub fn parse_page(body: &[u8], header_lines: &[String]) -> Result<RawPage, PullError> {
    let decoded: ListingBody = serde_json::from_slice(body)?;
    Ok(RawPage {
        entries: decoded.resources,
        next_cursor: decoded.next_cursor,
        rate_limit: parse_rate_limit(header_lines),
    })
}

/// Extract rate-limit headers; None when the server sent none of them.
pub fn parse_rate_limit(lines: &[String]) -> Option<RateLimit> {
    let mut rl = RateLimit::default();
    let mut seen = false;

    for line in lines {
        let Some((name, value)) = line.trim().split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("x-featureratelimit-limit") {
            rl.limit = value.parse().ok();
            seen = true;
        } else if name.eq_ignore_ascii_case("x-featureratelimit-remaining") {
            rl.remaining = value.parse().ok();
            seen = true;
        } else if name.eq_ignore_ascii_case("x-featureratelimit-reset") {
            rl.reset = Some(value.to_string());
            seen = true;
        }
    }

    seen.then_some(rl)
}
