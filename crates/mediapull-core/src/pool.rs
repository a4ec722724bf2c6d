//! Bounded download worker pool.
//!
//! `min(concurrency, records)` workers pull records from a shared queue and
//! run each download to completion before taking the next, so at most
//! `concurrency` transfers are in flight. Every record yields exactly one
//! [`DownloadOutcome`]; a failed image is logged immediately and never stops
//! its siblings.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

use crate::paths::destination_path;
use crate::progress::ProgressTracker;
use crate::record::{DownloadOutcome, ResourceRecord};
use crate::storage::PartFile;
use crate::transport::{Connector, Fetch, FetchError};

/// Downloads every record into `output_dir` using at most `concurrency` workers.
///
/// Successful downloads advance `tracker` by the record's expected size.
/// Outcomes come back in completion order.
pub fn download_all<C: Connector>(
    records: &[ResourceRecord],
    output_dir: &Path,
    concurrency: usize,
    connector: &C,
    tracker: &ProgressTracker,
    verbose: bool,
) -> Vec<DownloadOutcome> {
    let count = records.len();
    if count == 0 {
        return Vec::new();
    }

    let work: Mutex<VecDeque<&ResourceRecord>> = Mutex::new(records.iter().collect());
    let num_workers = concurrency.max(1).min(count);
    let (tx, rx) = mpsc::channel();

    // Workers log through the caller's subscriber, not only the global one.
    let dispatch = tracing::dispatcher::get_default(|d| d.clone());

    thread::scope(|scope| {
        for worker in 0..num_workers {
            let tx = tx.clone();
            let work = &work;
            let dispatch = &dispatch;
            scope.spawn(move || {
                tracing::dispatcher::with_default(dispatch, || {
                    let mut conn: Option<C::Conn> = None;
                    loop {
                        let next = match work.lock() {
                            Ok(mut queue) => queue.pop_front(),
                            Err(poisoned) => poisoned.into_inner().pop_front(),
                        };
                        let Some(record) = next else { break };
                        let outcome = process_record(
                            connector, &mut conn, record, output_dir, tracker, verbose,
                        );
                        tracing::trace!(
                            worker,
                            index = record.sequence_index,
                            ok = outcome.is_success(),
                            "record done"
                        );
                        let _ = tx.send(outcome);
                    }
                })
            });
        }
        drop(tx);
    });

    let outcomes: Vec<DownloadOutcome> = rx.into_iter().collect();
    debug_assert_eq!(outcomes.len(), count);
    outcomes
}

/// Runs one record through download → finalize, converting any error into a
/// `Failure` outcome after cleanup.
fn process_record<C: Connector>(
    connector: &C,
    conn: &mut Option<C::Conn>,
    record: &ResourceRecord,
    output_dir: &Path,
    tracker: &ProgressTracker,
    verbose: bool,
) -> DownloadOutcome {
    let dest = destination_path(output_dir, record);
    if verbose {
        tracker.println(&format!(
            "[{}] {} -> {}",
            record.sequence_index,
            record.source_url,
            dest.display()
        ));
    }

    match download_one(connector, conn, record, &dest) {
        Ok(bytes) => {
            tracker.advance(record.size_bytes);
            tracing::debug!(
                index = record.sequence_index,
                url = %record.source_url,
                bytes,
                "download complete"
            );
            if verbose {
                tracker.println(&format!("[{}] done ({} bytes)", record.sequence_index, bytes));
            }
            DownloadOutcome::Success {
                source_url: record.source_url.clone(),
                path: dest,
                bytes,
                sequence_index: record.sequence_index,
            }
        }
        Err(e) => {
            tracing::warn!(
                index = record.sequence_index,
                url = %record.source_url,
                "download failed: {}",
                e
            );
            tracker.eprintln(&format!("Failed to download {}: {}", record.source_url, e));
            DownloadOutcome::Failure {
                source_url: record.source_url.clone(),
                error: e.to_string(),
                sequence_index: record.sequence_index,
            }
        }
    }
}

fn download_one<C: Connector>(
    connector: &C,
    conn: &mut Option<C::Conn>,
    record: &ResourceRecord,
    dest: &Path,
) -> Result<u64, FetchError> {
    let mut fetcher = match conn.take() {
        Some(c) => c,
        None => connector.connect()?,
    };

    let mut part = match PartFile::create(dest) {
        Ok(part) => part,
        Err(e) => {
            *conn = Some(fetcher);
            return Err(e.into());
        }
    };

    match fetcher.fetch_to(&record.source_url, &mut part) {
        Ok(_) => {
            *conn = Some(fetcher);
            Ok(part.finalize()?)
        }
        Err(e) => {
            part.discard();
            // A transport error may leave the connection broken; reconnect next time.
            if !matches!(e, FetchError::Curl(_) | FetchError::Transport(_)) {
                *conn = Some(fetcher);
            }
            Err(e)
        }
    }
}
