//! Top-level run: list → index → size → download → summarize.

use std::io;
use std::path::Path;
use std::time::Duration;

use indicatif::HumanBytes;

use crate::config::RunConfig;
use crate::error::PullError;
use crate::listing::{self, CurlPageSource, PageSource};
use crate::pool;
use crate::progress::ProgressTracker;
use crate::record::{self, ResourceRecord, RunSummary};
use crate::transport::{Connector, CurlConnector};

/// Production entry point: curl listing source and curl download workers.
pub fn pull(cfg: &RunConfig) -> Result<RunSummary, PullError> {
    let mut source = CurlPageSource::new(cfg)?;
    let connector = CurlConnector::new(cfg);
    run(cfg, &mut source, &connector)
}

/// List every resource and number it in final sequence order.
pub fn collect<S: PageSource + ?Sized>(
    cfg: &RunConfig,
    source: &mut S,
) -> Result<Vec<ResourceRecord>, PullError> {
    let mut records = listing::list_all(source, cfg.prefix.as_deref(), cfg.page_size)?;
    record::assign_sequence(&mut records);
    Ok(records)
}

/// Full run against the given listing source and download connector.
///
/// Listing errors abort before any download starts and no summary is
/// printed. Download errors are per-image and only show up in the summary.
pub fn run<S: PageSource + ?Sized, C: Connector>(
    cfg: &RunConfig,
    source: &mut S,
    connector: &C,
) -> Result<RunSummary, PullError> {
    check_output_dir(&cfg.output_dir)?;

    let endpoint = source.endpoint();
    println!("Listing images from {}", endpoint);
    tracing::info!(endpoint = %endpoint, prefix = ?cfg.prefix, "starting run");

    let records = collect(cfg, source)?;
    let total = record::total_bytes(&records);
    println!("Found {} images ({})", records.len(), HumanBytes(total));
    tracing::info!(images = records.len(), total_bytes = total, "listing finished");

    let tracker = ProgressTracker::new(total, cfg.show_progress);
    let outcomes = pool::download_all(
        &records,
        &cfg.output_dir,
        cfg.concurrency,
        connector,
        &tracker,
        cfg.verbose,
    );
    tracker.finish();

    let stats = tracker.snapshot();
    let summary = RunSummary::from_outcomes(
        &outcomes,
        total,
        stats.bytes_done,
        Duration::from_secs_f64(stats.elapsed_secs),
        cfg.output_dir.clone(),
    );
    println!("{}", summary);
    tracing::info!(
        attempted = summary.attempted,
        succeeded = summary.succeeded,
        failed = summary.failed(),
        bytes_done = summary.bytes_done,
        rate = stats.bytes_per_sec(),
        "run finished"
    );
    Ok(summary)
}

/// The output directory must already exist; it is never created here.
fn check_output_dir(dir: &Path) -> Result<(), PullError> {
    let meta = std::fs::metadata(dir).map_err(|source| PullError::Filesystem {
        path: dir.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(PullError::Filesystem {
            path: dir.to_path_buf(),
            source: io::Error::other("not a directory"),
        });
    }
    Ok(())
}
