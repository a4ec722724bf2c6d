//! `mediapull list` – list images without downloading.

use anyhow::{Context, Result};
use indicatif::HumanBytes;
use mediapull_core::config::RunConfig;
use mediapull_core::error::PullError;
use mediapull_core::listing::{CurlPageSource, PageSource};
use mediapull_core::orchestrator;
use mediapull_core::record::{self, ResourceRecord};

fn print_records(records: &[ResourceRecord]) {
    println!("{:<6} {:>10}  {:<40} {}", "INDEX", "SIZE", "FILE", "URL");
    for r in records {
        println!(
            "{:<6} {:>10}  {:<40} {}",
            r.sequence_index,
            r.size_bytes,
            r.file_name(),
            r.source_url
        );
    }
}

pub async fn run_list(cfg: RunConfig) -> Result<()> {
    let records = tokio::task::spawn_blocking(move || -> Result<Vec<ResourceRecord>, PullError> {
        let mut source = CurlPageSource::new(&cfg)?;
        println!("Listing images from {}", source.endpoint());
        orchestrator::collect(&cfg, &mut source)
    })
    .await
    .context("list task join")??;

    if records.is_empty() {
        println!("No images found.");
        return Ok(());
    }
    print_records(&records);
    println!(
        "{} images, {}",
        records.len(),
        HumanBytes(record::total_bytes(&records))
    );
    Ok(())
}
