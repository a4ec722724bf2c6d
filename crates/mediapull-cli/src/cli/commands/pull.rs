//! `mediapull pull` – list every image and download it.

use anyhow::{Context, Result};
use mediapull_core::config::RunConfig;
use mediapull_core::orchestrator;

pub async fn run_pull(cfg: RunConfig) -> Result<()> {
    tracing::info!(
        account = %cfg.account,
        output_dir = %cfg.output_dir.display(),
        concurrency = cfg.concurrency,
        page_size = cfg.page_size,
        "pull requested"
    );
    let summary = tokio::task::spawn_blocking(move || orchestrator::pull(&cfg))
        .await
        .context("pull task join")??;
    if summary.failed() > 0 {
        tracing::warn!("{} of {} images failed", summary.failed(), summary.attempted);
        for url in &summary.failed_urls {
            tracing::warn!(url = %url, "not downloaded");
        }
    }
    Ok(())
}
