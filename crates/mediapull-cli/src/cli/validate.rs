//! Turn parsed arguments plus the config file into a validated `RunConfig`.

use anyhow::{bail, Context, Result};
use mediapull_core::config::{Credentials, MediapullConfig, RunConfig, MAX_PAGE_SIZE};
use std::path::PathBuf;

use super::AccountArgs;

fn non_empty(value: &str, what: &str) -> Result<String> {
    let v = value.trim();
    if v.is_empty() {
        bail!("{} must not be empty", what);
    }
    Ok(v.to_string())
}

fn base_config(
    cfg: &MediapullConfig,
    account: &AccountArgs,
    output_dir: PathBuf,
) -> Result<RunConfig> {
    let credentials = Credentials::new(
        non_empty(&account.key, "API key")?,
        non_empty(&account.secret, "API secret")?,
    );
    let cloud = non_empty(&account.cloud, "cloud name")?;
    let mut run = RunConfig::from_defaults(cfg, credentials, cloud, output_dir);

    let page_size = account.page_size.unwrap_or(cfg.page_size);
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        bail!("page size must be between 1 and {} (got {})", MAX_PAGE_SIZE, page_size);
    }
    run.page_size = page_size;
    run.prefix = account.prefix.clone().filter(|p| !p.is_empty());
    Ok(run)
}

/// Settings for `mediapull pull`.
pub fn pull_config(
    cfg: &MediapullConfig,
    account: &AccountArgs,
    output_dir: PathBuf,
    concurrency: Option<usize>,
    verbose: bool,
    show_progress: bool,
) -> Result<RunConfig> {
    let meta = std::fs::metadata(&output_dir)
        .with_context(|| format!("output directory {}", output_dir.display()))?;
    if !meta.is_dir() {
        bail!("{} is not a directory", output_dir.display());
    }

    let mut run = base_config(cfg, account, output_dir)?;
    let concurrency = concurrency.unwrap_or(cfg.concurrency);
    if concurrency == 0 {
        bail!("concurrency must be at least 1");
    }
    run.concurrency = concurrency;
    run.verbose = verbose;
    run.show_progress = show_progress;
    Ok(run)
}

/// Settings for `mediapull list`; nothing is written, so no output dir check.
pub fn list_config(cfg: &MediapullConfig, account: &AccountArgs) -> Result<RunConfig> {
    let mut run = base_config(cfg, account, PathBuf::from("."))?;
    run.show_progress = false;
    Ok(run)
}
