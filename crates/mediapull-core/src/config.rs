use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Largest `max_results` the listing endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Global configuration loaded from `~/.config/mediapull/config.toml`.
///
/// These are defaults; every field can be overridden per run from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediapullConfig {
    /// Base URL of the admin API; the account identifier is appended to it.
    pub api_base_url: String,
    /// Resource type segment of the listing path.
    pub resource_type: String,
    /// Entries requested per listing page.
    pub page_size: u32,
    /// Maximum concurrent downloads (and transport connections).
    pub concurrency: usize,
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Hard per-request timeout in seconds; a download exceeding it fails.
    pub request_timeout_secs: u64,
    /// Optional User-Agent header (None = libcurl default).
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for MediapullConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.cloudinary.com/v1_1".to_string(),
            resource_type: "image".to_string(),
            page_size: MAX_PAGE_SIZE,
            concurrency: 5,
            connect_timeout_secs: 30,
            request_timeout_secs: 300,
            user_agent: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mediapull")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MediapullConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MediapullConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: MediapullConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// API key/secret pair sent as HTTP basic auth on every listing request.
#[derive(Clone)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Fully validated settings for one run, built once by the CLI and passed
/// by reference into the lister, the worker pool and the orchestrator.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub credentials: Credentials,
    /// Account identifier (cloud name) used to build the listing URL.
    pub account: String,
    pub api_base_url: String,
    pub resource_type: String,
    pub page_size: u32,
    pub concurrency: usize,
    /// Only list resources whose identifier starts with this prefix.
    pub prefix: Option<String>,
    pub output_dir: PathBuf,
    pub verbose: bool,
    /// Draw the live progress bar (false for tests and `--no-progress`).
    pub show_progress: bool,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: Option<String>,
}

impl RunConfig {
    /// Start from file defaults; the caller fills in the run-specific fields.
    pub fn from_defaults(
        cfg: &MediapullConfig,
        credentials: Credentials,
        account: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            credentials,
            account: account.into(),
            api_base_url: cfg.api_base_url.clone(),
            resource_type: cfg.resource_type.clone(),
            page_size: cfg.page_size,
            concurrency: cfg.concurrency,
            prefix: None,
            output_dir: output_dir.into(),
            verbose: false,
            show_progress: true,
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            request_timeout: Duration::from_secs(cfg.request_timeout_secs),
            user_agent: cfg.user_agent.clone(),
        }
    }

    /// Listing endpoint for this account, without query parameters.
    pub fn listing_endpoint(&self) -> String {
        format!(
            "{}/{}/resources/{}",
            self.api_base_url.trim_end_matches('/'),
            self.account,
            self.resource_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = MediapullConfig::default();
        assert_eq!(cfg.page_size, 500);
        assert_eq!(cfg.concurrency, 5);
        assert_eq!(cfg.resource_type, "image");
        assert!(cfg.user_agent.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = MediapullConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: MediapullConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.api_base_url, cfg.api_base_url);
        assert_eq!(parsed.page_size, cfg.page_size);
        assert_eq!(parsed.concurrency, cfg.concurrency);
        assert_eq!(parsed.request_timeout_secs, cfg.request_timeout_secs);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            api_base_url = "http://127.0.0.1:8080/v1_1/"
            resource_type = "image"
            page_size = 100
            concurrency = 2
            connect_timeout_secs = 5
            request_timeout_secs = 10
        "#;
        let cfg: MediapullConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.page_size, 100);
        assert_eq!(cfg.concurrency, 2);
        assert!(cfg.user_agent.is_none());
    }

    #[test]
    fn listing_endpoint_joins_base_account_and_type() {
        let mut file = MediapullConfig::default();
        file.api_base_url = "http://127.0.0.1:8080/v1_1/".to_string();
        let run = RunConfig::from_defaults(&file, Credentials::new("k", "s"), "demo", "/tmp");
        assert_eq!(
            run.listing_endpoint(),
            "http://127.0.0.1:8080/v1_1/demo/resources/image"
        );
        assert_eq!(run.request_timeout, Duration::from_secs(300));
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let creds = Credentials::new("key-123", "hunter2");
        let shown = format!("{:?}", creds);
        assert!(shown.contains("key-123"));
        assert!(!shown.contains("hunter2"));
    }
}
