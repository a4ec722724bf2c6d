//! Run-level error type.
//!
//! Listing failures surface as `PullError` and abort the run. Per-image
//! download failures use [`crate::transport::FetchError`] and never leave the
//! worker pool except as a `DownloadOutcome::Failure`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PullError {
    /// The listing endpoint rejected the API key/secret.
    #[error("credentials rejected by listing endpoint (HTTP {status})")]
    Auth { status: u32 },

    /// Transport failure (DNS, connect, TLS, timeout, reset).
    #[error("network error: {0}")]
    Network(String),

    /// Any other non-2xx listing response.
    #[error("{url} returned HTTP {status}")]
    Http { status: u32, url: String },

    /// Response body was not the expected listing JSON.
    #[error("malformed listing response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The output directory is missing or not a directory.
    #[error("{}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid listing URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<curl::Error> for PullError {
    fn from(e: curl::Error) -> Self {
        if e.is_operation_timedout() {
            return PullError::Network(format!("timed out: {}", e));
        }
        PullError::Network(e.to_string())
    }
}

impl PullError {
    /// Map a listing status code: 401/403 are credential failures.
    pub fn from_status(status: u32, url: &str) -> Self {
        match status {
            401 | 403 => PullError::Auth { status },
            _ => PullError::Http {
                status,
                url: url.to_string(),
            },
        }
    }
}
