//! Download transport: one persistent connection per worker.
//!
//! A [`Connector`] hands each pool worker its own [`Fetch`] connection,
//! which the worker reuses for every image it processes. The curl
//! implementation caps each handle's connection cache at one, so the number
//! of open transport connections never exceeds the worker count.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use curl::easy::Easy;

use crate::config::RunConfig;

/// Error returned by a single image download.
#[derive(Debug)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Disk write failed (e.g. disk full, permission denied).
    Storage(std::io::Error),
    /// Non-curl transport failure (used by alternative connectors).
    Transport(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Curl(e) if e.is_operation_timedout() => write!(f, "timed out: {}", e),
            FetchError::Curl(e) => write!(f, "{}", e),
            FetchError::Http(code) => write!(f, "HTTP {}", code),
            FetchError::Storage(e) => write!(f, "storage: {}", e),
            FetchError::Transport(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Curl(e) => Some(e),
            FetchError::Storage(e) => Some(e),
            FetchError::Http(_) | FetchError::Transport(_) => None,
        }
    }
}

impl From<curl::Error> for FetchError {
    fn from(e: curl::Error) -> Self {
        FetchError::Curl(e)
    }
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        FetchError::Storage(e)
    }
}

/// One open connection able to stream a URL's body into a sink.
pub trait Fetch {
    /// GET `url`, writing the body to `sink` as it arrives. Returns bytes received.
    fn fetch_to(&mut self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError>;
}

/// Opens connections for pool workers. Shared by reference across worker threads.
pub trait Connector: Sync {
    type Conn: Fetch;

    fn connect(&self) -> Result<Self::Conn, FetchError>;
}

/// Curl settings shared by every worker connection.
#[derive(Debug, Clone)]
pub struct CurlConnector {
    connect_timeout: Duration,
    request_timeout: Duration,
    user_agent: Option<String>,
}

impl CurlConnector {
    pub fn new(cfg: &RunConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout,
            request_timeout: cfg.request_timeout,
            user_agent: cfg.user_agent.clone(),
        }
    }
}

impl Connector for CurlConnector {
    type Conn = CurlFetcher;

    fn connect(&self) -> Result<CurlFetcher, FetchError> {
        let mut easy = Easy::new();
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        // One cached connection per handle keeps total connections == workers.
        easy.max_connects(1)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.request_timeout.max(Duration::from_secs(1)))?;
        if let Some(ua) = &self.user_agent {
            easy.useragent(ua)?;
        }
        Ok(CurlFetcher { easy })
    }
}

/// A reused curl handle; keep-alive carries the connection across downloads.
pub struct CurlFetcher {
    easy: Easy,
}

impl Fetch for CurlFetcher {
    fn fetch_to(&mut self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        let mut received: u64 = 0;
        let mut write_error: Option<std::io::Error> = None;

        self.easy.url(url)?;
        let perform_result = {
            let mut transfer = self.easy.transfer();
            transfer.write_function(|data| match sink.write_all(data) {
                Ok(()) => {
                    received += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_error = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.perform()
        };
        if let Err(e) = perform_result {
            if e.is_write_error() {
                if let Some(io_err) = write_error.take() {
                    return Err(FetchError::Storage(io_err));
                }
            }
            return Err(FetchError::Curl(e));
        }

        let code = self.easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }
        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display() {
        assert_eq!(FetchError::Http(404).to_string(), "HTTP 404");
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(FetchError::Storage(io).to_string(), "storage: disk full");
        assert_eq!(
            FetchError::Transport("reset by peer".into()).to_string(),
            "reset by peer"
        );
    }

    #[test]
    fn connector_builds_handle() {
        let connector = CurlConnector {
            connect_timeout: Duration::from_secs(1),
            request_timeout: Duration::from_secs(2),
            user_agent: Some("mediapull-test".into()),
        };
        assert!(connector.connect().is_ok());
    }
}
