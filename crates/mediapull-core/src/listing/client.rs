//! Listing requests over libcurl with HTTP basic auth.

use std::str;
use std::time::Duration;

use curl::easy::{Auth, Easy};
use url::Url;

use super::{parse, PageRequest, PageSource, RawPage};
use crate::config::RunConfig;
use crate::error::PullError;

/// Issues listing requests on one reused curl handle.
///
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub struct CurlPageSource {
    easy: Easy,
    endpoint: Url,
}

impl CurlPageSource {
    pub fn new(cfg: &RunConfig) -> Result<Self, PullError> {
        let endpoint = Url::parse(&cfg.listing_endpoint())?;

        let mut easy = Easy::new();
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.connect_timeout(cfg.connect_timeout)?;
        easy.timeout(cfg.request_timeout.max(Duration::from_secs(1)))?;
        let mut auth = Auth::new();
        auth.basic(true);
        easy.http_auth(&auth)?;
        easy.username(&cfg.credentials.key)?;
        easy.password(&cfg.credentials.secret)?;
        if let Some(ua) = &cfg.user_agent {
            easy.useragent(ua)?;
        }

        Ok(Self { easy, endpoint })
    }

    /// Full request URL for `request`.
    pub fn request_url(&self, request: &PageRequest) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            for (k, v) in request.query_pairs() {
                query.append_pair(k, &v);
            }
        }
        url
    }
}

impl PageSource for CurlPageSource {
    fn endpoint(&self) -> String {
        self.endpoint.to_string()
    }

    fn fetch_page(&mut self, request: &PageRequest) -> Result<RawPage, PullError> {
        let url = self.request_url(request);
        tracing::debug!(url = %url, "listing request");

        let mut body: Vec<u8> = Vec::new();
        let mut headers: Vec<String> = Vec::new();

        self.easy.url(url.as_str())?;
        {
            let mut transfer = self.easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = self.easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(PullError::from_status(code, self.endpoint.as_str()));
        }

        parse::parse_page(&body, &headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, MediapullConfig};

    fn source() -> CurlPageSource {
        let mut file = MediapullConfig::default();
        file.api_base_url = "http://127.0.0.1:9/v1_1".to_string();
        let cfg = RunConfig::from_defaults(&file, Credentials::new("k", "s"), "demo", "/tmp");
        CurlPageSource::new(&cfg).unwrap()
    }

    #[test]
    fn first_request_has_only_page_size() {
        let src = source();
        let url = src.request_url(&PageRequest {
            page_size: 500,
            cursor: None,
            prefix: None,
        });
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9/v1_1/demo/resources/image?max_results=500"
        );
    }

    #[test]
    fn cursor_and_prefix_are_encoded() {
        let src = source();
        let url = src.request_url(&PageRequest {
            page_size: 10,
            cursor: Some("a+b/c=".into()),
            prefix: Some("my folder/".into()),
        });
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("max_results".to_string(), "10".to_string()),
                ("next_cursor".to_string(), "a+b/c=".to_string()),
                ("prefix".to_string(), "my folder/".to_string()),
            ]
        );
    }
}
