//! The HTTP seam: a [`Fetcher`] trait plus the production reqwest client.
//!
//! Every byte the pipeline pulls off the network, the chapter page itself and
//! each candidate image, goes through one trait method. Production runs use
//! [`HttpFetcher`]; tests hand the config an in-memory implementation and
//! exercise the whole pipeline without a socket.

use crate::config::ScrapeConfig;
use crate::error::{FetchError, ScrapeError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A single-method transport: GET a URL, return the whole body.
///
/// Bodies are buffered in full. Chapter pages are small and images are
/// bounded by the screening filters downstream, so streaming would buy
/// nothing but complexity.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return the response body.
    ///
    /// Implementations must treat a non-2xx status as an error; the pipeline
    /// never inspects status codes itself.
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// The production [`Fetcher`]: one `reqwest::Client` carrying the configured
/// User-Agent, optional Referer, and per-request timeout as defaults.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    /// Build a client from the transport fields of `config`.
    ///
    /// Fails only on invalid header values or a TLS backend that cannot
    /// initialise, both of which are configuration problems.
    pub fn from_config(config: &ScrapeConfig) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        let ua = HeaderValue::from_str(&config.user_agent).map_err(|e| {
            ScrapeError::InvalidConfig(format!("User-Agent is not a valid header value: {e}"))
        })?;
        headers.insert(USER_AGENT, ua);
        if let Some(ref referer) = config.referer {
            let value = HeaderValue::from_str(referer).map_err(|e| {
                ScrapeError::InvalidConfig(format!("Referer is not a valid header value: {e}"))
            })?;
            headers.insert(REFERER, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ScrapeError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    secs: self.timeout_secs,
                }
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    secs: self.timeout_secs,
                }
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;

        Ok(bytes.to_vec())
    }
}

/// Pick the transport for a run: the injected one if the caller supplied it,
/// otherwise a fresh [`HttpFetcher`] built from the config.
pub(crate) fn resolve_fetcher(config: &ScrapeConfig) -> Result<Arc<dyn Fetcher>, ScrapeError> {
    if let Some(ref fetcher) = config.fetcher {
        debug!("Using caller-supplied fetcher");
        return Ok(Arc::clone(fetcher));
    }
    Ok(Arc::new(HttpFetcher::from_config(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_accepts_defaults() {
        let config = ScrapeConfig::builder("https://chapters.example.com/ch1")
            .build()
            .unwrap();
        assert!(HttpFetcher::from_config(&config).is_ok());
    }

    #[test]
    fn from_config_rejects_header_with_control_chars() {
        let config = ScrapeConfig::builder("https://chapters.example.com/ch1")
            .user_agent("bad\nagent")
            .build()
            .unwrap();
        let err = HttpFetcher::from_config(&config).unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidConfig(_)));
    }

    #[test]
    fn resolve_prefers_injected_fetcher() {
        struct Canned;

        #[async_trait]
        impl Fetcher for Canned {
            async fn get(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
                Ok(b"canned".to_vec())
            }
        }

        let config = ScrapeConfig::builder("https://chapters.example.com/ch1")
            .fetcher(Arc::new(Canned))
            .build()
            .unwrap();
        let fetcher = resolve_fetcher(&config).unwrap();
        let body = tokio_test::block_on(fetcher.get("https://anything.example/x")).unwrap();
        assert_eq!(body, b"canned");
    }
}
