//! HTTP fetcher backed by reqwest.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tracing::debug;

use super::Fetcher;
use super::error::FetchError;

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Default user agent sent to providers.
const DEFAULT_USER_AGENT: &str = concat!("bike-feeds/", env!("CARGO_PKG_VERSION"));

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// User agent header sent with every request
    pub user_agent: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl HttpFetcherConfig {
    pub fn new() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetches provider feeds over HTTP.
///
/// A semaphore bounds the number of requests in flight so a large catalog
/// doesn't open one connection per provider at once.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl HttpFetcher {
    pub fn new(config: HttpFetcherConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let network_error = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| FetchError::Network {
                url: url.to_string(),
                message: "semaphore closed".to_string(),
            })?;

        debug!(url, "fetching feed");
        let response = self.http.get(url).send().await.map_err(network_error)?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(network_error)
    }
}
