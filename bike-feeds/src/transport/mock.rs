//! Mock fetcher for testing without network access.
//!
//! Serves canned feeds keyed by URL, optionally after a delay or as a
//! failure, and records every URL requested.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;

use super::Fetcher;
use super::error::FetchError;

#[derive(Debug, Clone)]
enum MockReply {
    Body(Bytes),
    Status(u16),
    NetworkError(String),
}

#[derive(Debug, Clone)]
struct MockRoute {
    reply: MockReply,
    delay: Duration,
}

/// Fetcher that answers from an in-memory route table.
///
/// Unknown URLs answer HTTP 404.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    routes: HashMap<String, MockRoute>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn route(mut self, url: impl Into<String>, reply: MockReply, delay: Duration) -> Self {
        self.routes.insert(url.into(), MockRoute { reply, delay });
        self
    }

    /// Serve `body` for `url`.
    pub fn with_body(self, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.route(url, MockReply::Body(body.into()), Duration::ZERO)
    }

    /// Serve `body` for `url` after `delay`.
    pub fn with_delayed_body(
        self,
        url: impl Into<String>,
        body: impl Into<Bytes>,
        delay: Duration,
    ) -> Self {
        self.route(url, MockReply::Body(body.into()), delay)
    }

    /// Answer `url` with an HTTP error status.
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.route(url, MockReply::Status(status), Duration::ZERO)
    }

    /// Fail `url` as if the connection could not be made.
    pub fn with_network_error(self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.route(url, MockReply::NetworkError(message.into()), Duration::ZERO)
    }

    /// Every URL requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(url.to_string());
        }

        let Some(route) = self.routes.get(url) else {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: 404,
            });
        };

        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }

        match &route.reply {
            MockReply::Body(body) => Ok(body.clone()),
            MockReply::Status(status) => Err(FetchError::Http {
                url: url.to_string(),
                status: *status,
            }),
            MockReply::NetworkError(message) => Err(FetchError::Network {
                url: url.to_string(),
                message: message.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_routes_and_records_requests() {
        let fetcher = MockFetcher::new()
            .with_body("http://a", "alpha")
            .with_status("http://b", 500)
            .with_network_error("http://c", "reset");

        assert_eq!(fetcher.fetch("http://a").await.unwrap(), Bytes::from("alpha"));
        assert!(matches!(
            fetcher.fetch("http://b").await,
            Err(FetchError::Http { status: 500, .. })
        ));
        assert!(matches!(
            fetcher.fetch("http://c").await,
            Err(FetchError::Network { .. })
        ));
        assert!(matches!(
            fetcher.fetch("http://unknown").await,
            Err(FetchError::Http { status: 404, .. })
        ));

        assert_eq!(
            fetcher.requests(),
            vec!["http://a", "http://b", "http://c", "http://unknown"]
        );
    }

    #[tokio::test]
    async fn clones_share_request_log() {
        let fetcher = MockFetcher::new().with_body("http://a", "alpha");
        let clone = fetcher.clone();
        clone.fetch("http://a").await.unwrap();
        assert_eq!(fetcher.requests(), vec!["http://a"]);
    }
}
