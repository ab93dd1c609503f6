//! Transport error types.

/// Errors from fetching a URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Request never produced a response (DNS, connection, timeout, ...)
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// Server answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    Http { url: String, status: u16 },
}

impl FetchError {
    /// The URL of the failed request.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Network { url, .. } | FetchError::Http { url, .. } => url,
        }
    }
}

/// Errors from the raw feed cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// No entry saved for this provider
    #[error("no cached feed for {0}")]
    NotFound(String),

    /// Entry exists but could not be read or written
    #[error("cache I/O error for {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FetchError::Http {
            url: "http://x".into(),
            status: 503,
        };
        assert_eq!(err.to_string(), "HTTP 503 fetching http://x");
        assert_eq!(err.url(), "http://x");

        let err = FetchError::Network {
            url: "http://y".into(),
            message: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "network error fetching http://y: connection refused"
        );

        let err = CacheError::NotFound("TfL".into());
        assert_eq!(err.to_string(), "no cached feed for TfL");
    }
}
