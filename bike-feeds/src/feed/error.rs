//! Per-provider load failures.

use std::sync::Arc;

use crate::parser::{ParseError, UnknownFormat, excerpt};
use crate::transport::{CacheError, FetchError};

/// Why one provider contributed no cities to a load.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No parser registered for the provider's format
    #[error(transparent)]
    UnknownFormat(#[from] UnknownFormat),

    /// Network or HTTP failure
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Cache-only load and nothing usable in the cache
    #[error("cache read failed: {0}")]
    Cache(#[from] CacheError),

    /// The feed arrived but couldn't be parsed
    #[error("failed to parse feed: {source} (payload: {excerpt:?})")]
    Parse {
        excerpt: String,
        #[source]
        source: ParseError,
    },
}

impl ProviderError {
    pub(crate) fn parse(source: ParseError, feed: &[u8]) -> Self {
        ProviderError::Parse {
            excerpt: excerpt(feed),
            source,
        }
    }

    /// Whether this is a plain cache miss in cache-only mode.
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, ProviderError::Cache(CacheError::NotFound(_)))
    }
}

/// A provider that failed during a load.
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: Arc<ProviderError>,
}
