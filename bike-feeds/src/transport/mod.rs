//! Network and cache capabilities.
//!
//! The feed pipeline only depends on the [`Fetcher`] and [`CacheStore`]
//! traits. `HttpFetcher` and `FileCache` are the production
//! implementations; `MockFetcher` serves canned feeds for tests and
//! offline development.

mod cache;
mod client;
mod error;
mod mock;

use std::future::Future;

use bytes::Bytes;

pub use cache::{CacheStore, FileCache};
pub use client::{HttpFetcher, HttpFetcherConfig};
pub use error::{CacheError, FetchError};
pub use mock::MockFetcher;

/// Asynchronous `GET url -> bytes` capability.
///
/// Implementations must be usable from several in-flight requests at once;
/// the caller correlates each response with the URL it asked for.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Bytes, FetchError>> + Send;
}
