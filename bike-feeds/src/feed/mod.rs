//! City list loading.
//!
//! The feed loader reads the provider catalog, then fetches (or reads from
//! cache) every provider's city list concurrently and parses it with the
//! provider's parser. Providers are isolated: one failing never stops the
//! others.

mod error;
mod loader;

pub use error::{ProviderError, ProviderFailure};
pub use loader::{FeedLoad, FeedLoader};
