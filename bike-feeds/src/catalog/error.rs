//! Catalog error types.

use std::path::PathBuf;

/// Errors while loading the provider catalog.
///
/// These are packaging errors: nothing can be loaded without provider
/// definitions, so a catalog error aborts the whole load.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Catalog resource could not be read
    #[error("failed to read provider catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog is not a JSON array of provider records
    #[error("malformed provider catalog: {0}")]
    Json(#[from] serde_json::Error),

    /// A provider record has no name
    #[error("provider record {index} has an empty name")]
    EmptyName { index: usize },

    /// Two records share a name
    #[error("duplicate provider name: {0}")]
    DuplicateName(String),

    /// Two records resolve to the same list URL
    #[error("providers {first} and {second} resolve to the same list URL {url}")]
    DuplicateUrl {
        first: String,
        second: String,
        url: String,
    },
}
