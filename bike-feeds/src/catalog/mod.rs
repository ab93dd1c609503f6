//! Provider catalog.
//!
//! The catalog is a JSON resource listing every bike-share provider the
//! application knows about, with the URL templates used to reach it. It is
//! loaded once per feed load and passed around explicitly.

mod error;
mod provider;

pub use error::CatalogError;
pub use provider::{CatalogSource, ProviderCatalog, ProviderDescriptor};
