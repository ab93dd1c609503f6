//! Format name → parser lookup.

use std::collections::HashMap;
use std::sync::Arc;

use super::{
    BikeDataParser, BikeStationsXmlParser, CityBikesParser, JcDecauxParser, LilleParser,
    NabsaParser, NextbikeParser, SmooveParser, VelobikeKzParser, VelobikeParser, VelowayParser,
};

/// Builds a parser instance.
pub type ParserFactory = fn() -> Box<dyn BikeDataParser>;

/// The provider declared a format nobody registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feed format: {0}")]
pub struct UnknownFormat(pub String);

/// Registry of parsers keyed by format name.
///
/// Filled once at startup, then only read. Lookups are by exact name.
#[derive(Default)]
pub struct ParserRegistry {
    factories: HashMap<String, ParserFactory>,
}

impl ParserRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in format.
    pub fn with_builtin_parsers() -> Self {
        let mut registry = Self::new();
        registry.register("JCDecaux", || Box::new(JcDecauxParser));
        registry.register("Transpole", || Box::new(LilleParser));
        registry.register("TfL", || Box::new(BikeStationsXmlParser));
        registry.register("Bixi", || Box::new(BikeStationsXmlParser));
        registry.register("NABSA", || Box::new(NabsaParser));
        registry.register("CityBikes", || Box::new(CityBikesParser));
        registry.register("Nextbike", || Box::new(NextbikeParser));
        registry.register("Veloway", || Box::new(VelowayParser));
        registry.register("Smoove", || Box::new(SmooveParser));
        registry.register("Velobike", || Box::new(VelobikeParser));
        registry.register("VelobikeKz", || Box::new(VelobikeKzParser));
        registry
    }

    /// Register a parser factory, replacing any previous one for the name.
    pub fn register(&mut self, format: impl Into<String>, factory: ParserFactory) {
        self.factories.insert(format.into(), factory);
    }

    /// Build the parser for `format`.
    pub fn resolve(&self, format: &str) -> Result<Arc<dyn BikeDataParser>, UnknownFormat> {
        self.factories
            .get(format)
            .map(|factory| Arc::from(factory()))
            .ok_or_else(|| UnknownFormat(format.to_string()))
    }

    /// Whether `format` has a registered parser.
    pub fn contains(&self, format: &str) -> bool {
        self.factories.contains_key(format)
    }

    /// Registered format names, sorted.
    pub fn formats(&self) -> Vec<&str> {
        let mut formats: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        formats.sort_unstable();
        formats
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}
