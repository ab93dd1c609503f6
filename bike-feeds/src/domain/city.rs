//! Service areas reported by providers.

use std::fmt;

/// A geographic service area operated under one provider.
///
/// Cities are produced by parsers from provider feeds and are never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct City {
    /// Key substituted for `${city}` in the provider's URL templates.
    ///
    /// Equal to `name` for providers that address cities by name.
    pub id: String,

    /// City name as reported by the provider.
    pub name: String,

    /// Name of the owning provider (its catalog key).
    pub provider_name: String,

    /// ISO country code, empty if the provider doesn't report one.
    pub country_code: String,

    /// Human-readable label, usually the commercial name of the scheme.
    pub label: String,
}

impl City {
    /// Create a city addressed by its name.
    pub fn new(name: impl Into<String>, provider_name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            label: name.clone(),
            name,
            provider_name: provider_name.into(),
            country_code: String::new(),
        }
    }

    /// Set the URL key when it differs from the name.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the country code.
    pub fn with_country_code(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = country_code.into();
        self
    }

    /// Set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() || self.label == self.name {
            f.write_str(&self.name)
        } else {
            write!(f, "{} ({})", self.name, self.label)
        }
    }
}
