//! Provider descriptors and the catalog that holds them.

use std::collections::HashMap;
use std::path::PathBuf;

use bytes::Bytes;
use serde::Deserialize;

use crate::domain::City;

use super::error::CatalogError;

/// Placeholder for the provider's API key in URL templates.
const API_KEY_PLACEHOLDER: &str = "{apiKey}";

/// Placeholder for the city key in station URL templates.
const CITY_PLACEHOLDER: &str = "${city}";

/// Placeholder for the station number in detail URL templates.
const NUMBER_PLACEHOLDER: &str = "${number}";

/// One record of the catalog resource, as written on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderRecord {
    name: String,
    url: String,
    #[serde(default)]
    station_details_url: Option<String>,
    #[serde(default)]
    all_stations_details_url: Option<String>,
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    commercial_name: Option<String>,
    #[serde(default)]
    copyright: Option<String>,
}

/// A bike-share provider with its API key already substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    /// Unique key; also names the cache entry.
    pub name: String,

    /// Parser registry key. Defaults to `name`.
    pub format: String,

    /// URL of the provider's city list.
    pub list_url: String,

    /// Per-station detail URL template. Empty when the provider has no
    /// per-station endpoint.
    pub station_details_url_template: String,

    /// URL template returning every station of a city.
    pub all_stations_details_url: String,

    /// City name, for providers that serve exactly one city.
    pub city: Option<String>,

    pub country_code: Option<String>,
    pub commercial_name: Option<String>,

    /// Attribution the display layer must show with this provider's data.
    pub copyright: Option<String>,
}

impl ProviderDescriptor {
    /// Create a descriptor whose format is its name.
    pub fn new(name: impl Into<String>, list_url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            format: name.clone(),
            name,
            list_url: list_url.into(),
            station_details_url_template: String::new(),
            all_stations_details_url: String::new(),
            city: None,
            country_code: None,
            commercial_name: None,
            copyright: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_station_details_url(mut self, template: impl Into<String>) -> Self {
        self.station_details_url_template = template.into();
        self
    }

    pub fn with_all_stations_details_url(mut self, template: impl Into<String>) -> Self {
        self.all_stations_details_url = template.into();
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    fn from_record(record: ProviderRecord) -> Self {
        let key = record.api_key.as_str();
        Self {
            format: record.format.unwrap_or_else(|| record.name.clone()),
            list_url: resolve_api_key(&record.url, key),
            station_details_url_template: record
                .station_details_url
                .map(|t| resolve_api_key(&t, key))
                .unwrap_or_default(),
            all_stations_details_url: record
                .all_stations_details_url
                .map(|t| resolve_api_key(&t, key))
                .unwrap_or_default(),
            name: record.name,
            city: record.city,
            country_code: record.country_code,
            commercial_name: record.commercial_name,
            copyright: record.copyright,
        }
    }

    /// Whether single stations can be refreshed individually.
    pub fn supports_station_details(&self) -> bool {
        !self.station_details_url_template.is_empty()
    }

    /// URL returning every station of `city`.
    pub fn all_stations_url(&self, city: &City) -> String {
        self.all_stations_details_url.replace(CITY_PLACEHOLDER, &city.id)
    }

    /// URL returning the details of one station, if the provider has a
    /// per-station endpoint.
    pub fn station_details_url(&self, city: &City, number: u32) -> Option<String> {
        if !self.supports_station_details() {
            return None;
        }
        Some(
            self.station_details_url_template
                .replace(CITY_PLACEHOLDER, &city.id)
                .replace(NUMBER_PLACEHOLDER, &number.to_string()),
        )
    }

    /// The city a single-city provider serves, falling back to the
    /// provider name.
    pub fn single_city(&self) -> City {
        let name = self.city.clone().unwrap_or_else(|| self.name.clone());
        let mut city = City::new(name, self.name.clone());
        if let Some(code) = &self.country_code {
            city = city.with_country_code(code.clone());
        }
        if let Some(label) = &self.commercial_name {
            city = city.with_label(label.clone());
        }
        city
    }
}

/// Substitute the API key into a URL template.
///
/// Both `{apiKey}` and `${apiKey}` spellings are accepted.
pub(crate) fn resolve_api_key(template: &str, api_key: &str) -> String {
    template
        .replace("${apiKey}", api_key)
        .replace(API_KEY_PLACEHOLDER, api_key)
}

/// Where the catalog resource comes from.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    /// A JSON file on disk.
    Path(PathBuf),
    /// JSON bytes already in memory (e.g. `include_bytes!`).
    Inline(Bytes),
}

impl CatalogSource {
    fn read(&self) -> Result<Bytes, CatalogError> {
        match self {
            CatalogSource::Path(path) => std::fs::read(path)
                .map(Bytes::from)
                .map_err(|source| CatalogError::Io {
                    path: path.clone(),
                    source,
                }),
            CatalogSource::Inline(bytes) => Ok(bytes.clone()),
        }
    }
}

/// The set of known providers, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct ProviderCatalog {
    providers: Vec<ProviderDescriptor>,
    by_name: HashMap<String, usize>,
}

impl ProviderCatalog {
    /// Read and parse a catalog resource.
    pub fn load(source: &CatalogSource) -> Result<Self, CatalogError> {
        let json = source.read()?;
        Self::from_json(&json)
    }

    /// Parse a catalog from its JSON representation.
    pub fn from_json(json: &[u8]) -> Result<Self, CatalogError> {
        let records: Vec<ProviderRecord> = serde_json::from_slice(json)?;
        Self::from_descriptors(records.into_iter().map(ProviderDescriptor::from_record))
    }

    /// Build a catalog, checking that names and list URLs are unique.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = ProviderDescriptor>,
    ) -> Result<Self, CatalogError> {
        let mut providers = Vec::new();
        let mut by_name = HashMap::new();
        let mut by_url: HashMap<String, String> = HashMap::new();

        for (index, descriptor) in descriptors.into_iter().enumerate() {
            if descriptor.name.is_empty() {
                return Err(CatalogError::EmptyName { index });
            }
            if by_name.contains_key(&descriptor.name) {
                return Err(CatalogError::DuplicateName(descriptor.name));
            }
            if let Some(first) = by_url.get(&descriptor.list_url) {
                return Err(CatalogError::DuplicateUrl {
                    first: first.clone(),
                    second: descriptor.name,
                    url: descriptor.list_url,
                });
            }
            by_url.insert(descriptor.list_url.clone(), descriptor.name.clone());
            by_name.insert(descriptor.name.clone(), index);
            providers.push(descriptor);
        }

        Ok(Self { providers, by_name })
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Option<&ProviderDescriptor> {
        self.by_name.get(name).map(|&i| &self.providers[i])
    }

    /// Look up the provider that owns a resolved list URL.
    pub fn by_list_url(&self, url: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.list_url == url)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
