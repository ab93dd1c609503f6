//! Fetching one city's stations.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::{ProviderCatalog, ProviderDescriptor};
use crate::domain::{City, Station};
use crate::events::{Event, EventSink};
use crate::parser::{BikeDataParser, ParserRegistry};
use crate::transport::Fetcher;

use super::error::StationError;

/// Station feeds of one city, bound to its provider and parser.
pub struct StationLoader<F> {
    fetcher: Arc<F>,
    city: City,
    provider: ProviderDescriptor,
    parser: Arc<dyn BikeDataParser>,
    events: EventSink,
}

impl<F: Fetcher> StationLoader<F> {
    pub fn new(
        fetcher: Arc<F>,
        city: City,
        provider: ProviderDescriptor,
        parser: Arc<dyn BikeDataParser>,
        events: EventSink,
    ) -> Self {
        Self {
            fetcher,
            city,
            provider,
            parser,
            events,
        }
    }

    /// Look up the city's provider and parser.
    pub fn for_city(
        fetcher: Arc<F>,
        registry: &ParserRegistry,
        catalog: &ProviderCatalog,
        city: City,
        events: EventSink,
    ) -> Result<Self, StationError> {
        let provider = catalog
            .get(&city.provider_name)
            .cloned()
            .ok_or_else(|| StationError::UnknownProvider(city.provider_name.clone()))?;
        let parser = registry.resolve(&provider.format)?;
        Ok(Self::new(fetcher, city, provider, parser, events))
    }

    pub fn city(&self) -> &City {
        &self.city
    }

    pub fn provider(&self) -> &ProviderDescriptor {
        &self.provider
    }

    /// Whether stations can be refreshed one at a time.
    pub fn supports_station_details(&self) -> bool {
        self.provider.supports_station_details()
    }

    /// Fetch the city's station list.
    pub async fn fetch_all_stations_list(&self) -> Result<Vec<Station>, StationError> {
        self.fetch_all(false).await
    }

    /// Fetch every station of the city with live availability.
    ///
    /// Same endpoint as the list; only the emitted flag differs.
    pub async fn fetch_all_stations_details(&self) -> Result<Vec<Station>, StationError> {
        self.fetch_all(true).await
    }

    async fn fetch_all(&self, with_details: bool) -> Result<Vec<Station>, StationError> {
        let result = self.try_fetch_all().await;
        match &result {
            Ok(stations) => {
                debug!(
                    city = %self.city.name,
                    stations = stations.len(),
                    with_details,
                    "stations fetched"
                );
                self.events.emit(Event::StationsFetched {
                    city: self.city.name.clone(),
                    stations: stations.clone(),
                    with_details,
                });
            }
            Err(e) => self.report(None, e),
        }
        result
    }

    async fn try_fetch_all(&self) -> Result<Vec<Station>, StationError> {
        if self.provider.all_stations_details_url.is_empty() {
            return Err(StationError::NoStationsEndpoint {
                provider: self.provider.name.clone(),
            });
        }
        let url = self.provider.all_stations_url(&self.city);
        let feed = self.fetcher.fetch(&url).await?;
        self.parser
            .parse_stations(&feed, &self.city)
            .map_err(|e| StationError::parse(e, &feed))
    }

    /// Fetch the live details of one station.
    ///
    /// Fails with `DetailsUnsupported` if the provider has no per-station
    /// endpoint.
    pub async fn fetch_station_details(&self, station: &Station) -> Result<Station, StationError> {
        let result = self.try_fetch_details(station).await;
        match &result {
            Ok(updated) => {
                debug!(city = %self.city.name, station = updated.number, "station details fetched");
                self.events.emit(Event::StationDetailsFetched {
                    city: self.city.name.clone(),
                    station: updated.clone(),
                });
            }
            // Caller error, nothing was requested
            Err(StationError::DetailsUnsupported { .. }) => {}
            Err(e) => self.report(Some(station.number), e),
        }
        result
    }

    async fn try_fetch_details(&self, station: &Station) -> Result<Station, StationError> {
        let url = self
            .provider
            .station_details_url(&self.city, station.number)
            .ok_or_else(|| StationError::DetailsUnsupported {
                provider: self.provider.name.clone(),
            })?;
        let feed = self.fetcher.fetch(&url).await?;
        self.parser
            .parse_station_detail(&feed, station)
            .map_err(|e| StationError::parse(e, &feed))
    }

    fn report(&self, number: Option<u32>, error: &StationError) {
        warn!(city = %self.city.name, station = ?number, error = %error, "station request failed");
        self.events.emit(Event::StationFailed {
            city: self.city.name.clone(),
            number,
            reason: error.to_string(),
        });
    }
}

impl<F> std::fmt::Debug for StationLoader<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationLoader")
            .field("city", &self.city)
            .field("provider", &self.provider.name)
            .field("format", &self.parser.format())
            .finish()
    }
}
