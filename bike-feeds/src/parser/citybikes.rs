//! CityBikes aggregator API v2 (JSON).
//!
//! One city per network. Networks are addressed by id, so the city id
//! differs from its name. Station ids are hashes; the provider's own
//! station number, when present, lives in `extra.uid`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::catalog::ProviderDescriptor;
use crate::domain::{City, Station};

use super::BikeDataParser;
use super::error::ParseError;

#[derive(Debug, Deserialize)]
struct NetworksDto {
    networks: Vec<NetworkDto>,
}

#[derive(Debug, Deserialize)]
struct NetworkDto {
    id: String,
    name: String,
    location: LocationDto,
}

#[derive(Debug, Deserialize)]
struct LocationDto {
    city: String,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NetworkStationsDto {
    network: StationsDto,
}

#[derive(Debug, Deserialize)]
struct StationsDto {
    stations: Vec<StationDto>,
}

#[derive(Debug, Deserialize)]
struct StationDto {
    #[serde(default)]
    name: Option<String>,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    free_bikes: Option<u32>,
    #[serde(default)]
    empty_slots: Option<u32>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    extra: Option<ExtraDto>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtraDto {
    #[serde(default)]
    uid: Option<serde_json::Value>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    online: Option<bool>,
}

impl ExtraDto {
    fn uid(&self) -> Option<u32> {
        match self.uid.as_ref()? {
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Use provider uids as station numbers when every station has a distinct
/// one; otherwise number stations by position.
fn station_numbers(stations: &[StationDto]) -> Vec<u32> {
    let uids: Vec<Option<u32>> = stations
        .iter()
        .map(|s| s.extra.as_ref().and_then(ExtraDto::uid))
        .collect();
    let mut seen = HashSet::new();
    if uids.iter().all(|uid| uid.is_some_and(|n| seen.insert(n))) {
        uids.into_iter().flatten().collect()
    } else {
        (1..).take(stations.len()).collect()
    }
}

/// Parser for the CityBikes API.
#[derive(Debug, Clone, Copy, Default)]
pub struct CityBikesParser;

impl BikeDataParser for CityBikesParser {
    fn format(&self) -> &'static str {
        "CityBikes"
    }

    fn parse_cities(
        &self,
        feed: &[u8],
        provider: &ProviderDescriptor,
    ) -> Result<Vec<City>, ParseError> {
        let dto: NetworksDto = serde_json::from_slice(feed)?;
        Ok(dto
            .networks
            .into_iter()
            .map(|network| {
                City::new(network.location.city, provider.name.clone())
                    .with_id(network.id)
                    .with_country_code(network.location.country.unwrap_or_default())
                    .with_label(network.name)
            })
            .collect())
    }

    fn parse_stations(&self, feed: &[u8], _city: &City) -> Result<Vec<Station>, ParseError> {
        let dto: NetworkStationsDto = serde_json::from_slice(feed)?;
        let numbers = station_numbers(&dto.network.stations);

        Ok(dto
            .network
            .stations
            .into_iter()
            .zip(numbers)
            .map(|(s, number)| {
                let extra = s.extra.unwrap_or_default();
                let opened = extra.status.as_deref().is_none_or(|st| st != "CLOSED")
                    && extra.online.unwrap_or(true);
                let mut station = Station::new(number, s.name.unwrap_or_default().trim())
                    .with_coordinates(s.latitude, s.longitude)
                    .with_availability(s.free_bikes.unwrap_or(0), s.empty_slots.unwrap_or(0))
                    .with_opened(opened);
                if let Some(ts) = s
                    .timestamp
                    .as_deref()
                    .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                {
                    station = station.with_last_update(ts.with_timezone(&Utc));
                }
                station
            })
            .collect())
    }
}
