//! NABSA General Bikeshare Feed Specification (GBFS, JSON).
//!
//! The provider URL points at `system_information.json` and the station URL
//! at `station_information.json`, which names and locates every station.
//! Feeds whose entries also carry `station_status` counts are read too.

use chrono::DateTime;
use serde::Deserialize;
use tracing::warn;

use crate::catalog::ProviderDescriptor;
use crate::domain::{City, Station};

use super::error::ParseError;
use super::{BikeDataParser, parse_number};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    /// Seconds since the epoch.
    #[serde(default)]
    last_updated: Option<i64>,
    data: T,
}

#[derive(Debug, Deserialize)]
struct SystemInformation {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StationsData {
    stations: Vec<StationDto>,
}

/// GBFS versions disagree on whether ids are strings or numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Id {
    Number(u64),
    Text(String),
}

/// GBFS v1 flags are 0/1, v2 flags are booleans.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Int(i) => *i != 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StationDto {
    station_id: Id,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    num_bikes_available: Option<u32>,
    #[serde(default)]
    num_docks_available: Option<u32>,
    #[serde(default)]
    is_installed: Option<Flag>,
    #[serde(default)]
    is_renting: Option<Flag>,
    /// Seconds since the epoch.
    #[serde(default)]
    last_reported: Option<i64>,
}

impl StationDto {
    fn into_station(self, feed_updated: Option<i64>) -> Result<Station, ParseError> {
        let number = match &self.station_id {
            Id::Number(n) => {
                u32::try_from(*n).map_err(|_| ParseError::invalid("station_id", n.to_string()))?
            }
            Id::Text(s) => parse_number("station_id", s)?,
        };

        let opened = self.is_installed.as_ref().is_none_or(Flag::is_set)
            && self.is_renting.as_ref().is_none_or(Flag::is_set);

        let mut station = Station::new(number, self.name.unwrap_or_default())
            .with_availability(
                self.num_bikes_available.unwrap_or(0),
                self.num_docks_available.unwrap_or(0),
            )
            .with_opened(opened);
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            station = station.with_coordinates(lat, lon);
        }
        if let Some(last_update) = self
            .last_reported
            .or(feed_updated)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
        {
            station = station.with_last_update(last_update);
        }
        Ok(station)
    }
}

/// Parser for GBFS feeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NabsaParser;

impl BikeDataParser for NabsaParser {
    fn format(&self) -> &'static str {
        "NABSA"
    }

    fn parse_cities(
        &self,
        feed: &[u8],
        provider: &ProviderDescriptor,
    ) -> Result<Vec<City>, ParseError> {
        let info: Envelope<SystemInformation> = serde_json::from_slice(feed)?;
        let mut city = provider.single_city();
        if provider.commercial_name.is_none() {
            city = city.with_label(info.data.name);
        }
        Ok(vec![city])
    }

    fn parse_stations(&self, feed: &[u8], city: &City) -> Result<Vec<Station>, ParseError> {
        let envelope: Envelope<StationsData> = serde_json::from_slice(feed)?;
        let mut stations = Vec::with_capacity(envelope.data.stations.len());
        for dto in envelope.data.stations {
            match dto.into_station(envelope.last_updated) {
                Ok(station) => stations.push(station),
                Err(e) => warn!(city = %city.name, error = %e, "skipping GBFS station"),
            }
        }
        Ok(stations)
    }
}
