//! JCDecaux self-service bikes API (JSON).
//!
//! The provider list is the contracts endpoint, one city per contract.
//! Station and single-station endpoints share one object shape.

use chrono::DateTime;
use serde::Deserialize;

use crate::catalog::ProviderDescriptor;
use crate::domain::{City, Station};

use super::BikeDataParser;
use super::error::ParseError;

#[derive(Debug, Deserialize)]
struct ContractDto {
    name: String,
    #[serde(default)]
    commercial_name: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PositionDto {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct StationDto {
    number: u32,
    name: String,
    #[serde(default)]
    position: Option<PositionDto>,
    /// "OPEN" or "CLOSED"
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    available_bikes: Option<u32>,
    #[serde(default)]
    available_bike_stands: Option<u32>,
    /// Milliseconds since the epoch.
    #[serde(default)]
    last_update: Option<i64>,
}

impl StationDto {
    fn into_station(self) -> Station {
        let mut station = Station::new(self.number, display_name(&self.name))
            .with_availability(
                self.available_bikes.unwrap_or(0),
                self.available_bike_stands.unwrap_or(0),
            )
            .with_opened(self.status.as_deref().is_none_or(|s| s == "OPEN"));
        if let Some(position) = self.position {
            station = station.with_coordinates(position.lat, position.lng);
        }
        if let Some(last_update) = self.last_update.and_then(DateTime::from_timestamp_millis) {
            station = station.with_last_update(last_update);
        }
        station
    }
}

/// Strip the `"00123 - "` number prefix JCDecaux puts in station names.
fn display_name(raw: &str) -> &str {
    match raw.split_once(" - ") {
        Some((prefix, rest))
            if !prefix.is_empty() && prefix.trim().chars().all(|c| c.is_ascii_digit()) =>
        {
            rest.trim()
        }
        _ => raw.trim(),
    }
}

/// Parser for the JCDecaux JSON API.
#[derive(Debug, Clone, Copy, Default)]
pub struct JcDecauxParser;

impl BikeDataParser for JcDecauxParser {
    fn format(&self) -> &'static str {
        "JCDecaux"
    }

    fn parse_cities(
        &self,
        feed: &[u8],
        provider: &ProviderDescriptor,
    ) -> Result<Vec<City>, ParseError> {
        let contracts: Vec<ContractDto> = serde_json::from_slice(feed)?;
        Ok(contracts
            .into_iter()
            .map(|contract| {
                let mut city = City::new(contract.name, provider.name.clone());
                if let Some(code) = contract.country_code {
                    city = city.with_country_code(code);
                }
                if let Some(label) = contract.commercial_name {
                    city = city.with_label(label);
                }
                city
            })
            .collect())
    }

    fn parse_stations(&self, feed: &[u8], _city: &City) -> Result<Vec<Station>, ParseError> {
        let stations: Vec<StationDto> = serde_json::from_slice(feed)?;
        Ok(stations.into_iter().map(StationDto::into_station).collect())
    }

    fn parse_station_detail(&self, feed: &[u8], station: &Station) -> Result<Station, ParseError> {
        let dto: StationDto = serde_json::from_slice(feed)?;
        if dto.number != station.number {
            return Err(ParseError::invalid("number", dto.number.to_string()));
        }
        let mut updated = station.clone();
        updated.merge_detail(&dto.into_station());
        Ok(updated)
    }
}
