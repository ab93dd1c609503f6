//! Veloway cartography proxy feed (JSON), as run for Vélo Bleu in Nice.
//!
//! Every value in the feed is a string, including coordinates and counts.

use serde::Deserialize;
use tracing::warn;

use crate::catalog::ProviderDescriptor;
use crate::domain::{City, Station};

use super::error::ParseError;
use super::{BikeDataParser, parse_count, parse_number};

#[derive(Debug, Deserialize)]
struct CartoDto {
    stand: Vec<StandDto>,
}

#[derive(Debug, Deserialize)]
struct StandDto {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    lat: Option<String>,
    #[serde(default)]
    lng: Option<String>,
    /// "1" when the stand is in service
    #[serde(default)]
    disp: Option<String>,
    /// Available bikes
    #[serde(default)]
    ab: Option<String>,
    /// Available places
    #[serde(default)]
    ap: Option<String>,
}

impl StandDto {
    fn into_station(self) -> Result<Station, ParseError> {
        let number = parse_number("id", &self.id)?;
        let bikes = self.ab.as_deref().map(|v| parse_count("ab", v)).transpose()?;
        let places = self.ap.as_deref().map(|v| parse_count("ap", v)).transpose()?;

        let mut station = Station::new(number, self.name.trim())
            .with_availability(bikes.unwrap_or(0), places.unwrap_or(0))
            .with_opened(self.disp.as_deref().is_none_or(|d| d.trim() == "1"));
        if let (Some(lat), Some(lng)) = (self.lat, self.lng) {
            let lat = lat.trim().parse().map_err(|_| ParseError::invalid("lat", &lat))?;
            let lng = lng.trim().parse().map_err(|_| ParseError::invalid("lng", &lng))?;
            station = station.with_coordinates(lat, lng);
        }
        Ok(station)
    }
}

/// Parser for the Veloway feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct VelowayParser;

impl BikeDataParser for VelowayParser {
    fn format(&self) -> &'static str {
        "Veloway"
    }

    fn parse_cities(
        &self,
        feed: &[u8],
        provider: &ProviderDescriptor,
    ) -> Result<Vec<City>, ParseError> {
        let _: CartoDto = serde_json::from_slice(feed)?;
        Ok(vec![provider.single_city()])
    }

    fn parse_stations(&self, feed: &[u8], city: &City) -> Result<Vec<Station>, ParseError> {
        let dto: CartoDto = serde_json::from_slice(feed)?;
        let mut stations = Vec::with_capacity(dto.stand.len());
        for stand in dto.stand {
            match stand.into_station() {
                Ok(station) => stations.push(station),
                Err(e) => warn!(city = %city.name, error = %e, "skipping Veloway stand"),
            }
        }
        Ok(stations)
    }
}
