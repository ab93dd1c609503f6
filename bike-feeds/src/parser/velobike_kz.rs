//! Velobike Astana stations feed (JSON).
//!
//! Same operator family as Moscow's Velobike but a different API: numbers
//! and coordinates arrive either as JSON numbers or as strings.

use serde::Deserialize;
use tracing::warn;

use crate::catalog::ProviderDescriptor;
use crate::domain::{City, Station};

use super::error::ParseError;
use super::{BikeDataParser, parse_number};

#[derive(Debug, Deserialize)]
struct StationsDto {
    data: Vec<StationDto>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }

    fn as_u32(&self) -> Option<u32> {
        match self {
            Scalar::Int(i) => u32::try_from(*i).ok(),
            Scalar::Float(_) => None,
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }

    fn is_set(&self) -> bool {
        self.as_u32().is_some_and(|v| v != 0)
    }
}

#[derive(Debug, Deserialize)]
struct StationDto {
    /// Station code as printed on the terminal, e.g. "001"
    code: Scalar,
    #[serde(default)]
    name_ru: Option<String>,
    #[serde(default)]
    name_en: Option<String>,
    #[serde(default)]
    lat: Option<Scalar>,
    #[serde(default)]
    lng: Option<Scalar>,
    #[serde(default)]
    avl_bikes: Option<Scalar>,
    #[serde(default)]
    free_slots: Option<Scalar>,
    #[serde(default)]
    is_deleted: Option<Scalar>,
    #[serde(default)]
    is_hidden: Option<Scalar>,
    #[serde(default)]
    is_not_active: Option<Scalar>,
}

impl StationDto {
    fn is_listed(&self) -> bool {
        !self.is_deleted.as_ref().is_some_and(Scalar::is_set)
            && !self.is_hidden.as_ref().is_some_and(Scalar::is_set)
    }

    fn into_station(self) -> Result<Station, ParseError> {
        let number = match &self.code {
            Scalar::Text(code) => parse_number("code", code)?,
            other => other
                .as_u32()
                .ok_or_else(|| ParseError::invalid("code", format!("{other:?}")))?,
        };
        let name = self.name_en.or(self.name_ru).unwrap_or_default();
        let count = |v: &Option<Scalar>| v.as_ref().and_then(Scalar::as_u32).unwrap_or(0);

        let mut station = Station::new(number, name.trim())
            .with_availability(count(&self.avl_bikes), count(&self.free_slots))
            .with_opened(!self.is_not_active.as_ref().is_some_and(Scalar::is_set));
        if let (Some(lat), Some(lng)) = (
            self.lat.as_ref().and_then(Scalar::as_f64),
            self.lng.as_ref().and_then(Scalar::as_f64),
        ) {
            station = station.with_coordinates(lat, lng);
        }
        Ok(station)
    }
}

/// Parser for the Velobike Astana feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct VelobikeKzParser;

impl BikeDataParser for VelobikeKzParser {
    fn format(&self) -> &'static str {
        "VelobikeKz"
    }

    fn parse_cities(
        &self,
        feed: &[u8],
        provider: &ProviderDescriptor,
    ) -> Result<Vec<City>, ParseError> {
        let _: StationsDto = serde_json::from_slice(feed)?;
        Ok(vec![provider.single_city()])
    }

    fn parse_stations(&self, feed: &[u8], city: &City) -> Result<Vec<Station>, ParseError> {
        let dto: StationsDto = serde_json::from_slice(feed)?;
        let mut stations = Vec::with_capacity(dto.data.len());
        for entry in dto.data.into_iter().filter(StationDto::is_listed) {
            match entry.into_station() {
                Ok(station) => stations.push(station),
                Err(e) => warn!(city = %city.name, error = %e, "skipping Velobike station"),
            }
        }
        Ok(stations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinates;

    const FEED: &str = r#"{"data": [
        {"id": 1, "code": "001", "name_ru": "Байтерек", "name_en": "Baiterek",
         "lat": "51.1283", "lng": "71.4305", "avl_bikes": 4, "free_slots": "11",
         "is_deleted": 0, "is_hidden": "0", "is_not_active": 0},
        {"id": 2, "code": 2, "name_ru": "Хан Шатыр", "lat": 51.1325, "lng": 71.4036,
         "avl_bikes": 0, "free_slots": 20, "is_not_active": 1},
        {"id": 3, "code": "003", "name_en": "Removed", "is_deleted": "1"},
        {"id": 4, "code": "A-4", "name_en": "Service"}
    ]}"#;

    #[test]
    fn single_city() {
        let provider = ProviderDescriptor::new("Astana", "https://velobike.kz/rest/stations")
            .with_format("VelobikeKz")
            .with_city("Astana");
        let cities = VelobikeKzParser.parse_cities(FEED.as_bytes(), &provider).unwrap();
        assert_eq!(cities[0].name, "Astana");
        assert_eq!(cities[0].provider_name, "Astana");
    }

    #[test]
    fn parses_listed_stations() {
        let stations = VelobikeKzParser
            .parse_stations(FEED.as_bytes(), &City::new("Astana", "Astana"))
            .unwrap();

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].number, 1);
        assert_eq!(stations[0].name, "Baiterek");
        assert_eq!(stations[0].coordinates, Coordinates::new(51.1283, 71.4305));
        assert_eq!(stations[0].available_bikes, 4);
        assert_eq!(stations[0].available_stands, 11);
        assert!(stations[0].opened);

        assert_eq!(stations[1].number, 2);
        assert_eq!(stations[1].name, "Хан Шатыр");
        assert!(!stations[1].opened);
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let provider = ProviderDescriptor::new("Astana", "x");
        assert!(VelobikeKzParser.parse_cities(br#"{"Items": []}"#, &provider).is_err());
    }
}
