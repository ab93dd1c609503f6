//! Velobike (Moscow) parkings feed (JSON).

use serde::Deserialize;
use tracing::warn;

use crate::catalog::ProviderDescriptor;
use crate::domain::{City, Station};

use super::error::ParseError;
use super::{BikeDataParser, parse_number};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParkingsDto {
    items: Vec<ParkingDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParkingDto {
    id: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    position: Option<PositionDto>,
    #[serde(default)]
    available_bikes: Option<u32>,
    #[serde(default)]
    free_places: Option<u32>,
    #[serde(default)]
    is_locked: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PositionDto {
    lat: f64,
    lon: f64,
}

/// Parser for the Velobike parkings feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct VelobikeParser;

impl BikeDataParser for VelobikeParser {
    fn format(&self) -> &'static str {
        "Velobike"
    }

    fn parse_cities(
        &self,
        feed: &[u8],
        provider: &ProviderDescriptor,
    ) -> Result<Vec<City>, ParseError> {
        let _: ParkingsDto = serde_json::from_slice(feed)?;
        Ok(vec![provider.single_city()])
    }

    fn parse_stations(&self, feed: &[u8], city: &City) -> Result<Vec<Station>, ParseError> {
        let dto: ParkingsDto = serde_json::from_slice(feed)?;
        let mut stations = Vec::with_capacity(dto.items.len());
        for parking in dto.items {
            let number = match parse_number("Id", &parking.id) {
                Ok(number) => number,
                Err(e) => {
                    warn!(city = %city.name, error = %e, "skipping Velobike parking");
                    continue;
                }
            };
            let mut station = Station::new(number, parking.address.unwrap_or_default().trim())
                .with_availability(
                    parking.available_bikes.unwrap_or(0),
                    parking.free_places.unwrap_or(0),
                )
                .with_opened(!parking.is_locked);
            if let Some(position) = parking.position {
                station = station.with_coordinates(position.lat, position.lon);
            }
            stations.push(station);
        }
        Ok(stations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"{"Items": [
        {"Id": "0101", "Address": "Воздвиженка ул. 5", "Position": {"Lat": 55.752, "Lon": 37.607},
         "AvailableBikes": 3, "FreePlaces": 9, "TotalPlaces": 12, "IsLocked": false},
        {"Id": "0102", "Address": "Тверская ул. 7", "Position": {"Lat": 55.757, "Lon": 37.612},
         "AvailableBikes": 0, "FreePlaces": 0, "IsLocked": true},
        {"Id": "E-1", "Address": "Electric"}
    ]}"#;

    #[test]
    fn single_city() {
        let provider = ProviderDescriptor::new("Velobike", "https://velobike.ru/ajax/parkings/")
            .with_city("Moscow");
        let cities = VelobikeParser.parse_cities(FEED.as_bytes(), &provider).unwrap();
        assert_eq!(cities[0].name, "Moscow");
    }

    #[test]
    fn parses_parkings() {
        let stations = VelobikeParser
            .parse_stations(FEED.as_bytes(), &City::new("Moscow", "Velobike"))
            .unwrap();

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].number, 101);
        assert_eq!(stations[0].name, "Воздвиженка ул. 5");
        assert_eq!(stations[0].available_bikes, 3);
        assert_eq!(stations[0].available_stands, 9);
        assert!(stations[0].opened);
        assert!(!stations[1].opened);
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let provider = ProviderDescriptor::new("Velobike", "x");
        assert!(VelobikeParser.parse_cities(br#"{"items": []}"#, &provider).is_err());
    }
}
