//! The `<stations><station>...</station></stations>` XML dialect.
//!
//! Used by TfL (London) and BIXI (Montréal). Every station carries its own
//! availability, so there is no per-station endpoint.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::catalog::ProviderDescriptor;
use crate::domain::{City, Station};

use super::BikeDataParser;
use super::error::ParseError;
use super::xml::{child_text, expect_root, parse_child};

/// Parser for the bike stations XML dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct BikeStationsXmlParser;

impl BikeDataParser for BikeStationsXmlParser {
    fn format(&self) -> &'static str {
        "bike stations XML"
    }

    fn parse_cities(
        &self,
        feed: &[u8],
        provider: &ProviderDescriptor,
    ) -> Result<Vec<City>, ParseError> {
        let text = String::from_utf8_lossy(feed);
        let doc = roxmltree::Document::parse(&text)?;
        expect_root(&doc, "stations")?;
        Ok(vec![provider.single_city()])
    }

    fn parse_stations(&self, feed: &[u8], city: &City) -> Result<Vec<Station>, ParseError> {
        let text = String::from_utf8_lossy(feed);
        let doc = roxmltree::Document::parse(&text)?;
        let root = expect_root(&doc, "stations")?;

        let feed_update = root
            .attribute("lastUpdate")
            .and_then(|ms| ms.trim().parse().ok())
            .and_then(DateTime::from_timestamp_millis);

        let mut stations = Vec::new();
        for node in root.children().filter(|n| n.has_tag_name("station")) {
            match parse_station(node, feed_update) {
                Ok(station) => stations.push(station),
                Err(e) => warn!(city = %city.name, error = %e, "skipping station"),
            }
        }
        Ok(stations)
    }
}

fn parse_station(
    node: roxmltree::Node<'_, '_>,
    feed_update: Option<DateTime<Utc>>,
) -> Result<Station, ParseError> {
    let flag = |tag: &str| child_text(node, tag).is_some_and(|v| v.eq_ignore_ascii_case("true"));

    let mut station = Station::new(
        parse_child(node, "id")?,
        child_text(node, "name").unwrap_or_default(),
    )
    .with_coordinates(parse_child(node, "lat")?, parse_child(node, "long")?)
    .with_availability(parse_child(node, "nbBikes")?, parse_child(node, "nbEmptyDocks")?)
    .with_opened(flag("installed") && !flag("locked"));

    // Per-station timestamps win over the feed-wide one
    let station_update = ["latestUpdateTime", "lastCommWithServer"]
        .iter()
        .filter_map(|tag| child_text(node, tag))
        .find_map(|ms| ms.parse().ok())
        .and_then(DateTime::from_timestamp_millis);
    if let Some(last_update) = station_update.or(feed_update) {
        station = station.with_last_update(last_update);
    }

    Ok(station)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinates;

    const LONDON: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<stations lastUpdate="1380535183000" version="2.0">
  <station>
    <id>1</id>
    <name>River Street , Clerkenwell</name>
    <terminalName>001023</terminalName>
    <lat>51.52916347</lat>
    <long>-0.109970527</long>
    <installed>true</installed>
    <locked>false</locked>
    <installDate>1278947280000</installDate>
    <removalDate/>
    <temporary>false</temporary>
    <nbBikes>6</nbBikes>
    <nbEmptyDocks>12</nbEmptyDocks>
    <nbDocks>19</nbDocks>
  </station>
  <station>
    <id>2</id>
    <name>Phillimore Gardens, Kensington</name>
    <lat>51.49960695</lat>
    <long>-0.197574246</long>
    <installed>true</installed>
    <locked>true</locked>
    <nbBikes>0</nbBikes>
    <nbEmptyDocks>37</nbEmptyDocks>
    <latestUpdateTime>1380535000000</latestUpdateTime>
  </station>
  <station>
    <id>broken</id>
    <name>Bad</name>
  </station>
</stations>"#;

    fn provider() -> ProviderDescriptor {
        ProviderDescriptor::new("TfL", "http://tfl/livecyclehireupdates.xml").with_city("London")
    }

    #[test]
    fn single_city_from_descriptor() {
        let cities = BikeStationsXmlParser
            .parse_cities(LONDON.as_bytes(), &provider())
            .unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].name, "London");
        assert_eq!(cities[0].provider_name, "TfL");
    }

    #[test]
    fn parses_stations() {
        let stations = BikeStationsXmlParser
            .parse_stations(LONDON.as_bytes(), &City::new("London", "TfL"))
            .unwrap();

        assert_eq!(stations.len(), 2);

        let first = &stations[0];
        assert_eq!(first.number, 1);
        assert_eq!(first.name, "River Street , Clerkenwell");
        assert_eq!(first.coordinates, Coordinates::new(51.52916347, -0.109970527));
        assert!(first.opened);
        assert_eq!(first.available_bikes, 6);
        assert_eq!(first.available_stands, 12);
        assert_eq!(
            first.last_update,
            DateTime::from_timestamp_millis(1_380_535_183_000)
        );

        let second = &stations[1];
        assert!(!second.opened, "locked stations are closed");
        assert_eq!(
            second.last_update,
            DateTime::from_timestamp_millis(1_380_535_000_000)
        );
    }

    #[test]
    fn bixi_timestamps() {
        let feed = r#"<stations>
  <station>
    <id>5</id><name>Métro Mont-Royal</name>
    <lastCommWithServer>1700000000000</lastCommWithServer>
    <lat>45.5246</lat><long>-73.5812</long>
    <installed>true</installed><locked>false</locked>
    <nbBikes>3</nbBikes><nbEmptyDocks>20</nbEmptyDocks>
  </station>
</stations>"#;
        let stations = BikeStationsXmlParser
            .parse_stations(feed.as_bytes(), &City::new("Montréal", "Bixi"))
            .unwrap();
        assert_eq!(stations[0].name, "Métro Mont-Royal");
        assert_eq!(
            stations[0].last_update,
            DateTime::from_timestamp_millis(1_700_000_000_000)
        );
    }

    #[test]
    fn no_station_details() {
        assert!(matches!(
            BikeStationsXmlParser.parse_station_detail(b"<stations/>", &Station::new(1, "A")),
            Err(ParseError::Unsupported { .. })
        ));
    }

    #[test]
    fn rejects_other_documents() {
        assert!(BikeStationsXmlParser
            .parse_cities(b"<markers/>", &provider())
            .is_err());
    }
}
