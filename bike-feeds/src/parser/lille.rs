//! V'Lille XML feeds (Transpole).
//!
//! The station list is a flat `<markers>` document with positions only;
//! availability comes from the per-station `<station>` endpoint, whose
//! freshness is reported as an age such as `"12 secondes"`.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::warn;

use crate::catalog::ProviderDescriptor;
use crate::domain::{City, Station};

use super::error::ParseError;
use super::xml::{child_text, expect_root, parse_attr, parse_child};
use super::{BikeDataParser, parse_number};

/// Parser for the Lille XML dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct LilleParser;

impl LilleParser {
    fn parse_detail_at(
        feed: &[u8],
        station: &Station,
        now: DateTime<Utc>,
    ) -> Result<Station, ParseError> {
        let text = String::from_utf8_lossy(feed);
        let doc = roxmltree::Document::parse(&text)?;
        let root = expect_root(&doc, "station")?;

        let mut updated = station.clone();
        // 0 means in service
        updated.opened = child_text(root, "status").is_some_and(|s| s == "0");
        updated.available_bikes = parse_child(root, "bikes")?;
        updated.available_stands = parse_child(root, "attachs")?;
        // An age too large to subtract from now leaves the timestamp unknown
        if let Some(updated_at) = child_text(root, "lastupd")
            .and_then(parse_age)
            .and_then(|age| now.checked_sub_signed(age))
        {
            updated.last_update = Some(updated_at);
        }
        Ok(updated)
    }
}

/// Parse an age like `"12 secondes"` or `"3 s"`.
fn parse_age(text: &str) -> Option<TimeDelta> {
    let seconds: i64 = text.split_whitespace().next()?.parse().ok()?;
    TimeDelta::try_seconds(seconds)
}

impl BikeDataParser for LilleParser {
    fn format(&self) -> &'static str {
        "Transpole"
    }

    fn parse_cities(
        &self,
        feed: &[u8],
        provider: &ProviderDescriptor,
    ) -> Result<Vec<City>, ParseError> {
        let text = String::from_utf8_lossy(feed);
        let doc = roxmltree::Document::parse(&text)?;
        expect_root(&doc, "markers")?;
        Ok(vec![provider.single_city()])
    }

    fn parse_stations(&self, feed: &[u8], city: &City) -> Result<Vec<Station>, ParseError> {
        let text = String::from_utf8_lossy(feed);
        let doc = roxmltree::Document::parse(&text)?;
        let root = expect_root(&doc, "markers")?;

        let mut stations = Vec::new();
        for marker in root.children().filter(|n| n.has_tag_name("marker")) {
            match parse_marker(marker) {
                Ok(station) => stations.push(station),
                Err(e) => warn!(city = %city.name, error = %e, "skipping V'Lille marker"),
            }
        }
        Ok(stations)
    }

    fn parse_station_detail(&self, feed: &[u8], station: &Station) -> Result<Station, ParseError> {
        Self::parse_detail_at(feed, station, Utc::now())
    }
}

fn parse_marker(marker: roxmltree::Node<'_, '_>) -> Result<Station, ParseError> {
    let id = marker.attribute("id").ok_or(ParseError::MissingField("id"))?;
    let name = marker.attribute("name").unwrap_or_default().trim();
    Ok(Station::new(parse_number("id", id)?, name)
        .with_coordinates(parse_attr(marker, "lat")?, parse_attr(marker, "lng")?))
}
