//! Nextbike live XML feed.
//!
//! `<markers><country><city><place/></city></country></markers>`. Cities
//! are addressed by their `uid`. Places with `spot="0"` are free-floating
//! bikes, not stations, and are ignored.

use tracing::warn;

use crate::catalog::ProviderDescriptor;
use crate::domain::{City, Station};

use super::error::ParseError;
use super::xml::{expect_root, parse_attr};
use super::{BikeDataParser, parse_count, parse_number};

/// Parser for Nextbike feeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NextbikeParser;

impl BikeDataParser for NextbikeParser {
    fn format(&self) -> &'static str {
        "Nextbike"
    }

    fn parse_cities(
        &self,
        feed: &[u8],
        provider: &ProviderDescriptor,
    ) -> Result<Vec<City>, ParseError> {
        let text = String::from_utf8_lossy(feed);
        let doc = roxmltree::Document::parse(&text)?;
        let root = expect_root(&doc, "markers")?;

        let mut cities = Vec::new();
        for country in root.children().filter(|n| n.has_tag_name("country")) {
            let country_code = country.attribute("country").unwrap_or_default();
            let label = country.attribute("name").unwrap_or_default();
            for city in country.children().filter(|n| n.has_tag_name("city")) {
                let (Some(uid), Some(name)) = (city.attribute("uid"), city.attribute("name")) else {
                    warn!(provider = %provider.name, "skipping Nextbike city without uid or name");
                    continue;
                };
                cities.push(
                    City::new(name, provider.name.clone())
                        .with_id(uid)
                        .with_country_code(country_code)
                        .with_label(if label.is_empty() { name } else { label }),
                );
            }
        }
        Ok(cities)
    }

    fn parse_stations(&self, feed: &[u8], city: &City) -> Result<Vec<Station>, ParseError> {
        let text = String::from_utf8_lossy(feed);
        let doc = roxmltree::Document::parse(&text)?;
        let root = expect_root(&doc, "markers")?;

        // The feed may hold every city; keep only the requested one if present
        let city_nodes: Vec<_> = root
            .descendants()
            .filter(|n| n.has_tag_name("city"))
            .collect();
        let selected: Vec<_> = city_nodes
            .iter()
            .copied()
            .filter(|n| n.attribute("uid") == Some(city.id.as_str()))
            .collect();
        let scope = if selected.is_empty() { city_nodes } else { selected };

        let mut stations = Vec::new();
        for place in scope
            .iter()
            .flat_map(|c| c.children())
            .filter(|n| n.has_tag_name("place"))
            .filter(|n| n.attribute("spot") != Some("0"))
        {
            match parse_place(place) {
                Ok(station) => stations.push(station),
                Err(e) => warn!(city = %city.name, error = %e, "skipping Nextbike place"),
            }
        }
        Ok(stations)
    }
}

fn parse_place(place: roxmltree::Node<'_, '_>) -> Result<Station, ParseError> {
    let number = place
        .attribute("number")
        .ok_or(ParseError::MissingField("number"))?;
    let bikes = place.attribute("bikes").unwrap_or("0");
    let stands = match place.attribute("free_racks") {
        Some(free) => parse_count("free_racks", free)?,
        None => 0,
    };

    Ok(
        Station::new(parse_number("number", number)?, place.attribute("name").unwrap_or_default())
            .with_coordinates(parse_attr(place, "lat")?, parse_attr(place, "lng")?)
            .with_availability(parse_count("bikes", bikes)?, stands),
    )
}
