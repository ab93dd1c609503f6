//! Smoove `vcstations.xml` feed.
//!
//! Stations are `<si>` elements under `<vcs><sl>`, with everything in
//! abbreviated attributes: `na` name, `la`/`lg` position, `av` bikes,
//! `fr` free docks.

use tracing::warn;

use crate::catalog::ProviderDescriptor;
use crate::domain::{City, Station};

use super::BikeDataParser;
use super::error::ParseError;
use super::xml::{expect_root, parse_attr};

/// Parser for Smoove station feeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmooveParser;

impl BikeDataParser for SmooveParser {
    fn format(&self) -> &'static str {
        "Smoove"
    }

    fn parse_cities(
        &self,
        feed: &[u8],
        provider: &ProviderDescriptor,
    ) -> Result<Vec<City>, ParseError> {
        let text = String::from_utf8_lossy(feed);
        let doc = roxmltree::Document::parse(&text)?;
        expect_root(&doc, "vcs")?;
        Ok(vec![provider.single_city()])
    }

    fn parse_stations(&self, feed: &[u8], city: &City) -> Result<Vec<Station>, ParseError> {
        let text = String::from_utf8_lossy(feed);
        let doc = roxmltree::Document::parse(&text)?;
        let root = expect_root(&doc, "vcs")?;

        let mut stations = Vec::new();
        for node in root.descendants().filter(|n| n.has_tag_name("si")) {
            match parse_si(node) {
                Ok(station) => stations.push(station),
                Err(e) => warn!(city = %city.name, error = %e, "skipping Smoove station"),
            }
        }
        Ok(stations)
    }
}

fn parse_si(node: roxmltree::Node<'_, '_>) -> Result<Station, ParseError> {
    let name = node.attribute("na").unwrap_or_default();
    Ok(Station::new(parse_attr(node, "id")?, display_name(name))
        .with_coordinates(parse_attr(node, "la")?, parse_attr(node, "lg")?)
        .with_availability(parse_attr(node, "av")?, parse_attr(node, "fr")?))
}

/// Strip the `"001 "` or `"001 - "` number prefix from station names.
fn display_name(raw: &str) -> &str {
    let raw = raw.trim();
    let rest = raw.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == raw.len() || !rest.starts_with(' ') {
        return raw;
    }
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('-').map(str::trim_start).unwrap_or(rest);
    if rest.is_empty() { raw } else { rest }
}
