//! Provider feed parsers.
//!
//! Every provider family speaks its own wire format. Each format gets one
//! [`BikeDataParser`] implementation, and the [`ParserRegistry`] maps the
//! format name declared in the provider catalog to the parser for it.

mod bike_stations_xml;
mod citybikes;
mod error;
mod jcdecaux;
mod lille;
mod nabsa;
mod nextbike;
mod registry;
mod smoove;
mod velobike;
mod velobike_kz;
mod veloway;
mod xml;

use crate::catalog::ProviderDescriptor;
use crate::domain::{City, Station};

pub use bike_stations_xml::BikeStationsXmlParser;
pub use citybikes::CityBikesParser;
pub use error::{ParseError, excerpt};
pub use jcdecaux::JcDecauxParser;
pub use lille::LilleParser;
pub use nabsa::NabsaParser;
pub use nextbike::NextbikeParser;
pub use registry::{ParserFactory, ParserRegistry, UnknownFormat};
pub use smoove::SmooveParser;
pub use velobike::VelobikeParser;
pub use velobike_kz::VelobikeKzParser;
pub use veloway::VelowayParser;

/// Turns raw provider feeds into normalized cities and stations.
///
/// Parsers are stateless; one instance may serve any number of feeds.
pub trait BikeDataParser: Send + Sync {
    /// Format name, for diagnostics.
    fn format(&self) -> &'static str;

    /// Parse the provider's city list feed.
    fn parse_cities(
        &self,
        feed: &[u8],
        provider: &ProviderDescriptor,
    ) -> Result<Vec<City>, ParseError>;

    /// Parse the feed listing every station of `city`.
    fn parse_stations(&self, feed: &[u8], city: &City) -> Result<Vec<Station>, ParseError>;

    /// Parse a single-station detail feed for `station`.
    ///
    /// Returns `station` with its live fields refreshed. Formats without a
    /// per-station endpoint keep the default, which always fails.
    fn parse_station_detail(&self, feed: &[u8], station: &Station) -> Result<Station, ParseError> {
        let _ = (feed, station);
        Err(ParseError::Unsupported {
            format: self.format(),
            operation: "station details",
        })
    }
}

/// Parse a station number, tolerating surrounding whitespace and leading
/// zeros.
pub(crate) fn parse_number(field: &'static str, value: &str) -> Result<u32, ParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| ParseError::invalid(field, value))
}

/// Parse the leading digits of a count such as `"5+"`.
pub(crate) fn parse_count(field: &'static str, value: &str) -> Result<u32, ParseError> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().map_err(|_| ParseError::invalid(field, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ListOnly;

    impl BikeDataParser for ListOnly {
        fn format(&self) -> &'static str {
            "ListOnly"
        }

        fn parse_cities(
            &self,
            _feed: &[u8],
            provider: &ProviderDescriptor,
        ) -> Result<Vec<City>, ParseError> {
            Ok(vec![provider.single_city()])
        }

        fn parse_stations(&self, _feed: &[u8], _city: &City) -> Result<Vec<Station>, ParseError> {
            Ok(vec![])
        }
    }

    #[test]
    fn detail_unsupported_by_default() {
        let err = ListOnly
            .parse_station_detail(b"", &Station::new(1, "A"))
            .unwrap_err();
        assert_eq!(err.to_string(), "ListOnly feeds have no station details");
    }

    #[test]
    fn numbers_and_counts() {
        assert_eq!(parse_number("id", " 0042 ").unwrap(), 42);
        assert!(parse_number("id", "abc").is_err());
        assert_eq!(parse_count("bikes", "5+").unwrap(), 5);
        assert_eq!(parse_count("bikes", "12").unwrap(), 12);
        assert!(parse_count("bikes", "").is_err());
    }
}
