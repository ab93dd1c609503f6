//! Station loading error types.

use crate::parser::{ParseError, UnknownFormat, excerpt};
use crate::transport::FetchError;

/// Errors loading or merging station data.
///
/// All of these are recoverable: the collection keeps its last known
/// values.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// No city has been selected yet
    #[error("no city selected")]
    NoCitySelected,

    /// The city's provider isn't in the catalog
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// No parser registered for the provider's format
    #[error(transparent)]
    UnknownFormat(#[from] UnknownFormat),

    /// The provider has no all-stations endpoint
    #[error("{provider} has no station list endpoint")]
    NoStationsEndpoint { provider: String },

    /// The provider has no per-station endpoint; check
    /// `supports_station_details` before asking
    #[error("{provider} has no per-station details endpoint")]
    DetailsUnsupported { provider: String },

    /// Network or HTTP failure
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The feed arrived but couldn't be parsed
    #[error("failed to parse station feed: {source} (payload: {excerpt:?})")]
    Parse {
        excerpt: String,
        #[source]
        source: ParseError,
    },

    /// A detail update matched no station in the collection
    #[error("station {0} is not in the collection")]
    MergeTargetNotFound(u32),

    /// Row index outside the collection
    #[error("station index {0} is out of range")]
    IndexOutOfRange(usize),

    /// The response belongs to a city that is no longer selected
    #[error("response for {city} arrived after a city switch")]
    Stale { city: String },
}

impl StationError {
    pub(crate) fn parse(source: ParseError, feed: &[u8]) -> Self {
        StationError::Parse {
            excerpt: excerpt(feed),
            source,
        }
    }
}
