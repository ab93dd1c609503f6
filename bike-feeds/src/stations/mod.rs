//! Station loading for the selected city.
//!
//! [`StationLoader`] fetches and parses one city's station feeds,
//! [`StationCollection`] holds the resulting stations, and
//! [`StationsModel`] ties the two together for whichever city is currently
//! selected, discarding responses that arrive after a city switch.

mod collection;
mod error;
mod loader;
mod model;

pub use collection::StationCollection;
pub use error::StationError;
pub use loader::StationLoader;
pub use model::StationsModel;
