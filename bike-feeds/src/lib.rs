//! Bike-sharing feed aggregator.
//!
//! Loads a catalog of bike-share providers, fetches each provider's city
//! list in its own wire format, and keeps the station list of one selected
//! city up to date. Results are pushed to the display layer as events.

pub mod catalog;
pub mod domain;
pub mod events;
pub mod feed;
pub mod parser;
pub mod stations;
pub mod transport;
