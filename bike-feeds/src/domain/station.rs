//! Bike-docking stations.

use chrono::{DateTime, Utc};

/// A latitude/longitude pair in degrees.
///
/// `(0, 0)` is the "unknown position" sentinel: several providers list
/// stations before they report a location for them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether this is a real position rather than the unknown sentinel.
    ///
    /// Only the latitude is checked; a station on the equator is not a
    /// realistic case for any provider.
    pub fn is_known(&self) -> bool {
        self.latitude != 0.0
    }
}

/// A single bike-docking point with live availability.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Natural key, unique within a city.
    pub number: u32,
    pub name: String,
    pub opened: bool,
    pub coordinates: Coordinates,
    pub available_bikes: u32,
    pub available_stands: u32,
    /// When the provider last refreshed this station, if reported.
    pub last_update: Option<DateTime<Utc>>,
}

impl Station {
    /// Create an open station with no position and no availability data.
    pub fn new(number: u32, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            opened: true,
            coordinates: Coordinates::default(),
            available_bikes: 0,
            available_stands: 0,
            last_update: None,
        }
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Coordinates::new(latitude, longitude);
        self
    }

    pub fn with_availability(mut self, bikes: u32, stands: u32) -> Self {
        self.available_bikes = bikes;
        self.available_stands = stands;
        self
    }

    pub fn with_opened(mut self, opened: bool) -> Self {
        self.opened = opened;
        self
    }

    pub fn with_last_update(mut self, last_update: DateTime<Utc>) -> Self {
        self.last_update = Some(last_update);
        self
    }

    /// Merge the live fields of a detail response into this station.
    ///
    /// `number` and `name` are never touched. Coordinates are only taken
    /// from the detail when this station has no known position yet.
    pub fn merge_detail(&mut self, detail: &Station) {
        self.opened = detail.opened;
        self.available_bikes = detail.available_bikes;
        self.available_stands = detail.available_stands;
        if detail.last_update.is_some() {
            self.last_update = detail.last_update;
        }
        if !self.coordinates.is_known() && detail.coordinates.is_known() {
            self.coordinates = detail.coordinates;
        }
    }
}
