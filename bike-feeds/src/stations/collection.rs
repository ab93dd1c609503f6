//! The station collection for the selected city.

use std::collections::HashSet;

use tracing::warn;

use crate::domain::{Coordinates, Station};
use crate::events::{Event, EventSink};

use super::error::StationError;

/// Ordered stations of one city, unique by number.
///
/// Replaced wholesale on a bulk refresh and patched in place by single
/// station details. The center is only recomputed on replacement.
#[derive(Debug, Default)]
pub struct StationCollection {
    stations: Vec<Station>,
    center: Option<Coordinates>,
    events: EventSink,
}

impl StationCollection {
    pub fn new(events: EventSink) -> Self {
        Self {
            stations: Vec::new(),
            center: None,
            events,
        }
    }

    /// Swap in a new station list.
    ///
    /// Stations repeating an earlier number are dropped so numbers stay
    /// unique.
    pub fn replace(&mut self, stations: Vec<Station>, with_details: bool) {
        let mut seen = HashSet::with_capacity(stations.len());
        let stations: Vec<Station> = stations
            .into_iter()
            .filter(|s| {
                let first = seen.insert(s.number);
                if !first {
                    warn!(number = s.number, "dropping duplicate station");
                }
                first
            })
            .collect();

        self.stations = stations;
        self.center = compute_center(&self.stations);

        self.events.emit(Event::CollectionReset);
        self.events.emit(Event::CountChanged(self.stations.len()));
        self.events.emit(Event::CenterChanged(self.center));
        self.events.emit(Event::StationsLoaded { with_details });
    }

    /// Empty the collection, e.g. when another city is selected.
    pub fn clear(&mut self) {
        self.stations.clear();
        self.center = None;

        self.events.emit(Event::CollectionReset);
        self.events.emit(Event::CountChanged(0));
        self.events.emit(Event::CenterChanged(None));
    }

    /// Merge a detail response into the station with the same number.
    ///
    /// Returns the row that changed. Never inserts.
    pub fn apply_detail(&mut self, detail: &Station) -> Result<usize, StationError> {
        let row = self
            .stations
            .iter()
            .position(|s| s.number == detail.number)
            .ok_or(StationError::MergeTargetNotFound(detail.number))?;

        let station = &mut self.stations[row];
        station.merge_detail(detail);

        self.events.emit(Event::RowChanged { row });
        self.events.emit(Event::StationUpdated(station.clone()));
        Ok(row)
    }

    pub fn exists(&self, number: u32) -> bool {
        self.stations.iter().any(|s| s.number == number)
    }

    /// Mean position of the stations with a known position, or `None` if
    /// there are none.
    pub fn center(&self) -> Option<Coordinates> {
        self.center
    }

    pub fn get(&self, row: usize) -> Option<&Station> {
        self.stations.get(row)
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

fn compute_center(stations: &[Station]) -> Option<Coordinates> {
    let known: Vec<&Coordinates> = stations
        .iter()
        .map(|s| &s.coordinates)
        .filter(|c| c.is_known())
        .collect();
    if known.is_empty() {
        return None;
    }

    let n = known.len() as f64;
    let latitude = known.iter().map(|c| c.latitude).sum::<f64>() / n;
    let longitude = known.iter().map(|c| c.longitude).sum::<f64>() / n;
    Some(Coordinates::new(latitude, longitude))
}
