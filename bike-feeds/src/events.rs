//! Events surfaced to the display layer.
//!
//! The core never calls into the UI. It pushes [`Event`]s into an
//! unbounded channel and the UI drains them at its own pace.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::{City, Coordinates, Station};
use crate::feed::ProviderError;

/// Something the display layer may want to react to.
#[derive(Debug, Clone)]
pub enum Event {
    /// One provider's city list was parsed. Fired once per provider.
    CitiesAdded { provider: String, cities: Vec<City> },

    /// A provider contributes nothing to this load.
    ProviderFailed {
        provider: String,
        error: Arc<ProviderError>,
    },

    /// A city's full station list arrived.
    StationsFetched {
        city: String,
        stations: Vec<Station>,
        with_details: bool,
    },

    /// A single station's details arrived.
    StationDetailsFetched { city: String, station: Station },

    /// A station request failed; the station keeps its last known values.
    ///
    /// `number` is `None` for a whole-city request. `reason` is the
    /// rendered error.
    StationFailed {
        city: String,
        number: Option<u32>,
        reason: String,
    },

    /// The station collection was replaced wholesale.
    CollectionReset,

    /// Number of stations in the collection.
    CountChanged(usize),

    /// The collection's center moved. `None` when no station has a
    /// known position.
    CenterChanged(Option<Coordinates>),

    /// A bulk refresh finished.
    StationsLoaded { with_details: bool },

    /// The station at `row` changed in place.
    RowChanged { row: usize },

    /// A station's live fields were refreshed.
    StationUpdated(Station),
}

/// Sending half of the event channel.
///
/// A disconnected sink drops events; so does a sink whose receiver is gone.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<Event>>,
}

impl EventSink {
    /// A sink that discards everything.
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: Event) {
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is listening any more
            let _ = tx.send(event);
        }
    }
}

/// Create a connected sink and its receiver.
pub fn channel() -> (EventSink, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx: Some(tx) }, rx)
}

/// Take every event currently queued.
#[cfg(test)]
pub(crate) fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
