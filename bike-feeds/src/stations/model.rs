//! Station list of the selected city.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{City, Coordinates, Station};
use crate::events::{Event, EventSink};
use crate::transport::Fetcher;

use super::collection::StationCollection;
use super::error::StationError;
use super::loader::StationLoader;

struct ModelState<F> {
    loader: Option<Arc<StationLoader<F>>>,
    /// Bumped on every city switch; requests carry the value they started
    /// with.
    generation: u64,
    collection: StationCollection,
}

/// Keeps the station collection in sync with the selected city.
///
/// Fetches run without holding the lock; their results are merged under
/// it, one at a time, and dropped if the city changed in the meantime.
pub struct StationsModel<F> {
    state: Mutex<ModelState<F>>,
    events: EventSink,
}

/// What a request started against.
struct Ticket<F> {
    loader: Arc<StationLoader<F>>,
    generation: u64,
}

impl<F: Fetcher> StationsModel<F> {
    pub fn new(events: EventSink) -> Self {
        Self {
            state: Mutex::new(ModelState {
                loader: None,
                generation: 0,
                collection: StationCollection::new(events.clone()),
            }),
            events,
        }
    }

    /// Switch to another city. The collection is emptied until the next
    /// load.
    pub async fn set_city(&self, loader: StationLoader<F>) {
        let mut state = self.state.lock().await;
        info!(city = %loader.city().name, provider = %loader.provider().name, "city selected");
        state.generation += 1;
        state.loader = Some(Arc::new(loader));
        state.collection.clear();
    }

    async fn ticket(&self) -> Result<Ticket<F>, StationError> {
        let state = self.state.lock().await;
        let loader = state.loader.clone().ok_or(StationError::NoCitySelected)?;
        Ok(Ticket {
            loader,
            generation: state.generation,
        })
    }

    /// Load the selected city's stations. Returns the new station count.
    pub async fn load_stations_list(&self) -> Result<usize, StationError> {
        self.load(false).await
    }

    /// Reload every station with live availability. Returns the new
    /// station count.
    pub async fn load_all_stations_details(&self) -> Result<usize, StationError> {
        self.load(true).await
    }

    async fn load(&self, with_details: bool) -> Result<usize, StationError> {
        let ticket = self.ticket().await?;
        let stations = if with_details {
            ticket.loader.fetch_all_stations_details().await?
        } else {
            ticket.loader.fetch_all_stations_list().await?
        };

        let mut state = self.state.lock().await;
        if state.generation != ticket.generation {
            debug!(city = %ticket.loader.city().name, "discarding stale station list");
            return Err(stale(&ticket));
        }
        state.collection.replace(stations, with_details);
        Ok(state.collection.len())
    }

    /// Refresh the station at `index` from its detail endpoint.
    ///
    /// Returns `false` without fetching when the provider has no
    /// per-station endpoint.
    pub async fn fetch_station_information(&self, index: usize) -> Result<bool, StationError> {
        let (ticket, station) = {
            let state = self.state.lock().await;
            let loader = state.loader.clone().ok_or(StationError::NoCitySelected)?;
            let station = state
                .collection
                .get(index)
                .cloned()
                .ok_or(StationError::IndexOutOfRange(index))?;
            let ticket = Ticket {
                loader,
                generation: state.generation,
            };
            (ticket, station)
        };
        if !ticket.loader.supports_station_details() {
            return Ok(false);
        }

        self.refresh(&ticket, station).await?;
        Ok(true)
    }

    /// Refresh several stations at once.
    ///
    /// Providers without a per-station endpoint get one bulk details
    /// reload instead. Otherwise every detail is fetched concurrently and
    /// merged as it arrives; out-of-range indexes are skipped. Returns the
    /// number of stations updated. Individual failures are reported as
    /// `StationFailed` events.
    pub async fn fetch_stations_information(
        &self,
        indexes: &[usize],
    ) -> Result<usize, StationError> {
        let (ticket, stations) = {
            let state = self.state.lock().await;
            let loader = state.loader.clone().ok_or(StationError::NoCitySelected)?;
            let stations: Vec<Station> = indexes
                .iter()
                .filter_map(|&index| {
                    let station = state.collection.get(index).cloned();
                    if station.is_none() {
                        warn!(index, "skipping out of range station index");
                    }
                    station
                })
                .collect();
            let ticket = Ticket {
                loader,
                generation: state.generation,
            };
            (ticket, stations)
        };

        if !ticket.loader.supports_station_details() {
            debug!(city = %ticket.loader.city().name, "no per-station endpoint, reloading all");
            return self.load_all_stations_details().await;
        }

        let results = join_all(
            stations
                .into_iter()
                .map(|station| self.refresh(&ticket, station)),
        )
        .await;
        Ok(results.iter().filter(|r| r.is_ok()).count())
    }

    async fn refresh(&self, ticket: &Ticket<F>, station: Station) -> Result<usize, StationError> {
        let detail = ticket.loader.fetch_station_details(&station).await?;

        let mut state = self.state.lock().await;
        if state.generation != ticket.generation {
            debug!(
                city = %ticket.loader.city().name,
                station = detail.number,
                "discarding stale station details"
            );
            return Err(stale(ticket));
        }
        match state.collection.apply_detail(&detail) {
            Ok(row) => Ok(row),
            Err(e) => {
                warn!(city = %ticket.loader.city().name, error = %e, "dropping station update");
                self.events.emit(Event::StationFailed {
                    city: ticket.loader.city().name.clone(),
                    number: Some(detail.number),
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    pub async fn exists(&self, number: u32) -> bool {
        self.state.lock().await.collection.exists(number)
    }

    /// Mean position of the located stations, `None` without data.
    pub async fn center(&self) -> Option<Coordinates> {
        self.state.lock().await.collection.center()
    }

    pub async fn count(&self) -> usize {
        self.state.lock().await.collection.len()
    }

    /// Snapshot of the current stations, in collection order.
    pub async fn stations(&self) -> Vec<Station> {
        self.state.lock().await.collection.stations().to_vec()
    }

    pub async fn city(&self) -> Option<City> {
        let state = self.state.lock().await;
        state.loader.as_ref().map(|l| l.city().clone())
    }

    /// Attribution text to display with the selected city's data.
    pub async fn copyright(&self) -> Option<String> {
        let state = self.state.lock().await;
        state
            .loader
            .as_ref()
            .and_then(|l| l.provider().copyright.clone())
    }
}

fn stale<F: Fetcher>(ticket: &Ticket<F>) -> StationError {
    StationError::Stale {
        city: ticket.loader.city().name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::catalog::ProviderCatalog;
    use crate::events::{self, drain};
    use crate::parser::ParserRegistry;
    use crate::transport::MockFetcher;

    const LILLE_LIST: &str = "http://vlille.fr/stations/xml-stations.aspx";
    const LILLE_DETAIL: &str = "http://vlille.fr/stations/xml-station.aspx?borne=";
    const TFL_LIST: &str =
        "https://tfl.gov.uk/tfl/syndication/feeds/cycle-hire/livecyclehireupdates.xml";

    const MARKERS: &[u8] = include_bytes!("../../data/fixtures/vlille_markers.xml");
    const STATION_10: &[u8] = include_bytes!("../../data/fixtures/vlille_station_10.xml");
    const STATION_20: &[u8] = include_bytes!("../../data/fixtures/vlille_station_20.xml");
    const TFL: &[u8] = include_bytes!("../../data/fixtures/tfl_stations.xml");

    fn detail_url(number: u32) -> String {
        format!("{LILLE_DETAIL}{number}")
    }

    fn loader(
        provider: &str,
        fetcher: &Arc<MockFetcher>,
        events: &EventSink,
    ) -> StationLoader<MockFetcher> {
        let catalog =
            ProviderCatalog::from_json(include_bytes!("../../data/bikesproviders.json")).unwrap();
        let city = catalog.get(provider).unwrap().single_city();
        StationLoader::for_city(
            fetcher.clone(),
            &ParserRegistry::with_builtin_parsers(),
            &catalog,
            city,
            events.clone(),
        )
        .unwrap()
    }

    fn lille_fetcher() -> MockFetcher {
        MockFetcher::new()
            .with_body(LILLE_LIST, MARKERS)
            .with_body(detail_url(10), STATION_10)
            .with_body(detail_url(20), STATION_20)
    }

    async fn lille_model(
        fetcher: MockFetcher,
        events: EventSink,
    ) -> (StationsModel<MockFetcher>, Arc<MockFetcher>) {
        let fetcher = Arc::new(fetcher);
        let model = StationsModel::new(events.clone());
        model.set_city(loader("Transpole", &fetcher, &events)).await;
        model.load_stations_list().await.unwrap();
        (model, fetcher)
    }

    #[tokio::test]
    async fn nothing_selected() {
        let model: StationsModel<MockFetcher> = StationsModel::new(EventSink::disconnected());

        assert!(matches!(
            model.load_stations_list().await,
            Err(StationError::NoCitySelected)
        ));
        assert!(matches!(
            model.fetch_station_information(0).await,
            Err(StationError::NoCitySelected)
        ));
        assert_eq!(model.count().await, 0);
        assert_eq!(model.center().await, None);
        assert_eq!(model.city().await, None);
    }

    #[tokio::test]
    async fn loads_selected_city() {
        let (model, _) = lille_model(lille_fetcher(), EventSink::disconnected()).await;

        assert_eq!(model.count().await, 3);
        assert!(model.exists(42).await);
        assert!(!model.exists(43).await);
        assert!(model.center().await.is_some());
        assert_eq!(model.city().await.unwrap().name, "Lille");
        assert_eq!(model.copyright().await, None);
    }

    #[tokio::test]
    async fn copyright_follows_provider() {
        let fetcher = Arc::new(MockFetcher::new().with_body(TFL_LIST, TFL));
        let events = EventSink::disconnected();
        let model = StationsModel::new(events.clone());
        model.set_city(loader("TfL", &fetcher, &events)).await;

        assert_eq!(
            model.copyright().await.as_deref(),
            Some("Powered by TfL Open Data")
        );
    }

    #[tokio::test]
    async fn single_station_refresh() {
        let (model, fetcher) = lille_model(lille_fetcher(), EventSink::disconnected()).await;

        assert!(model.fetch_station_information(0).await.unwrap());

        let station = &model.stations().await[0];
        assert_eq!(station.number, 10);
        assert_eq!(station.available_bikes, 3);
        assert_eq!(station.available_stands, 17);
        assert!(fetcher.requests().contains(&detail_url(10)));

        assert!(matches!(
            model.fetch_station_information(7).await,
            Err(StationError::IndexOutOfRange(7))
        ));
    }

    #[tokio::test]
    async fn concurrent_details_complete_out_of_order() {
        let (sink, mut rx) = events::channel();
        let fetcher = MockFetcher::new()
            .with_body(LILLE_LIST, MARKERS)
            .with_delayed_body(detail_url(10), STATION_10, Duration::from_millis(80))
            .with_body(detail_url(20), STATION_20);
        let (model, _) = lille_model(fetcher, sink).await;
        drain(&mut rx);

        let updated = model.fetch_stations_information(&[0, 1]).await.unwrap();
        assert_eq!(updated, 2);

        let stations = model.stations().await;
        assert_eq!(stations.len(), 3);
        assert_eq!(stations[0].number, 10);
        assert_eq!(stations[0].available_bikes, 3);
        assert!(stations[0].opened);
        assert_eq!(stations[1].number, 20);
        assert_eq!(stations[1].available_stands, 24);
        assert!(!stations[1].opened);

        let rows: Vec<usize> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                Event::RowChanged { row } => Some(row),
                _ => None,
            })
            .collect();
        assert_eq!(rows, vec![1, 0]);
    }

    #[tokio::test]
    async fn failed_detail_keeps_last_values() {
        let (sink, mut rx) = events::channel();
        let fetcher = MockFetcher::new()
            .with_body(LILLE_LIST, MARKERS)
            .with_body(detail_url(10), STATION_10)
            .with_network_error(detail_url(20), "connection reset");
        let (model, _) = lille_model(fetcher, sink).await;
        let before = model.stations().await;
        drain(&mut rx);

        let updated = model.fetch_stations_information(&[0, 1, 9]).await.unwrap();

        assert_eq!(updated, 1);
        assert_eq!(model.stations().await[1], before[1]);
        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            Event::StationFailed {
                number: Some(20),
                ..
            }
        )));
    }

    #[tokio::test]
    async fn falls_back_to_bulk_refresh() {
        let (sink, mut rx) = events::channel();
        let fetcher = Arc::new(MockFetcher::new().with_body(TFL_LIST, TFL));
        let model = StationsModel::new(sink.clone());
        model.set_city(loader("TfL", &fetcher, &sink)).await;
        model.load_stations_list().await.unwrap();
        drain(&mut rx);

        assert!(!model.fetch_station_information(0).await.unwrap());
        let updated = model.fetch_stations_information(&[0]).await.unwrap();

        assert_eq!(updated, 2);
        assert_eq!(fetcher.requests(), vec![TFL_LIST.to_string(); 2]);
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            Event::StationsLoaded { with_details: true }
        )));
    }

    #[tokio::test]
    async fn city_switch_discards_late_details() {
        let (sink, mut rx) = events::channel();
        let fetcher = MockFetcher::new()
            .with_body(LILLE_LIST, MARKERS)
            .with_delayed_body(detail_url(10), STATION_10, Duration::from_millis(80))
            .with_body(TFL_LIST, TFL);
        let (model, fetcher) = lille_model(fetcher, sink.clone()).await;

        let switch = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            model.set_city(loader("TfL", &fetcher, &sink)).await;
        };
        let (result, ()) = tokio::join!(model.fetch_station_information(0), switch);

        assert!(matches!(result, Err(StationError::Stale { city }) if city == "Lille"));
        assert_eq!(model.count().await, 0);
        assert_eq!(model.city().await.unwrap().name, "London");
        assert!(
            !drain(&mut rx)
                .iter()
                .any(|e| matches!(e, Event::RowChanged { .. }))
        );
    }

    #[tokio::test]
    async fn city_switch_discards_late_list() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_delayed_body(LILLE_LIST, MARKERS, Duration::from_millis(80))
                .with_body(TFL_LIST, TFL),
        );
        let events = EventSink::disconnected();
        let model = StationsModel::new(events.clone());
        model.set_city(loader("Transpole", &fetcher, &events)).await;

        let switch = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            model.set_city(loader("TfL", &fetcher, &events)).await;
            model.load_stations_list().await
        };
        let (lille, london) = tokio::join!(model.load_stations_list(), switch);

        assert!(matches!(lille, Err(StationError::Stale { .. })));
        assert_eq!(london.unwrap(), 2);
        assert_eq!(model.count().await, 2);
        assert!(model.exists(3).await);
    }
}
