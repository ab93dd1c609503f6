//! Concurrent city list loading.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::{debug, error, info, warn};

use crate::catalog::{CatalogError, CatalogSource, ProviderCatalog, ProviderDescriptor};
use crate::domain::City;
use crate::events::{Event, EventSink};
use crate::parser::ParserRegistry;
use crate::transport::{CacheStore, Fetcher};

use super::error::{ProviderError, ProviderFailure};

/// Outcome of one `load_all`.
#[derive(Debug, Clone)]
pub struct FeedLoad {
    /// The catalog the load ran against.
    pub catalog: Arc<ProviderCatalog>,

    /// Every city loaded, in the order providers completed.
    pub cities: Vec<City>,

    /// Providers that contributed nothing, including cache misses.
    pub failures: Vec<ProviderFailure>,
}

impl FeedLoad {
    /// Find a loaded city by provider and name.
    pub fn city(&self, provider: &str, name: &str) -> Option<&City> {
        self.cities
            .iter()
            .find(|c| c.provider_name == provider && c.name == name)
    }
}

/// Loads every provider's city list.
pub struct FeedLoader<F, C> {
    source: CatalogSource,
    registry: Arc<ParserRegistry>,
    fetcher: Arc<F>,
    cache: Arc<C>,
    events: EventSink,
}

impl<F: Fetcher, C: CacheStore> FeedLoader<F, C> {
    pub fn new(
        source: CatalogSource,
        registry: Arc<ParserRegistry>,
        fetcher: Arc<F>,
        cache: Arc<C>,
        events: EventSink,
    ) -> Self {
        Self {
            source,
            registry,
            fetcher,
            cache,
            events,
        }
    }

    /// Load every provider's cities.
    ///
    /// With `use_cache` only previously saved feeds are read and no request
    /// is made; providers without a cache entry are skipped. Otherwise
    /// every provider is fetched and its raw feed saved to the cache.
    ///
    /// Emits one `CitiesAdded` per provider as soon as it is parsed. Only a
    /// catalog failure is returned as an error.
    pub async fn load_all(&self, use_cache: bool) -> Result<FeedLoad, CatalogError> {
        let catalog = match ProviderCatalog::load(&self.source) {
            Ok(catalog) => Arc::new(catalog),
            Err(e) => {
                error!(error = %e, "failed to load provider catalog");
                return Err(e);
            }
        };
        info!(providers = catalog.len(), use_cache, "loading cities");

        let mut pending: FuturesUnordered<_> = catalog
            .iter()
            .map(|provider| async move {
                let result = self.load_provider(provider, use_cache).await;
                (provider, result)
            })
            .collect();

        let mut cities = Vec::new();
        let mut failures = Vec::new();

        while let Some((provider, result)) = pending.next().await {
            match result {
                Ok(provider_cities) => {
                    debug!(
                        provider = %provider.name,
                        cities = provider_cities.len(),
                        "provider loaded"
                    );
                    cities.extend(provider_cities.iter().cloned());
                    self.events.emit(Event::CitiesAdded {
                        provider: provider.name.clone(),
                        cities: provider_cities,
                    });
                }
                Err(e) => {
                    let error = Arc::new(e);
                    if error.is_cache_miss() {
                        debug!(provider = %provider.name, "no cached feed, skipping");
                    } else {
                        warn!(provider = %provider.name, error = %error, "provider skipped");
                        self.events.emit(Event::ProviderFailed {
                            provider: provider.name.clone(),
                            error: error.clone(),
                        });
                    }
                    failures.push(ProviderFailure {
                        provider: provider.name.clone(),
                        error,
                    });
                }
            }
        }
        drop(pending);

        info!(
            cities = cities.len(),
            failed = failures.len(),
            "finished loading cities"
        );

        Ok(FeedLoad {
            catalog,
            cities,
            failures,
        })
    }

    async fn load_provider(
        &self,
        provider: &ProviderDescriptor,
        use_cache: bool,
    ) -> Result<Vec<City>, ProviderError> {
        let parser = self.registry.resolve(&provider.format)?;

        let feed = if use_cache {
            self.cache.read(&provider.name)?
        } else {
            let feed = self.fetcher.fetch(&provider.list_url).await?;
            if let Err(e) = self.cache.write(&provider.name, &feed) {
                warn!(provider = %provider.name, error = %e, "failed to cache feed");
            }
            feed
        };

        parser
            .parse_cities(&feed, provider)
            .map_err(|e| ProviderError::parse(e, &feed))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::events::{self, drain};
    use crate::transport::{FileCache, MockFetcher};

    const CONTRACTS: &str = include_str!("../../data/fixtures/jcdecaux_contracts.json");
    const MARKERS: &str = include_str!("../../data/fixtures/vlille_markers.xml");
    const LONDON: &str = include_str!("../../data/fixtures/tfl_stations.xml");

    const CATALOG: &str = r#"[
        {"name": "JCDecaux", "url": "http://jcdecaux/contracts?apiKey={apiKey}", "apiKey": "k1"},
        {"name": "Transpole", "url": "http://vlille/markers.xml", "city": "Lille", "countryCode": "FR"},
        {"name": "TfL", "url": "http://tfl/stations.xml", "city": "London"}
    ]"#;

    fn inline(json: &str) -> CatalogSource {
        CatalogSource::Inline(Bytes::from(json.to_string()))
    }

    fn all_feeds() -> MockFetcher {
        MockFetcher::new()
            .with_body("http://jcdecaux/contracts?apiKey=k1", CONTRACTS)
            .with_body("http://vlille/markers.xml", MARKERS)
            .with_body("http://tfl/stations.xml", LONDON)
    }

    struct Harness {
        loader: FeedLoader<MockFetcher, FileCache>,
        fetcher: MockFetcher,
        rx: tokio::sync::mpsc::UnboundedReceiver<Event>,
        _dir: TempDir,
    }

    fn harness(catalog: &str, fetcher: MockFetcher) -> Harness {
        let dir = tempdir().unwrap();
        let (sink, rx) = events::channel();
        let loader = FeedLoader::new(
            inline(catalog),
            Arc::new(ParserRegistry::with_builtin_parsers()),
            Arc::new(fetcher.clone()),
            Arc::new(FileCache::new(dir.path())),
            sink,
        );
        Harness {
            loader,
            fetcher,
            rx,
            _dir: dir,
        }
    }

    fn cities_added(events: &[Event]) -> Vec<(&str, usize)> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::CitiesAdded { provider, cities } => Some((provider.as_str(), cities.len())),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn loads_every_provider() {
        let mut h = harness(CATALOG, all_feeds());

        let load = h.loader.load_all(false).await.unwrap();

        assert_eq!(load.cities.len(), 4);
        assert!(load.failures.is_empty());
        assert!(load.city("JCDecaux", "Lyon").is_some());
        assert_eq!(load.city("Transpole", "Lille").unwrap().country_code, "FR");
        assert!(load.city("TfL", "London").is_some());

        let events = drain(&mut h.rx);
        let mut added = cities_added(&events);
        added.sort();
        assert_eq!(added, vec![("JCDecaux", 2), ("TfL", 1), ("Transpole", 1)]);
    }

    #[tokio::test]
    async fn fetches_resolved_list_url() {
        let catalog = r#"[{"name": "JCDecaux", "url": "http://x/{apiKey}", "apiKey": "k1"}]"#;
        let h = harness(catalog, MockFetcher::new().with_body("http://x/k1", CONTRACTS));

        let load = h.loader.load_all(false).await.unwrap();

        assert_eq!(h.fetcher.requests(), vec!["http://x/k1"]);
        assert_eq!(load.cities.len(), 2);
    }

    #[tokio::test]
    async fn cache_only_without_cache_file_emits_nothing() {
        let mut h = harness(CATALOG, all_feeds());

        let load = h.loader.load_all(true).await.unwrap();

        assert!(load.cities.is_empty());
        assert_eq!(load.failures.len(), 3);
        assert!(load.failures.iter().all(|f| f.error.is_cache_miss()));
        // Offline mode never touches the network
        assert!(h.fetcher.requests().is_empty());
        assert!(drain(&mut h.rx).is_empty());
    }

    #[tokio::test]
    async fn cached_feeds_round_trip() {
        let mut h = harness(CATALOG, all_feeds());

        let online = h.loader.load_all(false).await.unwrap();
        drain(&mut h.rx);
        let offline = h.loader.load_all(true).await.unwrap();

        let mut online_cities = online.cities.clone();
        let mut offline_cities = offline.cities.clone();
        online_cities.sort_by(|a, b| a.name.cmp(&b.name));
        offline_cities.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(online_cities, offline_cities);
        assert_eq!(cities_added(&drain(&mut h.rx)).len(), 3);
        // Only the first load made requests
        assert_eq!(h.fetcher.requests().len(), 3);
    }

    #[tokio::test]
    async fn unknown_format_skips_only_that_provider() {
        let catalog = r#"[
            {"name": "Bicloo", "url": "http://bicloo/feed"},
            {"name": "TfL", "url": "http://tfl/stations.xml", "city": "London"}
        ]"#;
        let mut h = harness(catalog, all_feeds());

        let load = h.loader.load_all(false).await.unwrap();

        assert_eq!(load.cities.len(), 1);
        assert_eq!(load.failures.len(), 1);
        assert!(matches!(
            load.failures[0].error.as_ref(),
            ProviderError::UnknownFormat(_)
        ));
        // Unknown formats are not fetched at all
        assert_eq!(h.fetcher.requests(), vec!["http://tfl/stations.xml"]);

        let events = drain(&mut h.rx);
        assert_eq!(cities_added(&events), vec![("TfL", 1)]);
        assert!(events.iter().any(
            |e| matches!(e, Event::ProviderFailed { provider, .. } if provider == "Bicloo")
        ));
    }

    #[tokio::test]
    async fn network_and_parse_failures_are_isolated() {
        let fetcher = MockFetcher::new()
            .with_network_error("http://jcdecaux/contracts?apiKey=k1", "connection reset")
            .with_body("http://vlille/markers.xml", "<html>Service Unavailable</html>")
            .with_body("http://tfl/stations.xml", LONDON);
        let mut h = harness(CATALOG, fetcher);

        let load = h.loader.load_all(false).await.unwrap();

        assert_eq!(load.cities.len(), 1);
        assert_eq!(load.cities[0].name, "London");
        assert_eq!(load.failures.len(), 2);

        let parse_failure = load
            .failures
            .iter()
            .find(|f| f.provider == "Transpole")
            .unwrap();
        match parse_failure.error.as_ref() {
            ProviderError::Parse { excerpt, .. } => {
                assert_eq!(excerpt, "<html>Service Unavailable</html>")
            }
            other => panic!("expected parse error, got {other:?}"),
        }

        let failed = drain(&mut h.rx)
            .into_iter()
            .filter(|e| matches!(e, Event::ProviderFailed { .. }))
            .count();
        assert_eq!(failed, 2);
    }

    #[tokio::test]
    async fn slow_provider_does_not_block_others() {
        let fetcher = MockFetcher::new()
            .with_delayed_body(
                "http://jcdecaux/contracts?apiKey=k1",
                CONTRACTS,
                Duration::from_millis(200),
            )
            .with_body("http://vlille/markers.xml", MARKERS)
            .with_body("http://tfl/stations.xml", LONDON);
        let mut h = harness(CATALOG, fetcher);

        let load = h.loader.load_all(false).await.unwrap();

        let events = drain(&mut h.rx);
        let added = cities_added(&events);
        assert_eq!(added.len(), 3);
        assert_eq!(added[2], ("JCDecaux", 2));
        // Cities accumulate in arrival order
        assert_eq!(load.cities.last().unwrap().provider_name, "JCDecaux");
    }

    #[tokio::test]
    async fn cache_write_failure_does_not_block_parsing() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let (sink, mut rx) = events::channel();
        let loader = FeedLoader::new(
            inline(CATALOG),
            Arc::new(ParserRegistry::with_builtin_parsers()),
            Arc::new(all_feeds()),
            Arc::new(FileCache::new(&blocker)),
            sink,
        );

        let load = loader.load_all(false).await.unwrap();

        assert_eq!(load.cities.len(), 4);
        assert_eq!(cities_added(&drain(&mut rx)).len(), 3);
    }

    #[tokio::test]
    async fn malformed_catalog_aborts_load() {
        let mut h = harness(r#"{"providers": []}"#, all_feeds());

        assert!(matches!(
            h.loader.load_all(false).await,
            Err(CatalogError::Json(_))
        ));
        assert!(h.fetcher.requests().is_empty());
        assert!(drain(&mut h.rx).is_empty());
    }

    #[tokio::test]
    async fn missing_catalog_aborts_load() {
        let dir = tempdir().unwrap();
        let loader = FeedLoader::new(
            CatalogSource::Path(dir.path().join("bikesproviders.json")),
            Arc::new(ParserRegistry::with_builtin_parsers()),
            Arc::new(all_feeds()),
            Arc::new(FileCache::new(dir.path())),
            EventSink::disconnected(),
        );

        assert!(matches!(
            loader.load_all(false).await,
            Err(CatalogError::Io { .. })
        ));
    }
}
