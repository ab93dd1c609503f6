use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bike_feeds::catalog::CatalogSource;
use bike_feeds::events::{self, Event};
use bike_feeds::feed::FeedLoader;
use bike_feeds::parser::ParserRegistry;
use bike_feeds::stations::{StationLoader, StationsModel};
use bike_feeds::transport::{FileCache, HttpFetcher, HttpFetcherConfig};

/// Catalog used when `BIKE_FEEDS_CATALOG` is not set.
const DEFAULT_CATALOG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/bikesproviders.json");

/// Cache directory used when `BIKE_FEEDS_CACHE_DIR` is not set.
const DEFAULT_CACHE_DIR: &str = "bike-feeds-cache";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let catalog_path =
        std::env::var("BIKE_FEEDS_CATALOG").unwrap_or_else(|_| DEFAULT_CATALOG.to_string());
    let cache_dir =
        std::env::var("BIKE_FEEDS_CACHE_DIR").unwrap_or_else(|_| DEFAULT_CACHE_DIR.to_string());
    // Offline mode only reads feeds saved by an earlier run
    let offline = std::env::var("BIKE_FEEDS_OFFLINE").is_ok_and(|v| v == "1" || v == "true");
    // "<provider>/<city>", e.g. "Transpole/Lille"
    let selected_city = std::env::var("BIKE_FEEDS_CITY").ok();

    let fetcher = Arc::new(
        HttpFetcher::new(HttpFetcherConfig::default()).expect("Failed to create HTTP client"),
    );
    let cache = Arc::new(FileCache::new(PathBuf::from(cache_dir)));
    let registry = Arc::new(ParserRegistry::with_builtin_parsers());

    let (sink, mut rx) = events::channel();
    let logger = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            log_event(&event);
        }
    });

    let loader = FeedLoader::new(
        CatalogSource::Path(PathBuf::from(&catalog_path)),
        registry.clone(),
        fetcher.clone(),
        cache,
        sink.clone(),
    );
    let load = loader
        .load_all(offline)
        .await
        .expect("Failed to load provider catalog");
    info!(
        cities = load.cities.len(),
        failed = load.failures.len(),
        "cities loaded"
    );

    if let Some(selected) = selected_city {
        let Some((provider, name)) = selected.split_once('/') else {
            error!(city = %selected, "BIKE_FEEDS_CITY must look like <provider>/<city>");
            return;
        };
        match load.city(provider, name).cloned() {
            Some(city) => {
                match StationLoader::for_city(fetcher, &registry, &load.catalog, city, sink.clone())
                {
                    Ok(station_loader) => {
                        let model = StationsModel::new(sink.clone());
                        model.set_city(station_loader).await;
                        match model.load_all_stations_details().await {
                            Ok(count) => info!(
                                city = %name,
                                stations = count,
                                center = ?model.center().await,
                                copyright = ?model.copyright().await,
                                "stations loaded"
                            ),
                            Err(e) => error!(city = %name, error = %e, "failed to load stations"),
                        }
                    }
                    Err(e) => error!(city = %name, error = %e, "cannot load stations"),
                }
            }
            None => warn!(provider, city = %name, "city not found in loaded feeds"),
        }
    }

    // Close the channel so the logger drains and exits
    drop(loader);
    drop(sink);
    let _ = logger.await;
}

fn log_event(event: &Event) {
    match event {
        Event::CitiesAdded { provider, cities } => {
            info!(provider = %provider, cities = cities.len(), "cities added");
        }
        Event::ProviderFailed { provider, error } => {
            warn!(provider = %provider, error = %error, "provider failed");
        }
        Event::StationFailed {
            city,
            number,
            reason,
        } => {
            warn!(city = %city, station = ?number, reason = %reason, "station request failed");
        }
        Event::CenterChanged(center) => info!(center = ?center, "center changed"),
        other => tracing::debug!(event = ?other, "event"),
    }
}
