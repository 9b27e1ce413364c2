use std::error::Error;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use bus_server::config::{AppConfig, DataSource};
use bus_server::snapshot::Snapshot;
use bus_server::store::{
    CachedDataStore, DataStore, HttpDataStore, HttpStoreConfig, MemoryDataStore, SnapshotCache,
};
use bus_server::web::{AppState, create_router};

const DEFAULT_LOG_FILTER: &str = "bus_server=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn DataStore> = match &config.data_source {
        DataSource::Remote(url) => {
            info!(%url, "using remote data service");
            let http = HttpDataStore::new(HttpStoreConfig::new(url.clone()))?;
            Arc::new(CachedDataStore::new(http, &config.store_cache))
        }
        DataSource::File(path) => {
            info!(path = %path.display(), "using local data file");
            Arc::new(MemoryDataStore::open(path)?)
        }
        DataSource::Memory => {
            info!("no data source configured; starting with an empty timetable");
            Arc::new(MemoryDataStore::default())
        }
    };

    let snapshot_cache = config.snapshot_cache.clone().map(SnapshotCache::new);

    // Fail fast: the planner is useless without a timetable.
    let snapshot = Snapshot::load(store.as_ref(), snapshot_cache.as_ref()).await?;

    let state = AppState::new(store, snapshot, config.search.clone(), snapshot_cache);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "bus route planner listening");
    info!("  GET  /health");
    info!("  GET  /api/search?from=&to=");
    info!("  GET  /api/stops/search?q=");
    info!("  GET|POST /api/stops, /api/routes, /api/route_stops, /api/bus");

    axum::serve(listener, app).await?;
    Ok(())
}
