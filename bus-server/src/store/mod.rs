//! Timetable data stores.
//!
//! The planner reads four collections (stops, routes, route stops and
//! buses) in bulk. Where they come from is hidden behind [`DataStore`]:
//! an in-process store seeded from a JSON file, a remote data service
//! over HTTP, or either of those behind a read cache.

mod cached;
mod disk;
mod error;
mod http;
mod memory;

pub use cached::{CacheConfig, CachedDataStore};
pub use disk::{SnapshotCache, SnapshotCacheConfig};
pub use error::StoreError;
pub use http::{HttpDataStore, HttpStoreConfig};
pub use memory::MemoryDataStore;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::domain::{Bus, BusId, NewBus, Route, RouteId, RouteStop, Stop, StopId};

/// All four timetable collections, as fetched in one bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collections {
    #[serde(default)]
    pub stops: Vec<Stop>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub route_stops: Vec<RouteStop>,
    #[serde(default)]
    pub buses: Vec<Bus>,
}

/// Read and write access to the timetable collections.
///
/// Methods return boxed futures so stores can be shared as
/// `Arc<dyn DataStore>`.
pub trait DataStore: Send + Sync {
    fn list_stops(&self) -> BoxFuture<'_, Result<Vec<Stop>, StoreError>>;

    fn list_routes(&self) -> BoxFuture<'_, Result<Vec<Route>, StoreError>>;

    fn list_route_stops(&self) -> BoxFuture<'_, Result<Vec<RouteStop>, StoreError>>;

    fn list_buses(&self) -> BoxFuture<'_, Result<Vec<Bus>, StoreError>>;

    /// Add a stop; the store assigns the next free id.
    fn create_stop(&self, name: String) -> BoxFuture<'_, Result<Stop, StoreError>>;

    /// Add a route under a caller-chosen id.
    fn create_route(&self, route: Route) -> BoxFuture<'_, Result<Route, StoreError>>;

    /// Add route memberships, skipping any `(route_id, stop_id)` pair that
    /// already exists. Returns how many rows were inserted.
    fn create_route_stops(
        &self,
        rows: Vec<RouteStop>,
    ) -> BoxFuture<'_, Result<usize, StoreError>>;

    /// Add a bus; the store assigns the next free id.
    fn create_bus(&self, bus: NewBus) -> BoxFuture<'_, Result<Bus, StoreError>>;

    fn delete_stop(&self, id: StopId) -> BoxFuture<'_, Result<(), StoreError>>;

    fn delete_route(&self, id: RouteId) -> BoxFuture<'_, Result<(), StoreError>>;

    fn delete_route_stop(
        &self,
        route_id: RouteId,
        stop_id: StopId,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    fn delete_bus(&self, id: BusId) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// Fetch all four collections concurrently.
///
/// Fails as a whole if any single collection fails; partial data is never
/// returned.
pub async fn fetch_collections<S: DataStore + ?Sized>(
    store: &S,
) -> Result<Collections, StoreError> {
    let (stops, routes, route_stops, buses) = futures::try_join!(
        store.list_stops(),
        store.list_routes(),
        store.list_route_stops(),
        store.list_buses()
    )?;

    Ok(Collections {
        stops,
        routes,
        route_stops,
        buses,
    })
}
