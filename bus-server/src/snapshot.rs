//! Immutable view of the timetable used by every search.
//!
//! A snapshot is built from one bulk load of all four collections and never
//! changes afterwards. The server swaps in a fresh snapshot after writes.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::domain::{Bus, RouteId, Stop, StopId};
use crate::planner::RouteGraph;
use crate::store::{Collections, DataStore, SnapshotCache, StoreError, fetch_collections};

/// Errors that can occur while loading a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Bulk load of the collections failed
    #[error("timetable data unavailable: {0}")]
    DataUnavailable(#[source] StoreError),
}

/// Loaded timetable plus the indexes searches need.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    collections: Collections,
    stops: HashMap<StopId, usize>,
    route_names: HashMap<RouteId, String>,
    buses_by_route: HashMap<RouteId, Vec<Bus>>,
    graph: RouteGraph,
}

impl Snapshot {
    /// Index a set of collections.
    pub fn new(collections: Collections) -> Self {
        let stops = collections
            .stops
            .iter()
            .enumerate()
            .map(|(idx, stop)| (stop.id, idx))
            .collect();

        let route_names = collections
            .routes
            .iter()
            .map(|route| (route.id, route.name.clone()))
            .collect();

        let mut buses_by_route: HashMap<RouteId, Vec<Bus>> = HashMap::new();
        for bus in &collections.buses {
            buses_by_route
                .entry(bus.route_id)
                .or_default()
                .push(bus.clone());
        }

        let graph = RouteGraph::build(&collections.route_stops);

        Self {
            collections,
            stops,
            route_names,
            buses_by_route,
            graph,
        }
    }

    /// Bulk-load all collections from a store.
    pub async fn fetch<S: DataStore + ?Sized>(store: &S) -> Result<Self, SnapshotError> {
        let collections = fetch_collections(store)
            .await
            .map_err(SnapshotError::DataUnavailable)?;
        let snapshot = Self::new(collections);
        info!(
            stops = snapshot.collections.stops.len(),
            routes = snapshot.graph.route_count(),
            buses = snapshot.collections.buses.len(),
            "loaded timetable snapshot"
        );
        Ok(snapshot)
    }

    /// Fetch from the store and, if given, persist to the disk cache.
    ///
    /// A failed cache write is logged and otherwise ignored.
    pub async fn refresh<S: DataStore + ?Sized>(
        store: &S,
        cache: Option<&SnapshotCache>,
    ) -> Result<Self, SnapshotError> {
        let snapshot = Self::fetch(store).await?;
        if let Some(cache) = cache
            && let Err(e) = cache.save(&snapshot.collections)
        {
            warn!(path = %cache.path().display(), error = %e, "failed to write snapshot cache");
        }
        Ok(snapshot)
    }

    /// Startup load: use the disk cache if it is fresh, otherwise refresh.
    pub async fn load<S: DataStore + ?Sized>(
        store: &S,
        cache: Option<&SnapshotCache>,
    ) -> Result<Self, SnapshotError> {
        if let Some(collections) = cache.and_then(SnapshotCache::load) {
            info!("using cached timetable snapshot");
            return Ok(Self::new(collections));
        }
        Self::refresh(store, cache).await
    }

    pub fn graph(&self) -> &RouteGraph {
        &self.graph
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    pub fn stop(&self, id: StopId) -> Option<&Stop> {
        self.stops.get(&id).map(|&idx| &self.collections.stops[idx])
    }

    pub fn route_name(&self, id: RouteId) -> Option<&str> {
        self.route_names.get(&id).map(String::as_str)
    }

    /// Buses scheduled on a route, in load order.
    pub fn buses_on_route(&self, route: RouteId) -> &[Bus] {
        self.buses_by_route
            .get(&route)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Stops whose name contains `query`, ignoring case, sorted by name.
    ///
    /// An empty query matches every stop.
    pub fn search_stops(&self, query: &str, limit: usize) -> Vec<&Stop> {
        let needle = query.trim().to_lowercase();
        let mut matches: Vec<&Stop> = self
            .collections
            .stops
            .iter()
            .filter(|stop| stop.name.to_lowercase().contains(&needle))
            .collect();

        matches.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        matches.truncate(limit);
        matches
    }
}
