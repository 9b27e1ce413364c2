//! Read cache in front of a data store.
//!
//! A remote store answers every bulk load with four round-trips. Collections
//! are cached for a short TTL; any write through this wrapper invalidates
//! the collection it touched so the next load sees it.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::domain::{Bus, BusId, NewBus, Route, RouteId, RouteStop, Stop, StopId};

use super::DataStore;
use super::error::StoreError;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached collections.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
        }
    }
}

/// Cache key: which collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Collection {
    Stops,
    Routes,
    RouteStops,
    Buses,
}

/// Cached collection contents.
#[derive(Debug, Clone)]
enum Entry {
    Stops(Arc<Vec<Stop>>),
    Routes(Arc<Vec<Route>>),
    RouteStops(Arc<Vec<RouteStop>>),
    Buses(Arc<Vec<Bus>>),
}

/// Data store wrapper that caches collection reads.
pub struct CachedDataStore<S> {
    inner: S,
    cache: MokaCache<Collection, Entry>,
}

impl<S: DataStore> CachedDataStore<S> {
    pub fn new(inner: S, config: &CacheConfig) -> Self {
        let cache = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(4)
            .build();

        Self { inner, cache }
    }

    /// Access the underlying store, bypassing the cache.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop all cached collections.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    async fn cached<'a, T: Clone>(
        &'a self,
        key: Collection,
        unwrap: fn(Entry) -> Option<Arc<Vec<T>>>,
        wrap: fn(Arc<Vec<T>>) -> Entry,
        fetch: impl FnOnce(&'a S) -> BoxFuture<'a, Result<Vec<T>, StoreError>>,
    ) -> Result<Vec<T>, StoreError> {
        if let Some(hit) = self.cache.get(&key).await.and_then(unwrap) {
            trace!(collection = ?key, "cache hit");
            return Ok(hit.as_ref().clone());
        }

        let fresh = fetch(&self.inner).await?;
        self.cache.insert(key, wrap(Arc::new(fresh.clone()))).await;
        Ok(fresh)
    }

    async fn invalidating<T>(
        &self,
        key: Collection,
        write: BoxFuture<'_, Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        let result = write.await;
        // Invalidate even on failure: a failed remote write may have partly applied.
        self.cache.invalidate(&key).await;
        result
    }
}

impl<S: DataStore> DataStore for CachedDataStore<S> {
    fn list_stops(&self) -> BoxFuture<'_, Result<Vec<Stop>, StoreError>> {
        self.cached(
            Collection::Stops,
            |e| match e {
                Entry::Stops(v) => Some(v),
                _ => None,
            },
            Entry::Stops,
            |inner| inner.list_stops(),
        )
        .boxed()
    }

    fn list_routes(&self) -> BoxFuture<'_, Result<Vec<Route>, StoreError>> {
        self.cached(
            Collection::Routes,
            |e| match e {
                Entry::Routes(v) => Some(v),
                _ => None,
            },
            Entry::Routes,
            |inner| inner.list_routes(),
        )
        .boxed()
    }

    fn list_route_stops(&self) -> BoxFuture<'_, Result<Vec<RouteStop>, StoreError>> {
        self.cached(
            Collection::RouteStops,
            |e| match e {
                Entry::RouteStops(v) => Some(v),
                _ => None,
            },
            Entry::RouteStops,
            |inner| inner.list_route_stops(),
        )
        .boxed()
    }

    fn list_buses(&self) -> BoxFuture<'_, Result<Vec<Bus>, StoreError>> {
        self.cached(
            Collection::Buses,
            |e| match e {
                Entry::Buses(v) => Some(v),
                _ => None,
            },
            Entry::Buses,
            |inner| inner.list_buses(),
        )
        .boxed()
    }

    fn create_stop(&self, name: String) -> BoxFuture<'_, Result<Stop, StoreError>> {
        self.invalidating(Collection::Stops, self.inner.create_stop(name))
            .boxed()
    }

    fn create_route(&self, route: Route) -> BoxFuture<'_, Result<Route, StoreError>> {
        self.invalidating(Collection::Routes, self.inner.create_route(route))
            .boxed()
    }

    fn create_route_stops(
        &self,
        rows: Vec<RouteStop>,
    ) -> BoxFuture<'_, Result<usize, StoreError>> {
        self.invalidating(Collection::RouteStops, self.inner.create_route_stops(rows))
            .boxed()
    }

    fn create_bus(&self, bus: NewBus) -> BoxFuture<'_, Result<Bus, StoreError>> {
        self.invalidating(Collection::Buses, self.inner.create_bus(bus))
            .boxed()
    }

    fn delete_stop(&self, id: StopId) -> BoxFuture<'_, Result<(), StoreError>> {
        self.invalidating(Collection::Stops, self.inner.delete_stop(id))
            .boxed()
    }

    fn delete_route(&self, id: RouteId) -> BoxFuture<'_, Result<(), StoreError>> {
        self.invalidating(Collection::Routes, self.inner.delete_route(id))
            .boxed()
    }

    fn delete_route_stop(
        &self,
        route_id: RouteId,
        stop_id: StopId,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        self.invalidating(
            Collection::RouteStops,
            self.inner.delete_route_stop(route_id, stop_id),
        )
        .boxed()
    }

    fn delete_bus(&self, id: BusId) -> BoxFuture<'_, Result<(), StoreError>> {
        self.invalidating(Collection::Buses, self.inner.delete_bus(id))
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDataStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that counts collection reads.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryDataStore,
        reads: AtomicUsize,
    }

    impl DataStore for CountingStore {
        fn list_stops(&self) -> BoxFuture<'_, Result<Vec<Stop>, StoreError>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.list_stops()
        }
        fn list_routes(&self) -> BoxFuture<'_, Result<Vec<Route>, StoreError>> {
            self.inner.list_routes()
        }
        fn list_route_stops(&self) -> BoxFuture<'_, Result<Vec<RouteStop>, StoreError>> {
            self.inner.list_route_stops()
        }
        fn list_buses(&self) -> BoxFuture<'_, Result<Vec<Bus>, StoreError>> {
            self.inner.list_buses()
        }
        fn create_stop(&self, name: String) -> BoxFuture<'_, Result<Stop, StoreError>> {
            self.inner.create_stop(name)
        }
        fn create_route(&self, route: Route) -> BoxFuture<'_, Result<Route, StoreError>> {
            self.inner.create_route(route)
        }
        fn create_route_stops(
            &self,
            rows: Vec<RouteStop>,
        ) -> BoxFuture<'_, Result<usize, StoreError>> {
            self.inner.create_route_stops(rows)
        }
        fn create_bus(&self, bus: NewBus) -> BoxFuture<'_, Result<Bus, StoreError>> {
            self.inner.create_bus(bus)
        }
        fn delete_stop(&self, id: StopId) -> BoxFuture<'_, Result<(), StoreError>> {
            self.inner.delete_stop(id)
        }
        fn delete_route(&self, id: RouteId) -> BoxFuture<'_, Result<(), StoreError>> {
            self.inner.delete_route(id)
        }
        fn delete_route_stop(
            &self,
            route_id: RouteId,
            stop_id: StopId,
        ) -> BoxFuture<'_, Result<(), StoreError>> {
            self.inner.delete_route_stop(route_id, stop_id)
        }
        fn delete_bus(&self, id: BusId) -> BoxFuture<'_, Result<(), StoreError>> {
            self.inner.delete_bus(id)
        }
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn repeated_reads_hit_cache() {
        let store = CachedDataStore::new(CountingStore::default(), &CacheConfig::default());

        store.list_stops().await.unwrap();
        store.list_stops().await.unwrap();
        store.list_stops().await.unwrap();

        assert_eq!(store.inner().reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn write_invalidates_collection() {
        let store = CachedDataStore::new(CountingStore::default(), &CacheConfig::default());

        assert!(store.list_stops().await.unwrap().is_empty());
        store.create_stop("Harbour".into()).await.unwrap();

        let stops = store.list_stops().await.unwrap();
        assert_eq!(stops.len(), 1);
        assert_eq!(store.inner().reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_all_forces_refetch() {
        let store = CachedDataStore::new(CountingStore::default(), &CacheConfig::default());

        store.list_stops().await.unwrap();
        store.invalidate_all();
        store.list_stops().await.unwrap();

        assert_eq!(store.inner().reads.load(Ordering::SeqCst), 2);
    }
}
