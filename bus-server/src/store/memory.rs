//! In-process data store, optionally backed by a JSON file.

use std::path::{Path, PathBuf};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{Bus, BusId, NewBus, Route, RouteId, RouteStop, Stop, StopId};

use super::error::StoreError;
use super::{Collections, DataStore};

/// Timetable collections held in memory.
///
/// When opened from a file, every successful write is saved back to it
/// before it becomes visible to readers.
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    data: RwLock<Collections>,
    path: Option<PathBuf>,
}

impl MemoryDataStore {
    /// Create a store holding the given collections, without a backing file.
    pub fn new(collections: Collections) -> Self {
        Self {
            data: RwLock::new(collections),
            path: None,
        }
    }

    /// Open a file-backed store.
    ///
    /// A missing file starts an empty store which is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let collections = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| StoreError::Storage {
                message: format!("failed to read {}: {}", path.display(), e),
            })?;
            serde_json::from_str(&contents).map_err(|e| StoreError::Json {
                message: format!("{}: {}", path.display(), e),
            })?
        } else {
            Collections::default()
        };

        Ok(Self {
            data: RwLock::new(collections),
            path: Some(path),
        })
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Apply a write to a copy of the data, persist it, then publish it.
    async fn mutate<T>(
        &self,
        op: impl FnOnce(&mut Collections) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.data.write().await;
        let mut next = guard.clone();
        let result = op(&mut next)?;

        if let Some(path) = &self.path {
            save(path, &next)?;
        }

        *guard = next;
        Ok(result)
    }
}

fn save(path: &Path, collections: &Collections) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::Storage {
            message: format!("failed to create data directory: {}", e),
        })?;
    }

    let json = serde_json::to_string_pretty(collections).map_err(|e| StoreError::Storage {
        message: format!("failed to serialize data: {}", e),
    })?;

    std::fs::write(path, json).map_err(|e| StoreError::Storage {
        message: format!("failed to write {}: {}", path.display(), e),
    })?;

    debug!(path = %path.display(), "saved data file");
    Ok(())
}

fn require_name(collection: &'static str, name: &str) -> Result<String, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::invalid(collection, "name must not be empty"));
    }
    Ok(trimmed.to_string())
}

impl DataStore for MemoryDataStore {
    fn list_stops(&self) -> BoxFuture<'_, Result<Vec<Stop>, StoreError>> {
        async move { Ok(self.data.read().await.stops.clone()) }.boxed()
    }

    fn list_routes(&self) -> BoxFuture<'_, Result<Vec<Route>, StoreError>> {
        async move { Ok(self.data.read().await.routes.clone()) }.boxed()
    }

    fn list_route_stops(&self) -> BoxFuture<'_, Result<Vec<RouteStop>, StoreError>> {
        async move { Ok(self.data.read().await.route_stops.clone()) }.boxed()
    }

    fn list_buses(&self) -> BoxFuture<'_, Result<Vec<Bus>, StoreError>> {
        async move { Ok(self.data.read().await.buses.clone()) }.boxed()
    }

    fn create_stop(&self, name: String) -> BoxFuture<'_, Result<Stop, StoreError>> {
        async move {
            let name = require_name("stop", &name)?;
            self.mutate(|data| {
                let next = data
                    .stops
                    .iter()
                    .map(|s| s.id.get().saturating_add(1))
                    .max()
                    .unwrap_or(1);
                let stop = Stop {
                    id: StopId::new(next),
                    name,
                };
                data.stops.push(stop.clone());
                Ok(stop)
            })
            .await
        }
        .boxed()
    }

    fn create_route(&self, route: Route) -> BoxFuture<'_, Result<Route, StoreError>> {
        async move {
            let name = require_name("route", &route.name)?;
            self.mutate(|data| {
                if data.routes.iter().any(|r| r.id == route.id) {
                    return Err(StoreError::Duplicate {
                        collection: "route",
                        key: route.id.to_string(),
                    });
                }
                let route = Route { id: route.id, name };
                data.routes.push(route.clone());
                Ok(route)
            })
            .await
        }
        .boxed()
    }

    fn create_route_stops(
        &self,
        rows: Vec<RouteStop>,
    ) -> BoxFuture<'_, Result<usize, StoreError>> {
        async move {
            if rows.is_empty() {
                return Err(StoreError::invalid(
                    "route stop",
                    "at least one route stop is required",
                ));
            }
            if let Some(bad) = rows.iter().find(|r| r.order == 0) {
                return Err(StoreError::invalid(
                    "route stop",
                    format!(
                        "stop_order must be at least 1 (route {}, stop {})",
                        bad.route_id, bad.stop_id
                    ),
                ));
            }

            self.mutate(|data| {
                let mut inserted = 0;
                for row in rows {
                    let exists = data
                        .route_stops
                        .iter()
                        .any(|r| r.route_id == row.route_id && r.stop_id == row.stop_id);
                    if !exists {
                        data.route_stops.push(row);
                        inserted += 1;
                    }
                }
                Ok(inserted)
            })
            .await
        }
        .boxed()
    }

    fn create_bus(&self, bus: NewBus) -> BoxFuture<'_, Result<Bus, StoreError>> {
        async move {
            let name = require_name("bus", &bus.name)?;
            self.mutate(|data| {
                let next = data
                    .buses
                    .iter()
                    .map(|b| b.id.get().saturating_add(1))
                    .max()
                    .unwrap_or(1);
                let bus = NewBus { name, ..bus }.with_id(BusId::new(next));
                data.buses.push(bus.clone());
                Ok(bus)
            })
            .await
        }
        .boxed()
    }

    fn delete_stop(&self, id: StopId) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            self.mutate(|data| {
                let before = data.stops.len();
                data.stops.retain(|s| s.id != id);
                if data.stops.len() == before {
                    return Err(StoreError::not_found("stop", id));
                }
                Ok(())
            })
            .await
        }
        .boxed()
    }

    fn delete_route(&self, id: RouteId) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            self.mutate(|data| {
                let before = data.routes.len();
                data.routes.retain(|r| r.id != id);
                if data.routes.len() == before {
                    return Err(StoreError::not_found("route", id));
                }
                Ok(())
            })
            .await
        }
        .boxed()
    }

    fn delete_route_stop(
        &self,
        route_id: RouteId,
        stop_id: StopId,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            self.mutate(|data| {
                let before = data.route_stops.len();
                data.route_stops
                    .retain(|r| !(r.route_id == route_id && r.stop_id == stop_id));
                if data.route_stops.len() == before {
                    return Err(StoreError::not_found(
                        "route stop",
                        format!("{}/{}", route_id, stop_id),
                    ));
                }
                Ok(())
            })
            .await
        }
        .boxed()
    }

    fn delete_bus(&self, id: BusId) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            self.mutate(|data| {
                let before = data.buses.len();
                data.buses.retain(|b| b.id != id);
                if data.buses.len() == before {
                    return Err(StoreError::not_found("bus", id));
                }
                Ok(())
            })
            .await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClockTime, Direction};
    use crate::store::fetch_collections;
    use tempfile::tempdir;

    fn new_bus(route: u32, name: &str) -> NewBus {
        NewBus {
            route_id: RouteId::new(route),
            name: name.to_string(),
            departure_time: ClockTime::parse_hhmm("07:00").unwrap(),
            direction: Direction::Direct,
        }
    }

    fn rs(route: u32, stop: u32, order: u32) -> RouteStop {
        RouteStop::new(RouteId::new(route), StopId::new(stop), order, Some(5))
    }

    #[tokio::test]
    async fn stop_ids_increment_from_max() {
        let store = MemoryDataStore::default();
        let a = store.create_stop("Alpha".into()).await.unwrap();
        let b = store.create_stop("  Beta ".into()).await.unwrap();
        assert_eq!(a.id, StopId::new(1));
        assert_eq!(b.id, StopId::new(2));
        assert_eq!(b.name, "Beta");

        store.delete_stop(a.id).await.unwrap();
        let c = store.create_stop("Gamma".into()).await.unwrap();
        assert_eq!(c.id, StopId::new(3));
    }

    #[tokio::test]
    async fn empty_names_rejected() {
        let store = MemoryDataStore::default();
        assert!(matches!(
            store.create_stop("   ".into()).await,
            Err(StoreError::Invalid { .. })
        ));
        assert!(matches!(
            store.create_bus(new_bus(1, "")).await,
            Err(StoreError::Invalid { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_route_rejected() {
        let store = MemoryDataStore::default();
        let route = Route {
            id: RouteId::new(10),
            name: "Ring".into(),
        };
        store.create_route(route.clone()).await.unwrap();
        let err = store.create_route(route).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn route_stops_skip_duplicates() {
        let store = MemoryDataStore::default();
        let inserted = store
            .create_route_stops(vec![rs(1, 1, 1), rs(1, 2, 2), rs(1, 1, 3)])
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        let inserted = store
            .create_route_stops(vec![rs(1, 2, 2), rs(1, 3, 3)])
            .await
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(store.list_route_stops().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn route_stops_validation() {
        let store = MemoryDataStore::default();
        assert!(store.create_route_stops(vec![]).await.is_err());
        assert!(store.create_route_stops(vec![rs(1, 1, 0)]).await.is_err());
        assert!(store.list_route_stops().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deletes_report_missing() {
        let store = MemoryDataStore::default();
        assert!(matches!(
            store.delete_bus(BusId::new(1)).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete_route_stop(RouteId::new(1), StopId::new(1)).await,
            Err(StoreError::NotFound { .. })
        ));

        store.create_route_stops(vec![rs(1, 1, 1)]).await.unwrap();
        store
            .delete_route_stop(RouteId::new(1), StopId::new(1))
            .await
            .unwrap();
        assert!(store.list_route_stops().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_backed_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");

        let store = MemoryDataStore::open(&path).unwrap();
        store.create_stop("Depot".into()).await.unwrap();
        store.create_bus(new_bus(4, "4A")).await.unwrap();
        assert!(path.exists());

        let reopened = MemoryDataStore::open(&path).unwrap();
        let data = fetch_collections(&reopened).await.unwrap();
        assert_eq!(data.stops.len(), 1);
        assert_eq!(data.buses.len(), 1);
        assert_eq!(data.buses[0].name, "4A");
    }

    #[test]
    fn open_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            MemoryDataStore::open(&path),
            Err(StoreError::Json { .. })
        ));
    }

    #[test]
    fn open_rejects_order_zero_in_seed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(
            &path,
            r#"{"route_stops":[{"route_id":1,"stop_id":1,"stop_order":0,"time_to_next":5}]}"#,
        )
        .unwrap();

        let Err(StoreError::Json { message }) = MemoryDataStore::open(&path) else {
            panic!("order 0 accepted from seed file");
        };
        assert!(message.contains("stop_order"));
    }
}
