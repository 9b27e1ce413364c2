//! Application state for the web layer.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::planner::SearchConfig;
use crate::snapshot::{Snapshot, SnapshotError};
use crate::store::{DataStore, SnapshotCache};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Timetable store, read by the admin API and written by it
    pub store: Arc<dyn DataStore>,

    /// Current snapshot; replaced whole after every write
    snapshot: Arc<RwLock<Arc<Snapshot>>>,

    /// Route planner configuration
    pub config: Arc<SearchConfig>,

    /// Where fresh snapshots are persisted, if anywhere
    snapshot_cache: Option<Arc<SnapshotCache>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DataStore>,
        snapshot: Snapshot,
        config: SearchConfig,
        snapshot_cache: Option<SnapshotCache>,
    ) -> Self {
        Self {
            store,
            snapshot: Arc::new(RwLock::new(Arc::new(snapshot))),
            config: Arc::new(config),
            snapshot_cache: snapshot_cache.map(Arc::new),
        }
    }

    /// The snapshot searches should use right now.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().await.clone()
    }

    /// Reload all collections and swap in a new snapshot.
    ///
    /// Searches already holding the old snapshot finish against it.
    pub async fn reload(&self) -> Result<(), SnapshotError> {
        let fresh = Snapshot::refresh(self.store.as_ref(), self.snapshot_cache.as_deref()).await?;
        *self.snapshot.write().await = Arc::new(fresh);
        info!("timetable snapshot reloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDataStore;

    #[tokio::test]
    async fn reload_swaps_snapshot() {
        let store: Arc<dyn DataStore> = Arc::new(MemoryDataStore::default());
        let state = AppState::new(store.clone(), Snapshot::default(), SearchConfig::default(), None);

        let before = state.snapshot().await;
        store.create_stop("Harbour".to_string()).await.unwrap();
        state.reload().await.unwrap();
        let after = state.snapshot().await;

        assert!(before.collections().stops.is_empty());
        assert_eq!(after.collections().stops.len(), 1);
    }
}
