//! Disk cache for whole timetable snapshots.
//!
//! A remote data service may be slow or briefly unreachable at startup.
//! The last good bulk load is kept in a JSON file and reused until it ages
//! past its TTL.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Collections;
use super::error::StoreError;

/// Default snapshot TTL: 24 hours.
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Serialize, Deserialize)]
struct CachedSnapshot {
    /// Unix timestamp when the file was written.
    cached_at_secs: u64,
    collections: Collections,
}

/// Configuration for the snapshot disk cache.
#[derive(Debug, Clone)]
pub struct SnapshotCacheConfig {
    pub path: PathBuf,
    pub ttl: Duration,
}

impl SnapshotCacheConfig {
    /// Cache at `path` with the default TTL (24 hours).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// JSON file holding the last fetched collections.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    config: SnapshotCacheConfig,
}

impl SnapshotCache {
    pub fn new(config: SnapshotCacheConfig) -> Self {
        Self { config }
    }

    /// Load cached collections.
    ///
    /// Returns `None` if the file is missing, unreadable or expired.
    pub fn load(&self) -> Option<Collections> {
        let contents = std::fs::read_to_string(&self.config.path).ok()?;
        let cached: CachedSnapshot = serde_json::from_str(&contents).ok()?;

        let age_secs = unix_now().ok()?.saturating_sub(cached.cached_at_secs);
        if age_secs >= self.config.ttl.as_secs() {
            debug!(path = %self.config.path.display(), age_secs, "snapshot cache expired");
            return None;
        }

        Some(cached.collections)
    }

    /// Write collections to the cache file, creating parent directories.
    pub fn save(&self, collections: &Collections) -> Result<(), StoreError> {
        let cached = CachedSnapshot {
            cached_at_secs: unix_now()?,
            collections: collections.clone(),
        };

        if let Some(parent) = self.config.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Storage {
                message: format!("failed to create cache directory: {e}"),
            })?;
        }

        let json = serde_json::to_string(&cached).map_err(|e| StoreError::Json {
            message: e.to_string(),
        })?;

        std::fs::write(&self.config.path, json).map_err(|e| StoreError::Storage {
            message: format!("failed to write snapshot cache: {e}"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }
}

fn unix_now() -> Result<u64, StoreError> {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| StoreError::Storage {
            message: "system time before unix epoch".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Stop, StopId};
    use tempfile::tempdir;

    fn sample() -> Collections {
        Collections {
            stops: vec![
                Stop {
                    id: StopId::new(1),
                    name: "Harbour".to_string(),
                },
                Stop {
                    id: StopId::new(2),
                    name: "Market".to_string(),
                },
            ],
            ..Collections::default()
        }
    }

    #[test]
    fn save_and_load() {
        let dir = tempdir().unwrap();
        let cache = SnapshotCache::new(SnapshotCacheConfig::new(dir.path().join("snap.json")));

        cache.save(&sample()).unwrap();

        assert_eq!(cache.load(), Some(sample()));
    }

    #[test]
    fn expired_cache_returns_none() {
        let dir = tempdir().unwrap();
        let config =
            SnapshotCacheConfig::new(dir.path().join("snap.json")).with_ttl(Duration::from_secs(0));
        let cache = SnapshotCache::new(config);

        cache.save(&sample()).unwrap();

        assert!(cache.load().is_none());
    }

    #[test]
    fn missing_or_corrupt_returns_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snap.json");
        let cache = SnapshotCache::new(SnapshotCacheConfig::new(&path));
        assert!(cache.load().is_none());

        std::fs::write(&path, "{not json").unwrap();
        assert!(cache.load().is_none());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("snap.json");
        let cache = SnapshotCache::new(SnapshotCacheConfig::new(&path));

        cache.save(&Collections::default()).unwrap();

        assert!(path.exists());
        assert_eq!(cache.path(), path.as_path());
    }
}
