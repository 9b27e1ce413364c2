//! Server configuration from environment variables.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;

use crate::planner::SearchConfig;
use crate::store::{CacheConfig, SnapshotCacheConfig};

pub const BIND_ADDR_VAR: &str = "BUS_BIND_ADDR";
pub const DATA_FILE_VAR: &str = "BUS_DATA_FILE";
pub const DATA_URL_VAR: &str = "BUS_DATA_URL";
pub const STORE_CACHE_TTL_VAR: &str = "BUS_STORE_CACHE_TTL_SECS";
pub const SNAPSHOT_CACHE_VAR: &str = "BUS_SNAPSHOT_CACHE";
pub const SNAPSHOT_CACHE_TTL_VAR: &str = "BUS_SNAPSHOT_CACHE_TTL_SECS";
pub const COUNT_LEAD_IN_VAR: &str = "BUS_COUNT_LEAD_IN";

const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 3000));

/// A malformed configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Where timetable data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// A remote data service, by base URL.
    Remote(String),
    /// In-process store seeded from and saved to a JSON file.
    File(PathBuf),
    /// In-process store that starts empty and is never saved.
    Memory,
}

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_source: DataSource,
    pub store_cache: CacheConfig,
    pub snapshot_cache: Option<SnapshotCacheConfig>,
    pub search: SearchConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`. Unset and blank variables take
    /// their defaults.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_var(BIND_ADDR_VAR, get(BIND_ADDR_VAR), |s| {
            s.parse::<SocketAddr>()
        })?
        .unwrap_or(DEFAULT_BIND_ADDR);

        // A remote service wins over a local file.
        let data_source = match (get(DATA_URL_VAR), get(DATA_FILE_VAR)) {
            (Some(url), _) => DataSource::Remote(url),
            (None, Some(path)) => DataSource::File(PathBuf::from(path)),
            (None, None) => DataSource::Memory,
        };

        let mut store_cache = CacheConfig::default();
        if let Some(secs) = parse_var(STORE_CACHE_TTL_VAR, get(STORE_CACHE_TTL_VAR), |s| {
            s.parse::<u64>()
        })? {
            store_cache.ttl = Duration::from_secs(secs);
        }

        let snapshot_ttl = parse_var(SNAPSHOT_CACHE_TTL_VAR, get(SNAPSHOT_CACHE_TTL_VAR), |s| {
            s.parse::<u64>()
        })?;
        let snapshot_cache = get(SNAPSHOT_CACHE_VAR).map(|path| {
            let config = SnapshotCacheConfig::new(path);
            match snapshot_ttl {
                Some(secs) => config.with_ttl(Duration::from_secs(secs)),
                None => config,
            }
        });

        let count_lead_in =
            parse_var(COUNT_LEAD_IN_VAR, get(COUNT_LEAD_IN_VAR), parse_bool)?.unwrap_or(false);

        Ok(Self {
            bind_addr,
            data_source,
            store_cache,
            snapshot_cache,
            search: SearchConfig::new(count_lead_in),
        })
    }
}

fn parse_var<T, E: ToString>(
    var: &'static str,
    value: Option<String>,
    parser: impl Fn(&str) -> Result<T, E>,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            parser(v.trim()).map_err(|e| ConfigError {
                var,
                reason: e.to_string(),
                value: v,
            })
        })
        .transpose()
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err("expected true or false".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.data_source, DataSource::Memory);
        assert_eq!(config.store_cache.ttl, Duration::from_secs(60));
        assert!(config.snapshot_cache.is_none());
        assert!(!config.search.count_lead_in);
    }

    #[test]
    fn remote_url_wins_over_file() {
        let config = load(&[
            (DATA_URL_VAR, "http://data.local/api"),
            (DATA_FILE_VAR, "data.json"),
        ])
        .unwrap();
        assert_eq!(
            config.data_source,
            DataSource::Remote("http://data.local/api".to_string())
        );

        let config = load(&[(DATA_FILE_VAR, "data.json")]).unwrap();
        assert_eq!(config.data_source, DataSource::File(PathBuf::from("data.json")));
    }

    #[test]
    fn cache_and_search_settings() {
        let config = load(&[
            (BIND_ADDR_VAR, "0.0.0.0:8080"),
            (STORE_CACHE_TTL_VAR, "5"),
            (SNAPSHOT_CACHE_VAR, "/tmp/snap.json"),
            (SNAPSHOT_CACHE_TTL_VAR, "120"),
            (COUNT_LEAD_IN_VAR, "TRUE"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.store_cache.ttl, Duration::from_secs(5));
        let snapshot = config.snapshot_cache.unwrap();
        assert_eq!(snapshot.path, PathBuf::from("/tmp/snap.json"));
        assert_eq!(snapshot.ttl, Duration::from_secs(120));
        assert!(config.search.count_lead_in);
    }

    #[test]
    fn blank_values_use_defaults() {
        let config = load(&[(BIND_ADDR_VAR, "  "), (DATA_URL_VAR, "")]).unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.data_source, DataSource::Memory);
    }

    #[test]
    fn malformed_values_rejected() {
        let err = load(&[(STORE_CACHE_TTL_VAR, "soon")]).unwrap_err();
        assert_eq!(err.var, STORE_CACHE_TTL_VAR);
        assert_eq!(err.value, "soon");

        let err = load(&[(COUNT_LEAD_IN_VAR, "maybe")]).unwrap_err();
        assert_eq!(err.var, COUNT_LEAD_IN_VAR);

        assert!(load(&[(BIND_ADDR_VAR, "localhost")]).is_err());
    }
}
