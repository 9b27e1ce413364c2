//! HTTP client for a remote timetable data service.
//!
//! Speaks the same JSON API that this crate's web layer serves under
//! `/api`, so one planner instance can read its timetable from another.

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::domain::{Bus, BusId, NewBus, Route, RouteId, RouteStop, Stop, StopId};

use super::DataStore;
use super::error::StoreError;

/// Default base URL for a locally running data service.
const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// Configuration for the HTTP data store.
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base URL, up to and including the `/api` prefix
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl HttpStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 30,
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[derive(Deserialize)]
struct StopCreated {
    stop: Stop,
}

#[derive(Deserialize)]
struct RouteCreated {
    route: Route,
}

#[derive(Deserialize)]
struct BusCreated {
    bus: Bus,
}

#[derive(Deserialize)]
struct RouteStopsCreated {
    inserted_count: usize,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Data store backed by a remote HTTP service.
#[derive(Debug, Clone)]
pub struct HttpDataStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDataStore {
    pub fn new(config: HttpStoreConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, StoreError> {
        let url = self.url(path);
        debug!(%url, "fetching collection");
        let response = self.http.get(&url).send().await?;
        parse_json(check_status(response).await?).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, StoreError> {
        let response = request.send().await?;
        parse_json(check_status(response).await?).await
    }

    async fn delete(
        &self,
        path: String,
        collection: &'static str,
        key: String,
    ) -> Result<(), StoreError> {
        let response = self.http.delete(self.url(&path)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound { collection, key });
        }
        check_status(response).await?;
        Ok(())
    }
}

/// Turn a non-success response into `StoreError::Api`.
async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| StoreError::Json {
        message: e.to_string(),
    })
}

impl DataStore for HttpDataStore {
    fn list_stops(&self) -> BoxFuture<'_, Result<Vec<Stop>, StoreError>> {
        self.get_json("stops").boxed()
    }

    fn list_routes(&self) -> BoxFuture<'_, Result<Vec<Route>, StoreError>> {
        self.get_json("routes").boxed()
    }

    fn list_route_stops(&self) -> BoxFuture<'_, Result<Vec<RouteStop>, StoreError>> {
        self.get_json("route_stops").boxed()
    }

    fn list_buses(&self) -> BoxFuture<'_, Result<Vec<Bus>, StoreError>> {
        self.get_json("bus").boxed()
    }

    fn create_stop(&self, name: String) -> BoxFuture<'_, Result<Stop, StoreError>> {
        async move {
            let request = self
                .http
                .post(self.url("stops"))
                .json(&json!({ "stop_name": name }));
            let created: StopCreated = self.send_json(request).await?;
            Ok(created.stop)
        }
        .boxed()
    }

    fn create_route(&self, route: Route) -> BoxFuture<'_, Result<Route, StoreError>> {
        async move {
            let request = self.http.post(self.url("routes")).json(&route);
            let created: RouteCreated = self.send_json(request).await?;
            Ok(created.route)
        }
        .boxed()
    }

    fn create_route_stops(
        &self,
        rows: Vec<RouteStop>,
    ) -> BoxFuture<'_, Result<usize, StoreError>> {
        async move {
            let request = self.http.post(self.url("route_stops")).json(&rows);
            let created: RouteStopsCreated = self.send_json(request).await?;
            Ok(created.inserted_count)
        }
        .boxed()
    }

    fn create_bus(&self, bus: NewBus) -> BoxFuture<'_, Result<Bus, StoreError>> {
        async move {
            let request = self.http.post(self.url("bus")).json(&bus);
            let created: BusCreated = self.send_json(request).await?;
            Ok(created.bus)
        }
        .boxed()
    }

    fn delete_stop(&self, id: StopId) -> BoxFuture<'_, Result<(), StoreError>> {
        self.delete(format!("stops/{id}"), "stop", id.to_string()).boxed()
    }

    fn delete_route(&self, id: RouteId) -> BoxFuture<'_, Result<(), StoreError>> {
        self.delete(format!("routes/{id}"), "route", id.to_string()).boxed()
    }

    fn delete_route_stop(
        &self,
        route_id: RouteId,
        stop_id: StopId,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        self.delete(
            format!("route_stops/{route_id}/{stop_id}"),
            "route stop",
            format!("{route_id}/{stop_id}"),
        )
        .boxed()
    }

    fn delete_bus(&self, id: BusId) -> BoxFuture<'_, Result<(), StoreError>> {
        self.delete(format!("bus/{id}"), "bus", id.to_string()).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = HttpStoreConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn config_with_timeout() {
        let config = HttpStoreConfig::new("http://data.local/api").with_timeout(5);
        assert_eq!(config.base_url, "http://data.local/api");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn urls_join_without_double_slash() {
        let store = HttpDataStore::new(HttpStoreConfig::new("http://data.local/api/")).unwrap();
        assert_eq!(store.url("route_stops"), "http://data.local/api/route_stops");
    }

    #[test]
    fn created_envelopes_parse() {
        let created: StopCreated = serde_json::from_str(
            r#"{"message":"Stop added successfully","stop":{"stop_id":5,"stop_name":"Quay"}}"#,
        )
        .unwrap();
        assert_eq!(created.stop.id, StopId::new(5));

        let created: RouteStopsCreated =
            serde_json::from_str(r#"{"message":"ok","inserted_count":3}"#).unwrap();
        assert_eq!(created.inserted_count, 3);
    }
}
