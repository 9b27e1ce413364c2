//! HTTP route handlers.

use askama::Template;
use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{delete, get},
};
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::domain::{Bus, BusId, NewBus, Route, RouteId, RouteStop, Stop, StopId};
use crate::planner::Planner;
use crate::store::StoreError;

use super::dto::*;
use super::state::AppState;
use super::templates::SearchResultsTemplate;

const DEFAULT_STOP_LIMIT: usize = 10;
const MAX_STOP_LIMIT: usize = 50;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/search", get(search))
        .route("/api/stops/search", get(search_stops))
        .route("/api/stops", get(list_stops).post(create_stop))
        .route("/api/stops/:id", delete(delete_stop))
        .route("/api/routes", get(list_routes).post(create_route))
        .route("/api/routes/:id", delete(delete_route))
        .route(
            "/api/route_stops",
            get(list_route_stops).post(create_route_stops),
        )
        .route(
            "/api/route_stops/:route_id/:stop_id",
            delete(delete_route_stop),
        )
        .route("/api/bus", get(list_buses).post(create_bus))
        .route("/api/bus/:id", delete(delete_bus))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Check if request accepts HTML.
fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// Parse a JSON body, logging it when it does not fit.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(body), "rejected request body");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })
}

fn parse_stop_id(raw: &str) -> Result<StopId, AppError> {
    StopId::parse(raw).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })
}

/// Rebuild the snapshot after a committed write.
///
/// The write itself has succeeded, so a failed reload is logged and the
/// previous snapshot stays in use until the next write.
async fn reload_after_write(state: &AppState) {
    if let Err(e) = state.reload().await {
        warn!(error = %e, "snapshot reload after write failed");
    }
}

/// Find buses from one stop to another.
async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(req): Query<SearchRequest>,
) -> Result<Response, AppError> {
    let from = parse_stop_id(&req.from)?;
    let to = parse_stop_id(&req.to)?;

    let snapshot = state.snapshot().await;
    let result = Planner::new(&snapshot, &state.config).search(from, to);

    if accepts_html(&headers) {
        let template = SearchResultsTemplate::new(from, to, &result, &snapshot);
        let html = template.render().map_err(|e| AppError::Internal {
            message: format!("Template error: {e}"),
        })?;
        Ok(Html(html).into_response())
    } else {
        Ok(Json(SearchResponse::from_result(from, to, &result, &snapshot)).into_response())
    }
}

/// Search stops by name for the stop picker.
async fn search_stops(
    State(state): State<AppState>,
    Query(req): Query<StopSearchRequest>,
) -> Json<StopSearchResponse> {
    let limit = req.limit.unwrap_or(DEFAULT_STOP_LIMIT).min(MAX_STOP_LIMIT);
    let snapshot = state.snapshot().await;

    let stops = snapshot
        .search_stops(&req.q, limit)
        .into_iter()
        .cloned()
        .collect();

    Json(StopSearchResponse { stops })
}

async fn list_stops(State(state): State<AppState>) -> Result<Json<Vec<Stop>>, AppError> {
    Ok(Json(state.store.list_stops().await?))
}

async fn list_routes(State(state): State<AppState>) -> Result<Json<Vec<Route>>, AppError> {
    Ok(Json(state.store.list_routes().await?))
}

async fn list_route_stops(
    State(state): State<AppState>,
) -> Result<Json<Vec<RouteStop>>, AppError> {
    Ok(Json(state.store.list_route_stops().await?))
}

async fn list_buses(State(state): State<AppState>) -> Result<Json<Vec<Bus>>, AppError> {
    Ok(Json(state.store.list_buses().await?))
}

async fn create_stop(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let req: CreateStopRequest = parse_body(&body)?;
    let stop = state.store.create_stop(req.stop_name).await?;
    reload_after_write(&state).await;

    let body = StopCreatedResponse {
        message: "Stop added successfully",
        stop,
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn create_route(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let route: Route = parse_body(&body)?;
    let route = state.store.create_route(route).await?;
    reload_after_write(&state).await;

    let body = RouteCreatedResponse {
        message: "Route added successfully",
        route,
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn create_route_stops(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let rows: Vec<RouteStop> = parse_body(&body)?;
    let inserted_count = state.store.create_route_stops(rows).await?;
    reload_after_write(&state).await;

    let body = RouteStopsCreatedResponse {
        message: "Route stops added successfully",
        inserted_count,
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn create_bus(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let bus: NewBus = parse_body(&body)?;
    let bus = state.store.create_bus(bus).await?;
    reload_after_write(&state).await;

    let body = BusCreatedResponse {
        message: "Bus added successfully",
        bus,
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn delete_stop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_stop_id(&id)?;
    state.store.delete_stop(id).await?;
    reload_after_write(&state).await;
    Ok(Json(MessageResponse {
        message: "Stop deleted successfully",
    }))
}

async fn delete_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = RouteId::parse(&id).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;
    state.store.delete_route(id).await?;
    reload_after_write(&state).await;
    Ok(Json(MessageResponse {
        message: "Route deleted successfully",
    }))
}

async fn delete_route_stop(
    State(state): State<AppState>,
    Path((route_id, stop_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    let route_id = RouteId::parse(&route_id).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;
    let stop_id = parse_stop_id(&stop_id)?;
    state.store.delete_route_stop(route_id, stop_id).await?;
    reload_after_write(&state).await;
    Ok(Json(MessageResponse {
        message: "Route stop deleted successfully",
    }))
}

async fn delete_bus(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = BusId::parse(&id).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;
    state.store.delete_bus(id).await?;
    reload_after_write(&state).await;
    Ok(Json(MessageResponse {
        message: "Bus deleted successfully",
    }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String },
    Unavailable { message: String },
    Internal { message: String },
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_message(self) -> String {
        match self {
            AppError::BadRequest { message }
            | AppError::NotFound { message }
            | AppError::Conflict { message }
            | AppError::Unavailable { message }
            | AppError::Internal { message } => message,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        let message = e.to_string();
        match e {
            StoreError::NotFound { .. } => AppError::NotFound { message },
            StoreError::Duplicate { .. } => AppError::Conflict { message },
            StoreError::Invalid { .. } => AppError::BadRequest { message },
            StoreError::Http(_) | StoreError::Api { .. } => AppError::Unavailable { message },
            StoreError::Json { .. } | StoreError::Storage { .. } => AppError::Internal { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.into_message();

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn html_negotiation() {
        let mut headers = HeaderMap::new();
        assert!(!accepts_html(&headers));

        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        assert!(accepts_html(&headers));

        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(!accepts_html(&headers));
    }

    #[test]
    fn store_errors_map_to_status() {
        let cases = [
            (StoreError::not_found("stop", 4), StatusCode::NOT_FOUND),
            (
                StoreError::Duplicate {
                    collection: "route",
                    key: "1".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (StoreError::invalid("bus", "empty name"), StatusCode::BAD_REQUEST),
            (
                StoreError::Api {
                    status: 500,
                    message: "down".to_string(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                StoreError::Storage {
                    message: "disk full".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn bad_ids_rejected() {
        assert!(parse_stop_id("12").is_ok());
        assert!(matches!(
            parse_stop_id("twelve"),
            Err(AppError::BadRequest { .. })
        ));
    }

    #[test]
    fn malformed_body_is_bad_request() {
        let body = Bytes::from_static(b"{\"stop_name\": 4");
        let err = parse_body::<CreateStopRequest>(&body).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
