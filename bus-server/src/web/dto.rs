//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Bus, Direction, Route, RouteId, Stop, StopId};
use crate::planner::{SearchResult, TripResult};
use crate::snapshot::Snapshot;

/// Shown when a search finds neither direct nor connecting trips.
pub const NO_RESULTS_MESSAGE: &str = "No routes found. Please try different stops.";

/// Query for a stop-to-stop search. Ids stay text until validated.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub from: String,
    pub to: String,
}

/// Query for the stop picker.
#[derive(Debug, Deserialize)]
pub struct StopSearchRequest {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct StopSearchResponse {
    pub stops: Vec<Stop>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStopRequest {
    pub stop_name: String,
}

#[derive(Debug, Serialize)]
pub struct StopCreatedResponse {
    pub message: &'static str,
    pub stop: Stop,
}

#[derive(Debug, Serialize)]
pub struct RouteCreatedResponse {
    pub message: &'static str,
    pub route: Route,
}

#[derive(Debug, Serialize)]
pub struct RouteStopsCreatedResponse {
    pub message: &'static str,
    pub inserted_count: usize,
}

#[derive(Debug, Serialize)]
pub struct BusCreatedResponse {
    pub message: &'static str,
    pub bus: Bus,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// One trip in a search response.
#[derive(Debug, Serialize)]
pub struct TripResultDto {
    pub bus_id: u32,
    pub bus_name: String,
    pub route_id: RouteId,
    pub route_name: String,
    pub direction: Direction,
    /// "HH:MM"
    pub departure_time: String,
    /// "HH:MM", or "N/A" when it cannot be computed
    pub arrival_time: String,
    pub board_stop_id: StopId,
    pub board_stop_name: Option<String>,
    pub alight_stop_id: StopId,
    pub alight_stop_name: Option<String>,
}

impl TripResultDto {
    pub fn from_trip(trip: &TripResult, snapshot: &Snapshot) -> Self {
        let stop_name = |id| snapshot.stop(id).map(|s| s.name.clone());

        Self {
            bus_id: trip.bus.id.get(),
            bus_name: trip.bus.name.clone(),
            route_id: trip.bus.route_id,
            route_name: trip.route_name.clone(),
            direction: trip.bus.direction,
            departure_time: trip.departure_time.to_string(),
            arrival_time: trip.arrival_time.to_string(),
            board_stop_id: trip.board_stop,
            board_stop_name: stop_name(trip.board_stop),
            alight_stop_id: trip.alight_stop,
            alight_stop_name: stop_name(trip.alight_stop),
        }
    }
}

/// Response to a stop-to-stop search.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub from: StopId,
    pub to: StopId,
    pub direct: Vec<TripResultDto>,
    pub connected: Vec<TripResultDto>,
    pub route_ids: Vec<RouteId>,
    /// Minutes along the connecting path
    pub total_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl SearchResponse {
    pub fn from_result(
        from: StopId,
        to: StopId,
        result: &SearchResult,
        snapshot: &Snapshot,
    ) -> Self {
        let convert = |trips: &[TripResult]| -> Vec<TripResultDto> {
            trips
                .iter()
                .map(|t| TripResultDto::from_trip(t, snapshot))
                .collect()
        };

        Self {
            from,
            to,
            direct: convert(&result.direct),
            connected: convert(&result.connected),
            route_ids: result.route_ids.clone(),
            total_time: result.total_time,
            message: result.is_empty().then_some(NO_RESULTS_MESSAGE),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
