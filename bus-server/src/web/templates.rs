//! Askama templates for HTML search results.

use askama::Template;

use crate::domain::StopId;
use crate::planner::{SearchResult, TripResult};
use crate::snapshot::Snapshot;

use super::dto::NO_RESULTS_MESSAGE;

/// Search results fragment, swapped into the page by the frontend.
#[derive(Template)]
#[template(path = "search_results.html")]
pub struct SearchResultsTemplate {
    pub from_name: String,
    pub to_name: String,
    pub direct: Vec<TripView>,
    pub connected: Vec<TripView>,
    pub total_time: Option<u32>,
    pub no_results_message: &'static str,
}

impl SearchResultsTemplate {
    pub fn new(from: StopId, to: StopId, result: &SearchResult, snapshot: &Snapshot) -> Self {
        let views = |trips: &[TripResult]| -> Vec<TripView> {
            trips
                .iter()
                .map(|t| TripView::from_trip(t, snapshot))
                .collect()
        };

        Self {
            from_name: stop_label(snapshot, from),
            to_name: stop_label(snapshot, to),
            direct: views(&result.direct),
            connected: views(&result.connected),
            total_time: result.total_time,
            no_results_message: NO_RESULTS_MESSAGE,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.connected.is_empty()
    }
}

/// Trip view model for templates.
#[derive(Debug, Clone)]
pub struct TripView {
    pub bus_name: String,
    pub route_name: String,
    pub direction: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub board_stop: String,
    pub alight_stop: String,
    pub arrival_known: bool,
}

impl TripView {
    pub fn from_trip(trip: &TripResult, snapshot: &Snapshot) -> Self {
        Self {
            bus_name: trip.bus.name.clone(),
            route_name: trip.route_name.clone(),
            direction: trip.bus.direction.to_string(),
            departure_time: trip.departure_time.to_string(),
            arrival_time: trip.arrival_time.to_string(),
            board_stop: stop_label(snapshot, trip.board_stop),
            alight_stop: stop_label(snapshot, trip.alight_stop),
            arrival_known: trip.arrival_time.is_available(),
        }
    }
}

/// Stop name, or its id when the stop is not loaded.
fn stop_label(snapshot: &Snapshot, id: StopId) -> String {
    snapshot
        .stop(id)
        .map_or_else(|| format!("Stop {id}"), |s| s.name.clone())
}
