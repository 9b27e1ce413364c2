//! Search entry point: direct trips first, connections as a fallback.

use tracing::debug;

use crate::domain::{Bus, ClockTime, RouteId, StopId};
use crate::snapshot::Snapshot;

use super::arrival::{Arrival, calculate_arrival};
use super::config::SearchConfig;
use super::connected::{ConnectedPath, find_connected};
use super::direct::find_direct;

/// Shown when a bus refers to a route that is not loaded.
pub const UNKNOWN_ROUTE_NAME: &str = "Unknown Route";

/// One bus ride offered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripResult {
    pub bus: Bus,
    pub route_name: String,
    /// The bus's scheduled departure.
    pub departure_time: ClockTime,
    pub arrival_time: Arrival,
    pub board_stop: StopId,
    pub alight_stop: StopId,
}

/// Result of a stop-to-stop search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub direct: Vec<TripResult>,
    /// Trips along the connecting path; only filled when there is no
    /// direct trip.
    pub connected: Vec<TripResult>,
    /// Route of each connecting leg, in path order.
    pub route_ids: Vec<RouteId>,
    /// Connecting path travel time; `None` when no connection search ran
    /// or none was found.
    pub total_time: Option<u32>,
}

impl SearchResult {
    /// True when neither a direct trip nor a connection was found.
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.connected.is_empty()
    }
}

/// Route planner over one snapshot.
pub struct Planner<'a> {
    snapshot: &'a Snapshot,
    config: &'a SearchConfig,
}

impl<'a> Planner<'a> {
    pub fn new(snapshot: &'a Snapshot, config: &'a SearchConfig) -> Self {
        Self { snapshot, config }
    }

    pub fn find_direct(&self, from: StopId, to: StopId) -> Vec<&'a Bus> {
        find_direct(self.snapshot, from, to)
    }

    pub fn find_connected(&self, from: StopId, to: StopId) -> ConnectedPath<'a> {
        find_connected(self.snapshot, from, to)
    }

    pub fn calculate_arrival(&self, bus: &Bus, from: StopId, to: StopId) -> Arrival {
        calculate_arrival(self.snapshot.graph(), bus, from, to, self.config)
    }

    /// Search for trips from `from` to `to`.
    ///
    /// Direct buses are returned when any exist. Otherwise the connection
    /// search runs and every bus on each leg's route is listed with its
    /// arrival at the end of that leg.
    pub fn search(&self, from: StopId, to: StopId) -> SearchResult {
        let direct: Vec<TripResult> = self
            .find_direct(from, to)
            .into_iter()
            .map(|bus| self.trip(bus, from, to))
            .collect();

        if !direct.is_empty() {
            debug!(%from, %to, trips = direct.len(), "direct trips found");
            return SearchResult {
                direct,
                ..SearchResult::default()
            };
        }

        let path = self.find_connected(from, to);
        let connected = self.connected_trips(&path);

        debug!(
            %from,
            %to,
            legs = path.legs.len(),
            trips = connected.len(),
            total_time = ?path.total_time,
            "connection search finished"
        );

        SearchResult {
            direct: Vec::new(),
            connected,
            route_ids: path.route_ids,
            total_time: path.total_time,
        }
    }

    /// One trip per bus per leg riding its route, in leg order.
    ///
    /// A route that appears on two legs lists its buses under both.
    fn connected_trips(&self, path: &ConnectedPath<'_>) -> Vec<TripResult> {
        path.legs
            .iter()
            .flat_map(|leg| {
                path.buses
                    .iter()
                    .filter(move |bus| bus.route_id == leg.route_id)
                    .map(move |bus| self.trip(bus, leg.from_stop, leg.to_stop))
            })
            .collect()
    }

    fn trip(&self, bus: &Bus, board: StopId, alight: StopId) -> TripResult {
        let route_name = self
            .snapshot
            .route_name(bus.route_id)
            .unwrap_or(UNKNOWN_ROUTE_NAME)
            .to_string();

        TripResult {
            bus: bus.clone(),
            route_name,
            departure_time: bus.departure_time,
            arrival_time: self.calculate_arrival(bus, board, alight),
            board_stop: board,
            alight_stop: alight,
        }
    }
}
