//! Stop/route index built from route membership rows.
//!
//! Answers the two questions every search asks: which routes pass through
//! a stop, and in what order a route visits its stops.

use std::collections::{BTreeSet, HashMap};

use tracing::warn;

use crate::domain::{RouteId, RouteStop, StopId};

/// In-memory index over route stops, built once per snapshot.
#[derive(Debug, Clone, Default)]
pub struct RouteGraph {
    /// Routes serving each stop, in ascending id order.
    stop_index: HashMap<StopId, BTreeSet<RouteId>>,

    /// Stops of each route, sorted ascending by order.
    route_order: HashMap<RouteId, Vec<RouteStop>>,

    /// Position of a stop on a route.
    orders: HashMap<(RouteId, StopId), u32>,
}

impl RouteGraph {
    /// Index the given rows.
    ///
    /// If a `(route_id, stop_id)` pair appears more than once, the first row
    /// is kept and the rest are dropped.
    pub fn build(rows: &[RouteStop]) -> Self {
        let mut graph = Self::default();

        for row in rows {
            let key = (row.route_id, row.stop_id);
            if let Some(kept) = graph.orders.get(&key) {
                warn!(
                    route = %row.route_id,
                    stop = %row.stop_id,
                    kept_order = *kept,
                    dropped_order = row.order,
                    "duplicate route stop dropped"
                );
                continue;
            }

            graph.orders.insert(key, row.order);
            graph
                .stop_index
                .entry(row.stop_id)
                .or_default()
                .insert(row.route_id);
            graph
                .route_order
                .entry(row.route_id)
                .or_default()
                .push(row.clone());
        }

        for (route_id, stops) in &mut graph.route_order {
            stops.sort_by_key(|rs| rs.order);
            if !orders_contiguous(stops) {
                warn!(route = %route_id, stops = stops.len(), "route stop orders are not 1..n");
            }
        }

        graph
    }

    /// Routes serving `stop`, ascending by id. Empty for unknown stops.
    pub fn routes_through(&self, stop: StopId) -> impl Iterator<Item = RouteId> + '_ {
        self.stop_index.get(&stop).into_iter().flatten().copied()
    }

    /// Routes serving both stops, ascending by id.
    pub fn shared_routes(&self, a: StopId, b: StopId) -> Vec<RouteId> {
        match (self.stop_index.get(&a), self.stop_index.get(&b)) {
            (Some(ra), Some(rb)) => ra.intersection(rb).copied().collect(),
            _ => Vec::new(),
        }
    }

    /// Stops of `route` in ascending order. Empty for unknown routes.
    pub fn route_stops(&self, route: RouteId) -> &[RouteStop] {
        self.route_order
            .get(&route)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn order_of(&self, route: RouteId, stop: StopId) -> Option<u32> {
        self.orders.get(&(route, stop)).copied()
    }

    pub fn contains_stop(&self, stop: StopId) -> bool {
        self.stop_index.contains_key(&stop)
    }

    pub fn route_count(&self) -> usize {
        self.route_order.len()
    }

    /// Whether the route's orders are exactly `1..=n`.
    pub fn is_contiguous(&self, route: RouteId) -> bool {
        self.route_order
            .get(&route)
            .is_some_and(|stops| orders_contiguous(stops))
    }

    /// Total `time_to_next` over orders `[lo, hi)`.
    ///
    /// `None` if any order in the range has no row or no time, or if
    /// `lo > hi`. An empty range is zero minutes.
    pub fn segment_sum(&self, route: RouteId, lo: u32, hi: u32) -> Option<u32> {
        if lo > hi {
            return None;
        }
        let stops = self.route_stops(route);

        (lo..hi).try_fold(0u32, |acc, order| {
            let idx = stops.binary_search_by_key(&order, |rs| rs.order).ok()?;
            Some(acc.saturating_add(stops[idx].time_to_next?))
        })
    }

    /// Minutes between two orders on a route in either direction, counting
    /// missing times as zero.
    pub fn span_minutes_lenient(&self, route: RouteId, a: u32, b: u32) -> u32 {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.route_stops(route)
            .iter()
            .filter(|rs| rs.order >= lo && rs.order < hi)
            .fold(0u32, |acc, rs| acc.saturating_add(rs.time_to_next.unwrap_or(0)))
    }

    /// Lowest and highest order on a route.
    pub fn order_bounds(&self, route: RouteId) -> Option<(u32, u32)> {
        let stops = self.route_stops(route);
        Some((stops.first()?.order, stops.last()?.order))
    }
}

fn orders_contiguous(sorted: &[RouteStop]) -> bool {
    sorted
        .iter()
        .zip(1u32..)
        .all(|(rs, expected)| rs.order == expected)
}
