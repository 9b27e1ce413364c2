//! Single-bus trips between two stops.

use std::collections::HashSet;

use crate::domain::{Bus, StopId};
use crate::snapshot::Snapshot;

/// Every bus that visits `from` and then `to` without a change.
///
/// A bus qualifies when its route serves both stops and its direction
/// passes them in that order. Buses come out grouped by ascending route id,
/// each at most once. Unknown stops yield no buses.
pub fn find_direct(snapshot: &Snapshot, from: StopId, to: StopId) -> Vec<&Bus> {
    let graph = snapshot.graph();
    let mut seen = HashSet::new();
    let mut buses = Vec::new();

    for route in graph.shared_routes(from, to) {
        let (Some(from_order), Some(to_order)) =
            (graph.order_of(route, from), graph.order_of(route, to))
        else {
            continue;
        };

        for bus in snapshot.buses_on_route(route) {
            if bus.direction.is_consistent(from_order, to_order) && seen.insert(bus.id) {
                buses.push(bus);
            }
        }
    }

    buses
}
