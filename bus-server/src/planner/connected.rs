//! Breadth-first search for multi-route connections.
//!
//! Nodes are stops. From a stop, every other stop on every route through
//! it is one hop away, so a single leg may skip over intermediate stops.
//! The search minimizes the number of legs, not travel time.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, trace};

use crate::domain::{Bus, RouteId, StopId};
use crate::snapshot::Snapshot;

/// One ride along a route between two stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathLeg {
    pub route_id: RouteId,
    pub from_stop: StopId,
    pub to_stop: StopId,
    /// Travel minutes for this leg, missing times counted as zero.
    pub time_mins: u32,
}

/// Outcome of a connection search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedPath<'s> {
    pub legs: Vec<PathLeg>,
    /// Route of each leg, in path order.
    pub route_ids: Vec<RouteId>,
    /// Every bus on the path's routes, each once. Not filtered by direction.
    pub buses: Vec<&'s Bus>,
    /// `None` when no path exists.
    pub total_time: Option<u32>,
}

impl ConnectedPath<'_> {
    fn not_found() -> Self {
        Self {
            legs: Vec::new(),
            route_ids: Vec::new(),
            buses: Vec::new(),
            total_time: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.total_time.is_some()
    }
}

struct QueueEntry {
    stop: StopId,
    legs: Vec<PathLeg>,
    total: u32,
}

/// Find a path from `from` to `to` with the fewest legs.
///
/// Routes through a stop are tried in ascending id order, and stops along a
/// route in ascending order, so equal-length paths resolve the same way on
/// every run.
pub fn find_connected(snapshot: &Snapshot, from: StopId, to: StopId) -> ConnectedPath<'_> {
    if from == to {
        return ConnectedPath {
            total_time: Some(0),
            ..ConnectedPath::not_found()
        };
    }

    let graph = snapshot.graph();
    let mut visited = HashSet::from([from]);
    let mut queue = VecDeque::from([QueueEntry {
        stop: from,
        legs: Vec::new(),
        total: 0,
    }]);

    while let Some(entry) = queue.pop_front() {
        if entry.stop == to {
            debug!(%from, %to, legs = entry.legs.len(), total = entry.total, "connection found");
            return finish(snapshot, entry);
        }

        for route in graph.routes_through(entry.stop) {
            let Some(current_order) = graph.order_of(route, entry.stop) else {
                continue;
            };

            for next in graph.route_stops(route) {
                if !visited.insert(next.stop_id) {
                    continue;
                }

                let time_mins = graph.span_minutes_lenient(route, current_order, next.order);
                trace!(%route, from = %entry.stop, to = %next.stop_id, time_mins, "enqueue");

                let mut legs = entry.legs.clone();
                legs.push(PathLeg {
                    route_id: route,
                    from_stop: entry.stop,
                    to_stop: next.stop_id,
                    time_mins,
                });
                queue.push_back(QueueEntry {
                    stop: next.stop_id,
                    legs,
                    total: entry.total.saturating_add(time_mins),
                });
            }
        }
    }

    debug!(%from, %to, explored = visited.len(), "no connection");
    ConnectedPath::not_found()
}

fn finish(snapshot: &Snapshot, entry: QueueEntry) -> ConnectedPath<'_> {
    let route_ids: Vec<RouteId> = entry.legs.iter().map(|leg| leg.route_id).collect();

    let mut seen = HashSet::new();
    let buses = route_ids
        .iter()
        .flat_map(|&route| snapshot.buses_on_route(route))
        .filter(|bus| seen.insert(bus.id))
        .collect();

    ConnectedPath {
        legs: entry.legs,
        route_ids,
        buses,
        total_time: Some(entry.total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BusId, ClockTime, Direction, RouteStop};
    use crate::store::Collections;

    fn rs(route: u32, stop: u32, order: u32, time: Option<u32>) -> RouteStop {
        RouteStop::new(RouteId::new(route), StopId::new(stop), order, time)
    }

    fn bus(id: u32, route: u32) -> Bus {
        Bus {
            id: BusId::new(id),
            route_id: RouteId::new(route),
            name: format!("Bus {id}"),
            departure_time: ClockTime::parse_hhmm("08:00").unwrap(),
            direction: Direction::Direct,
        }
    }

    /// A=1, B=2, D=4. Route 1: A->B (12). Route 2: B->D (8). Stop 9 is on
    /// its own route.
    fn network() -> Snapshot {
        Snapshot::new(Collections {
            route_stops: vec![
                rs(1, 1, 1, Some(12)),
                rs(1, 2, 2, None),
                rs(2, 2, 1, Some(8)),
                rs(2, 4, 2, None),
                rs(3, 9, 1, None),
            ],
            buses: vec![bus(100, 1), bus(200, 2), bus(201, 2)],
            ..Collections::default()
        })
    }

    #[test]
    fn two_route_connection() {
        let snap = network();
        let path = find_connected(&snap, StopId::new(1), StopId::new(4));

        assert_eq!(path.total_time, Some(20));
        assert_eq!(path.route_ids, vec![RouteId::new(1), RouteId::new(2)]);
        let bus_ids: Vec<u32> = path.buses.iter().map(|b| b.id.get()).collect();
        assert_eq!(bus_ids, vec![100, 200, 201]);

        assert_eq!(path.legs.len(), 2);
        assert_eq!(path.legs[0].from_stop, StopId::new(1));
        assert_eq!(path.legs[0].to_stop, StopId::new(2));
        assert_eq!(path.legs[1].to_stop, StopId::new(4));
        assert_eq!(path.legs[1].time_mins, 8);
    }

    #[test]
    fn same_stop_is_zero() {
        let snap = network();
        let path = find_connected(&snap, StopId::new(2), StopId::new(2));
        assert!(path.legs.is_empty());
        assert!(path.buses.is_empty());
        assert_eq!(path.total_time, Some(0));
    }

    #[test]
    fn disconnected_stop_not_found() {
        let snap = network();
        let path = find_connected(&snap, StopId::new(9), StopId::new(1));
        assert_eq!(path, ConnectedPath::not_found());
        assert!(!path.is_found());

        let path = find_connected(&snap, StopId::new(77), StopId::new(1));
        assert!(!path.is_found());
    }

    #[test]
    fn skips_ahead_along_a_route() {
        // One route 1..=4; the search reaches stop 4 in a single leg.
        let snap = Snapshot::new(Collections {
            route_stops: vec![
                rs(5, 1, 1, Some(3)),
                rs(5, 2, 2, Some(4)),
                rs(5, 3, 3, Some(5)),
                rs(5, 4, 4, None),
            ],
            ..Collections::default()
        });

        let path = find_connected(&snap, StopId::new(1), StopId::new(4));
        assert_eq!(path.legs.len(), 1);
        assert_eq!(path.total_time, Some(12));
    }

    #[test]
    fn travels_against_route_order() {
        let snap = network();
        let path = find_connected(&snap, StopId::new(4), StopId::new(1));
        assert_eq!(path.total_time, Some(20));
        assert_eq!(path.route_ids, vec![RouteId::new(2), RouteId::new(1)]);
    }

    #[test]
    fn missing_times_count_as_zero() {
        let snap = Snapshot::new(Collections {
            route_stops: vec![rs(1, 1, 1, None), rs(1, 2, 2, None)],
            ..Collections::default()
        });
        let path = find_connected(&snap, StopId::new(1), StopId::new(2));
        assert_eq!(path.total_time, Some(0));
    }

    #[test]
    fn lowest_route_id_wins_ties() {
        // Routes 7 and 3 both join stops 1 and 2.
        let snap = Snapshot::new(Collections {
            route_stops: vec![
                rs(7, 1, 1, Some(1)),
                rs(7, 2, 2, None),
                rs(3, 1, 1, Some(9)),
                rs(3, 2, 2, None),
            ],
            ..Collections::default()
        });
        let path = find_connected(&snap, StopId::new(1), StopId::new(2));
        assert_eq!(path.route_ids, vec![RouteId::new(3)]);
        assert_eq!(path.total_time, Some(9));
    }
}
