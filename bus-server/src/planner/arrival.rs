//! Arrival-time arithmetic for a single bus trip.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::domain::{Bus, ClockTime, Direction, StopId};

use super::config::SearchConfig;
use super::graph::RouteGraph;

/// Computed arrival at the alighting stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    At(ClockTime),
    /// A stop is not on the route, the direction does not fit, or a
    /// segment time is missing.
    Unavailable,
}

impl Arrival {
    pub fn time(self) -> Option<ClockTime> {
        match self {
            Arrival::At(t) => Some(t),
            Arrival::Unavailable => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Arrival::At(_))
    }
}

impl fmt::Display for Arrival {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arrival::At(t) => write!(f, "{t}"),
            Arrival::Unavailable => f.write_str("N/A"),
        }
    }
}

impl Serialize for Arrival {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// When `bus`, boarded at `from`, reaches `to`.
///
/// The bus's departure time is taken as its time at `from` unless
/// `config.count_lead_in` is set, in which case the run from the start of
/// its traversal to `from` is added first. The result wraps past midnight.
pub fn calculate_arrival(
    graph: &RouteGraph,
    bus: &Bus,
    from: StopId,
    to: StopId,
    config: &SearchConfig,
) -> Arrival {
    match elapsed_minutes(graph, bus, from, to, config) {
        Some(mins) => Arrival::At(bus.departure_time.wrapping_add_minutes(mins)),
        None => Arrival::Unavailable,
    }
}

fn elapsed_minutes(
    graph: &RouteGraph,
    bus: &Bus,
    from: StopId,
    to: StopId,
    config: &SearchConfig,
) -> Option<u32> {
    let route = bus.route_id;
    let from_order = graph.order_of(route, from)?;
    let to_order = graph.order_of(route, to)?;

    if !bus.direction.is_consistent(from_order, to_order) {
        return None;
    }

    // Direct reads the rows it leaves, [from, to). Reverse reads the rows
    // it walks down from, (to, from].
    let travel = match bus.direction {
        Direction::Direct => graph.segment_sum(route, from_order, to_order)?,
        Direction::Reverse => {
            graph.segment_sum(route, to_order.saturating_add(1), from_order.saturating_add(1))?
        }
    };

    let lead_in = if config.count_lead_in {
        let (first, last) = graph.order_bounds(route)?;
        match bus.direction {
            Direction::Direct => graph.segment_sum(route, first, from_order)?,
            Direction::Reverse => {
                graph.segment_sum(route, from_order.saturating_add(1), last.saturating_add(1))?
            }
        }
    } else {
        0
    };

    Some(travel.saturating_add(lead_in))
}
