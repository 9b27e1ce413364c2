//! Timetable records: stops, routes, route membership and buses.
//!
//! Field names on the wire follow the data service's collections
//! (`stop_id`, `stop_name`, `stop_order`, ...), so the same JSON is read
//! from a remote store, written to seed files and served by the admin API.

use serde::{Deserialize, Deserializer, Serialize};

use super::{BusId, ClockTime, Direction, RouteId, StopId};

/// A physical boarding point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    #[serde(rename = "stop_id")]
    pub id: StopId,
    #[serde(rename = "stop_name")]
    pub name: String,
}

/// A named corridor. Stop order lives in [`RouteStop`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename = "route_id")]
    pub id: RouteId,
    #[serde(rename = "route_name")]
    pub name: String,
}

/// A stop's position on a route and the travel time onward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStop {
    pub route_id: RouteId,
    pub stop_id: StopId,

    /// 1-based position along the route.
    #[serde(rename = "stop_order", deserialize_with = "deserialize_order")]
    pub order: u32,

    /// Minutes between this stop and its neighbour. `Direct` buses read it
    /// on leaving the stop, `Reverse` buses on walking down from it.
    #[serde(
        default,
        alias = "time",
        deserialize_with = "deserialize_minutes"
    )]
    pub time_to_next: Option<u32>,
}

impl RouteStop {
    pub fn new(route_id: RouteId, stop_id: StopId, order: u32, time_to_next: Option<u32>) -> Self {
        Self {
            route_id,
            stop_id,
            order,
            time_to_next,
        }
    }
}

/// A scheduled trip over a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bus {
    #[serde(rename = "bus_id")]
    pub id: BusId,
    pub route_id: RouteId,
    #[serde(rename = "bus_name")]
    pub name: String,

    /// When the bus starts its traversal: at order 1 for `Direct`, at the
    /// highest order for `Reverse`.
    #[serde(rename = "time")]
    pub departure_time: ClockTime,

    pub direction: Direction,
}

/// A bus waiting for the store to assign its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBus {
    pub route_id: RouteId,
    #[serde(rename = "bus_name")]
    pub name: String,
    #[serde(rename = "time")]
    pub departure_time: ClockTime,
    pub direction: Direction,
}

impl NewBus {
    pub fn with_id(self, id: BusId) -> Bus {
        Bus {
            id,
            route_id: self.route_id,
            name: self.name,
            departure_time: self.departure_time,
            direction: self.direction,
        }
    }
}

/// Accept any JSON number (or null) as a minute count.
///
/// Fractions round to the nearest minute. Negative or non-finite values
/// carry no usable timing and become `None`.
fn deserialize_order<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    match u32::deserialize(deserializer)? {
        0 => Err(serde::de::Error::invalid_value(
            serde::de::Unexpected::Unsigned(0),
            &"a stop_order of at least 1",
        )),
        order => Ok(order),
    }
}

fn deserialize_minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.and_then(|m| {
        if m.is_finite() && m >= 0.0 && m <= f64::from(u32::MAX) {
            Some(m.round() as u32)
        } else {
            None
        }
    }))
}
