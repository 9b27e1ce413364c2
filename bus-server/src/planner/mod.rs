//! Route planner over a timetable snapshot.
//!
//! Answers "which buses take me from this stop to that one, and when do I
//! arrive?". Direct trips on a shared route come first; when there are
//! none, a breadth-first search over the stop graph finds a connection.

mod arrival;
mod config;
mod connected;
mod direct;
mod graph;
mod search;

pub use arrival::{Arrival, calculate_arrival};
pub use config::SearchConfig;
pub use connected::{ConnectedPath, PathLeg, find_connected};
pub use direct::find_direct;
pub use graph::RouteGraph;
pub use search::{Planner, SearchResult, TripResult, UNKNOWN_ROUTE_NAME};
