//! Domain types for the bus connection planner.
//!
//! These types represent validated timetable data. Identifiers, clock times
//! and directions are checked at the loading boundary, so code that receives
//! them can trust their validity.

mod clock;
mod direction;
mod ids;
mod model;

pub use clock::{
    ClockTime, MINUTES_PER_DAY, TimeError, format_time_from_minutes, parse_time_to_minutes,
};
pub use direction::{Direction, InvalidDirection};
pub use ids::{BusId, InvalidId, RouteId, StopId};
pub use model::{Bus, NewBus, Route, RouteStop, Stop};
