//! Web layer for the bus route planner.
//!
//! Serves stop-to-stop search (JSON or an HTML fragment) and a JSON admin
//! API over the timetable collections.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use templates::*;
