//! Bus route planner server.
//!
//! A web application that answers: "which bus gets me from this stop to
//! that one, and when will I arrive?"

pub mod config;
pub mod domain;
pub mod planner;
pub mod snapshot;
pub mod store;
pub mod web;
