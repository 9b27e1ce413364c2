//! Travel direction of a bus along its route.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown direction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid direction {0:?}: must be \"Direct\" or \"Reverse\"")]
pub struct InvalidDirection(String);

/// Which way a bus traverses the stop order of its route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Ascending stop order.
    Direct,
    /// Descending stop order.
    Reverse,
}

impl Direction {
    /// Whether a bus running this way passes `from_order` before `to_order`.
    ///
    /// Equal orders are never consistent: boarding and alighting at the
    /// same stop is not a trip.
    pub fn is_consistent(self, from_order: u32, to_order: u32) -> bool {
        match self {
            Direction::Direct => from_order < to_order,
            Direction::Reverse => from_order > to_order,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Direct => "Direct",
            Direction::Reverse => "Reverse",
        }
    }
}

impl FromStr for Direction {
    type Err = InvalidDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Direct" => Ok(Direction::Direct),
            "Reverse" => Ok(Direction::Reverse),
            other => Err(InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
