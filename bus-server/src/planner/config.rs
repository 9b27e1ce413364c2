//! Search configuration for the route planner.

/// Configuration parameters for route search.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Add the travel time from the start of a bus's traversal up to the
    /// boarding stop when computing arrivals.
    ///
    /// Off by default: a bus's departure time is then taken as its time at
    /// the boarding stop.
    pub count_lead_in: bool,
}

impl SearchConfig {
    pub fn new(count_lead_in: bool) -> Self {
        Self { count_lead_in }
    }
}
