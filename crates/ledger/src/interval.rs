//! Route intervals: the span of a journey along a train run's route.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Half-open span `[start, end)` of station indices along a run's route.
///
/// A journey boarding at station index `start` and alighting at station
/// index `end` occupies the train over exactly this span. Two journeys
/// can share a seat iff their intervals do not overlap; handing the seat
/// over at the shared boundary station is not an overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteInterval {
    start: u32,
    end: u32,
}

impl RouteInterval {
    /// Creates an interval, rejecting empty or inverted spans.
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start >= end {
            return Err(LedgerError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Returns the boarding station index.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Returns the alighting station index.
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Half-open overlap test: `[a, b)` and `[c, d)` overlap iff
    /// `a < d && c < b`. Full containment either way counts as overlap.
    pub fn overlaps(&self, other: &RouteInterval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl std::fmt::Display for RouteInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
