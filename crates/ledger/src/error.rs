use common::TrainRunKey;
use thiserror::Error;

use crate::interval::RouteInterval;
use crate::seat::{SeatClass, SeatId};

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The interval is empty or inverted.
    #[error("Invalid interval: start {start} is not before end {end}")]
    InvalidInterval { start: u32, end: u32 },

    /// The interval reaches past the last station of the run's route.
    #[error("Interval {interval} out of bounds for {key}: route has {station_count} stations")]
    IntervalOutOfBounds {
        key: TrainRunKey,
        interval: RouteInterval,
        station_count: u32,
    },

    /// No run is scheduled under this key.
    #[error("Train run not scheduled: {0}")]
    RunNotScheduled(TrainRunKey),

    /// A run with this key already exists; layouts are immutable once scheduled.
    #[error("Train run already scheduled: {0}")]
    AlreadyScheduled(TrainRunKey),

    /// A route must have at least two stations.
    #[error("Route for {key} has too few stations: {station_count}")]
    RouteTooShort { key: TrainRunKey, station_count: u32 },

    /// No seat of the requested class is free over the interval.
    #[error("Sold out: no free {class} seat on {key} over {interval}")]
    SoldOut {
        key: TrainRunKey,
        class: SeatClass,
        interval: RouteInterval,
    },

    /// The seat already carries a reservation overlapping the interval.
    #[error("Seat {seat} on {key} is taken over an interval overlapping {interval}")]
    SeatTaken {
        key: TrainRunKey,
        seat: SeatId,
        interval: RouteInterval,
    },
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
