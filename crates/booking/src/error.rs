//! Error types for seat allocation and lifecycle coordination.

use common::{OrderId, TrainRunKey};
use ledger::{LedgerError, RouteInterval, SeatClass};
use order_store::StoreError;
use orders::OrderStatus;
use thiserror::Error;

use crate::services::directory::DirectoryError;

/// Errors returned by the allocator and the lifecycle coordinator.
///
/// Outcomes a caller can act on (not found, sold out, illegal edge,
/// lost race, upstream down) are first-class variants; everything else
/// is wrapped with the failing operation attached. Unavailability is
/// never collapsed into absence or a default value.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The train run is not scheduled in the ledger.
    #[error("Train run not scheduled: {0}")]
    TrainRunNotFound(TrainRunKey),

    /// The named station is not on the run's route.
    #[error("Station not on the route of {key}: {station}")]
    StationNotFound { key: TrainRunKey, station: String },

    /// The boarding station does not precede the alighting station.
    #[error("Invalid interval on {key}: {from} does not precede {to}")]
    InvalidInterval {
        key: TrainRunKey,
        from: String,
        to: String,
    },

    /// No free seat of the class over the requested span.
    #[error("Sold out: no free {class} seat on {key} over {interval}")]
    SoldOut {
        key: TrainRunKey,
        class: SeatClass,
        interval: RouteInterval,
    },

    /// No partition owns this order.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The requested status change is not an edge of the lifecycle.
    #[error("Invalid transition: {current} -> {requested}")]
    InvalidTransition {
        current: OrderStatus,
        requested: OrderStatus,
    },

    /// A concurrent writer changed the order's status; already retried once.
    #[error("Conflict on order {0}: status changed concurrently")]
    Conflict(OrderId),

    /// A collaborator or partition could not be reached.
    #[error("Upstream unavailable ({upstream}): {reason}")]
    Unavailable {
        upstream: &'static str,
        reason: String,
    },

    /// A ledger operation failed for a reason with no dedicated variant.
    #[error("Ledger {op} failed: {source}")]
    Ledger {
        op: &'static str,
        #[source]
        source: LedgerError,
    },

    /// An order store operation failed for a reason with no dedicated variant.
    #[error("Order store {op} failed: {source}")]
    Store {
        op: &'static str,
        #[source]
        source: StoreError,
    },
}

impl BookingError {
    pub(crate) fn ledger(op: &'static str, err: LedgerError) -> Self {
        match err {
            LedgerError::RunNotScheduled(key) => BookingError::TrainRunNotFound(key),
            LedgerError::SoldOut {
                key,
                class,
                interval,
            } => BookingError::SoldOut {
                key,
                class,
                interval,
            },
            other => BookingError::Ledger { op, source: other },
        }
    }

    pub(crate) fn store(op: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(order_id) => BookingError::OrderNotFound(order_id),
            StoreError::VersionConflict { order_id, .. } => BookingError::Conflict(order_id),
            StoreError::Unavailable { partition, reason } => BookingError::Unavailable {
                upstream: partition.as_str(),
                reason,
            },
            other => BookingError::Store { op, source: other },
        }
    }
}

impl From<DirectoryError> for BookingError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Unavailable(reason) => BookingError::Unavailable {
                upstream: "route directory",
                reason,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
