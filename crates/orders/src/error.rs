use thiserror::Error;

use crate::status::OrderStatus;

/// Errors raised by the order state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// The requested status change is not an edge of the transition
    /// graph. Never coerced to a different transition.
    #[error("Invalid transition: {current} -> {requested}")]
    InvalidTransition {
        current: OrderStatus,
        requested: OrderStatus,
    },
}
