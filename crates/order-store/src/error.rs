use common::OrderId;
use orders::OrderStatus;
use thiserror::Error;

use crate::partition::Partition;

/// Errors that can occur when interacting with an order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order exists in no reachable partition that was asked.
    /// Only returned when every partition asked answered definitively.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// An order with this id has already been written.
    #[error("Duplicate order: {0}")]
    DuplicateOrder(OrderId),

    /// The conditional status write lost a race: the stored status no
    /// longer matches what the caller read.
    #[error("Version conflict for order {order_id}: expected {expected}, found {actual}")]
    VersionConflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// The partition could not be reached within its timeout. Distinct
    /// from `NotFound`: an unreachable partition proves nothing about
    /// whether the order exists there.
    #[error("Order partition {partition} unavailable: {reason}")]
    Unavailable {
        partition: Partition,
        reason: String,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
