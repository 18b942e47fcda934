//! Order status state machine.

use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// The status of an order in its lifecycle.
///
/// Transitions:
/// ```text
/// Created ──► Paid ──► Collected ──► Used
///    │          │
///    └──────────┴──► Cancelled
/// ```
///
/// Cancelling from `Paid` refunds and releases the seat reservation;
/// cancelling from `Created` releases it without a refund. `Used` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order written, seat held, payment outstanding.
    #[default]
    Created,

    /// Payment confirmed.
    Paid,

    /// Ticket collected or printed.
    Collected,

    /// Trip executed; the ticket passed an entry gate (terminal state).
    Used,

    /// Order cancelled, seat released (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if payment can be confirmed in this status.
    pub fn can_pay(&self) -> bool {
        matches!(self, OrderStatus::Created)
    }

    /// Returns true if the ticket can be collected in this status.
    pub fn can_collect(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Returns true if the ticket can be marked used in this status.
    pub fn can_use(&self) -> bool {
        matches!(self, OrderStatus::Collected)
    }

    /// Returns true if the order can be cancelled in this status.
    ///
    /// Both cancellable statuses still hold a seat reservation, so a
    /// cancel from either must release it.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Created | OrderStatus::Paid)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Used | OrderStatus::Cancelled)
    }

    /// Returns true if `(self, target)` is a legal edge of the
    /// transition graph. Same-status pairs are not edges; callers treat
    /// them as idempotent no-ops instead.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        match target {
            OrderStatus::Created => false,
            OrderStatus::Paid => self.can_pay(),
            OrderStatus::Collected => self.can_collect(),
            OrderStatus::Used => self.can_use(),
            OrderStatus::Cancelled => self.can_cancel(),
        }
    }

    /// Validates the edge and returns the target status.
    pub fn transition_to(&self, target: OrderStatus) -> Result<OrderStatus, OrderError> {
        if !self.can_transition_to(target) {
            return Err(OrderError::InvalidTransition {
                current: *self,
                requested: target,
            });
        }
        Ok(target)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "Created",
            OrderStatus::Paid => "Paid",
            OrderStatus::Collected => "Collected",
            OrderStatus::Used => "Used",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Parses a status from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Created" => Some(OrderStatus::Created),
            "Paid" => Some(OrderStatus::Paid),
            "Collected" => Some(OrderStatus::Collected),
            "Used" => Some(OrderStatus::Used),
            "Cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// All statuses, for exhaustive sweeps in tests.
    pub fn all() -> [OrderStatus; 5] {
        [
            OrderStatus::Created,
            OrderStatus::Paid,
            OrderStatus::Collected,
            OrderStatus::Used,
            OrderStatus::Cancelled,
        ]
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
