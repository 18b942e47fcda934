//! Notification delivery for order status changes.
//!
//! Delivery is owned by the platform's notification service; the
//! coordinator fires these after a successful transition and never
//! fails an order operation over a lost notification.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use orders::{Order, OrderStatus};
use thiserror::Error;

/// Errors from notification delivery.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The notification could not be delivered.
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Trait for delivering order status change notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tells the account holder that their order changed status.
    async fn order_status_changed(&self, order: &Order) -> Result<(), NotifyError>;
}

#[derive(Debug, Default)]
struct NotifierState {
    deliveries: Vec<(OrderId, OrderStatus)>,
    fail_on_notify: bool,
}

/// In-memory notifier that records deliveries for assertions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<NotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail every delivery.
    pub fn set_fail_on_notify(&self, fail: bool) {
        self.state.write().unwrap().fail_on_notify = fail;
    }

    /// Number of delivered notifications.
    pub fn delivery_count(&self) -> usize {
        self.state.read().unwrap().deliveries.len()
    }

    /// All deliveries in order, as (order, status-at-delivery) pairs.
    pub fn deliveries(&self) -> Vec<(OrderId, OrderStatus)> {
        self.state.read().unwrap().deliveries.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn order_status_changed(&self, order: &Order) -> Result<(), NotifyError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_notify {
            return Err(NotifyError::Delivery("delivery channel down".to_string()));
        }

        state.deliveries.push((order.id, order.status));
        Ok(())
    }
}
