use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{AccountId, OrderId};
use orders::{Order, OrderStatus};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    partition::Partition,
    store::OrderStore,
};

#[derive(Debug, Default)]
struct Faults {
    unavailable: bool,
    delay: Option<Duration>,
}

/// In-memory order store implementation for testing and local runs.
///
/// Provides the same interface as the PostgreSQL implementation, plus
/// fault injection: `set_unavailable` makes every call fail like a down
/// partition, `set_delay` stalls calls to exercise caller timeouts.
#[derive(Clone)]
pub struct InMemoryOrderStore {
    partition: Partition,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    faults: Arc<RwLock<Faults>>,
}

impl InMemoryOrderStore {
    /// Creates an empty store serving one partition.
    pub fn new(partition: Partition) -> Self {
        Self {
            partition,
            orders: Arc::new(RwLock::new(HashMap::new())),
            faults: Arc::new(RwLock::new(Faults::default())),
        }
    }

    /// The partition this store serves.
    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// Makes every subsequent call fail as unreachable.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.faults.write().await.unavailable = unavailable;
    }

    /// Stalls every subsequent call by `delay` before answering.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        self.faults.write().await.delay = delay;
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all orders and fault injection.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
        *self.faults.write().await = Faults::default();
    }

    async fn apply_faults(&self) -> Result<()> {
        let (unavailable, delay) = {
            let faults = self.faults.read().await;
            (faults.unavailable, faults.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if unavailable {
            return Err(StoreError::Unavailable {
                partition: self.partition,
                reason: "injected fault".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        self.apply_faults().await?;

        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(StoreError::DuplicateOrder(order.id));
        }
        orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        self.apply_faults().await?;

        let orders = self.orders.read().await;
        Ok(orders.get(&order_id).cloned())
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order> {
        self.apply_faults().await?;

        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or(StoreError::NotFound(order_id))?;

        if order.status != expected {
            return Err(StoreError::VersionConflict {
                order_id,
                expected,
                actual: order.status,
            });
        }

        order.status = next;
        Ok(order.clone())
    }

    async fn list_by_account(&self, account: AccountId) -> Result<Vec<Order>> {
        self.apply_faults().await?;

        let orders = self.orders.read().await;
        let mut result: Vec<_> = orders
            .values()
            .filter(|o| o.account == account)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }
}
