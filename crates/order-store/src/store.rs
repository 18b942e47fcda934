use async_trait::async_trait;
use common::{AccountId, OrderId};
use orders::{Order, OrderStatus};

use crate::{Result, StoreError};

/// Core trait for one physical order partition.
///
/// A store persists order records and answers point and account reads.
/// Absence and failure are never conflated: `Ok(None)` from [`get`]
/// means the partition answered and definitively does not hold the
/// order, while infrastructure trouble surfaces as an error.
/// All implementations must be thread-safe (Send + Sync).
///
/// [`get`]: OrderStore::get
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Writes a new order.
    ///
    /// Fails with `DuplicateOrder` if the id is already present.
    async fn insert(&self, order: Order) -> Result<()>;

    /// Reads one order.
    ///
    /// Returns `Ok(None)` when the partition definitively does not hold
    /// the order.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Conditionally replaces the order's status.
    ///
    /// Writes `next` only if the stored status still equals `expected`
    /// (compare-and-swap); a lost race fails with `VersionConflict`
    /// carrying the status actually found. Returns the updated order.
    async fn update_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order>;

    /// Lists the partition's orders for one account, newest first.
    async fn list_by_account(&self, account: AccountId) -> Result<Vec<Order>>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Reads one order, treating definitive absence as `NotFound`.
    async fn get_required(&self, order_id: OrderId) -> Result<Order> {
        self.get(order_id)
            .await?
            .ok_or(StoreError::NotFound(order_id))
    }

    /// Checks whether the partition holds the order.
    async fn contains(&self, order_id: OrderId) -> Result<bool> {
        Ok(self.get(order_id).await?.is_some())
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}
