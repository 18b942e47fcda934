//! Fan-out routing across the two order partitions.

use std::future::Future;
use std::time::Duration;

use common::{AccountId, OrderId};
use futures_util::future::try_join;
use orders::{Order, OrderStatus};

use crate::{
    Result, StoreError,
    partition::Partition,
    store::OrderStore,
};

/// Routes order operations to the partition that owns them.
///
/// Writes go to the partition picked by [`Partition::for_train`] at
/// creation time. Reads try the hinted partition first and fan out to
/// the other on a definitive miss. An unreachable partition is never
/// treated as a miss: concluding "not found" requires both partitions
/// to have answered, otherwise the down partition could be the owner
/// and absence would be a false negative.
///
/// Every partition call is bounded by `timeout`; an elapsed timeout
/// surfaces as `Unavailable` for that partition.
pub struct PartitionRouter<S> {
    primary: S,
    secondary: S,
    timeout: Duration,
}

impl<S: OrderStore> PartitionRouter<S> {
    /// Creates a router over the two partition stores.
    pub fn new(primary: S, secondary: S, timeout: Duration) -> Self {
        Self {
            primary,
            secondary,
            timeout,
        }
    }

    /// The store serving one partition.
    pub fn store(&self, partition: Partition) -> &S {
        match partition {
            Partition::Primary => &self.primary,
            Partition::Secondary => &self.secondary,
        }
    }

    async fn bounded<T, F>(&self, partition: Partition, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                metrics::counter!("order_store_timeouts_total").increment(1);
                Err(StoreError::Unavailable {
                    partition,
                    reason: format!("timed out after {:?}", self.timeout),
                })
            }
        }
    }

    /// Writes a new order to the partition its train number selects.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn insert(&self, order: Order) -> Result<Partition> {
        let partition = Partition::for_train(&order.train_number);
        self.bounded(partition, self.store(partition).insert(order))
            .await?;
        Ok(partition)
    }

    /// Finds the partition owning `order_id` and returns it with the
    /// order.
    ///
    /// The hinted partition is asked first (`Primary` when no hint is
    /// available). A hit anywhere is definitive, because an order lives
    /// in exactly one partition. `NotFound` requires definitive misses
    /// from both; if the only misses came alongside an unreachable
    /// partition, that partition's error propagates instead.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(
        &self,
        order_id: OrderId,
        hint: Option<Partition>,
    ) -> Result<(Partition, Order)> {
        let first = hint.unwrap_or(Partition::Primary);
        let second = first.other();

        let first_outcome = self.bounded(first, self.store(first).get(order_id)).await;
        if let Ok(Some(order)) = first_outcome {
            return Ok((first, order));
        }

        match self.bounded(second, self.store(second).get(order_id)).await {
            Ok(Some(order)) => {
                if hint.is_some() {
                    metrics::counter!("order_router_hint_misses_total").increment(1);
                }
                Ok((second, order))
            }
            Ok(None) => match first_outcome {
                // Both answered, neither has it.
                Ok(None) => Err(StoreError::NotFound(order_id)),
                // The first partition may still own the order.
                Err(e) => {
                    tracing::warn!(%order_id, partition = %first, "partition unreachable during resolve");
                    Err(e)
                }
                Ok(Some(_)) => unreachable!("hit already returned"),
            },
            Err(e) => {
                tracing::warn!(%order_id, partition = %second, "partition unreachable during resolve");
                Err(e)
            }
        }
    }

    /// Compare-and-swap of the order's status on its owning partition.
    pub async fn update_status_on(
        &self,
        partition: Partition,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order> {
        self.bounded(
            partition,
            self.store(partition).update_status(order_id, expected, next),
        )
        .await
    }

    /// Lists one account's orders across both partitions, newest first.
    ///
    /// Fans out concurrently; if either partition fails or times out the
    /// whole listing fails rather than silently returning half the
    /// orders.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_account(&self, account: AccountId) -> Result<Vec<Order>> {
        let (mut primary, secondary) = try_join(
            self.bounded(Partition::Primary, self.primary.list_by_account(account)),
            self.bounded(Partition::Secondary, self.secondary.list_by_account(account)),
        )
        .await?;

        primary.extend(secondary);
        primary.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(primary)
    }
}
