//! The lifecycle coordinator: every order mutation flows through here.

use std::sync::Arc;

use common::{AccountId, OrderId, TrainNumber, TrainRunKey, TravelDate};
use ledger::{Reservation, SeatClass, SeatLedger};
use order_store::{OrderStore, Partition, PartitionRouter, StoreError};
use orders::{Order, OrderStatus};
use serde::{Deserialize, Serialize};

use crate::allocator::SeatAllocator;
use crate::error::{BookingError, Result};
use crate::services::directory::RouteDirectory;
use crate::services::notify::Notifier;

/// Request to create an order: a journey on one run plus who is buying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub account: AccountId,
    pub train_number: TrainNumber,
    pub travel_date: TravelDate,
    pub from_station: String,
    pub to_station: String,
    pub class: SeatClass,
}

/// Drives orders through their lifecycle while keeping the seat ledger
/// and the order stores in agreement.
///
/// Creation claims the seat first and compensates by releasing it when
/// persistence fails. Status changes go through a compare-and-swap on
/// the owning partition; a lost race is retried exactly once against the
/// re-read state. Cancellation releases the seat optimistically before
/// the status write and restores it if the write turns out to lose.
pub struct LifecycleCoordinator<S, D, N>
where
    S: OrderStore,
    D: RouteDirectory,
    N: Notifier,
{
    router: PartitionRouter<S>,
    allocator: SeatAllocator<D>,
    ledger: SeatLedger,
    notifier: Arc<N>,
}

impl<S, D, N> LifecycleCoordinator<S, D, N>
where
    S: OrderStore,
    D: RouteDirectory,
    N: Notifier + 'static,
{
    /// Creates a coordinator over the partition router, the allocator,
    /// and the notification client.
    pub fn new(router: PartitionRouter<S>, allocator: SeatAllocator<D>, notifier: N) -> Self {
        let ledger = allocator.ledger().clone();
        Self {
            router,
            allocator,
            ledger,
            notifier: Arc::new(notifier),
        }
    }

    /// Books a seat for the requested journey and persists the order.
    ///
    /// The seat is claimed before the order is written, so a persistence
    /// failure releases the claim again; the caller never receives an
    /// error while a seat stays silently taken.
    #[tracing::instrument(
        skip(self, request),
        fields(train = %request.train_number, date = %request.travel_date)
    )]
    pub async fn create_order(&self, request: NewOrder) -> Result<Order> {
        let started = std::time::Instant::now();
        let order_id = OrderId::new();
        let key = TrainRunKey::new(request.train_number, request.travel_date);

        let (seat, interval) = self
            .allocator
            .allocate(
                &key,
                &request.from_station,
                &request.to_station,
                request.class,
                order_id,
            )
            .await?;

        let order = Order::new(
            order_id,
            request.account,
            key.clone(),
            interval,
            seat,
            request.class,
        );

        match self.router.insert(order.clone()).await {
            Ok(partition) => {
                metrics::counter!("booking_orders_created_total").increment(1);
                metrics::histogram!("booking_create_order_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(%order_id, %key, %seat, %interval, %partition, "order created");
                Ok(order)
            }
            Err(e) => {
                // The store never took the order; free the seat again.
                self.release_with_retry(&key, order.reservation()).await;
                Err(BookingError::store("insert", e))
            }
        }
    }

    /// Moves an order to `target` along the lifecycle graph.
    ///
    /// Requesting the status the order already has is an idempotent
    /// no-op. A cancel releases the seat before the status write. When
    /// the conditional write loses to a concurrent one, the outcome is
    /// re-read and retried once; after that a [`BookingError::Conflict`]
    /// surfaces.
    #[tracing::instrument(skip(self))]
    pub async fn advance(&self, order_id: OrderId, target: OrderStatus) -> Result<Order> {
        metrics::counter!("booking_advance_requests_total").increment(1);

        let (partition, order) = self
            .router
            .resolve(order_id, None)
            .await
            .map_err(|e| BookingError::store("resolve", e))?;
        let current = order.status;

        if current == target {
            tracing::debug!(%order_id, status = %current, "advance target already reached");
            return Ok(order);
        }
        if !current.can_transition_to(target) {
            return Err(BookingError::InvalidTransition {
                current,
                requested: target,
            });
        }

        // Cancelling ends the seat's claim. Releasing before the status
        // write means a crash between the two leaves a seat free for an
        // order still on the books, which a cancel retry heals; the
        // opposite order could strand the seat forever.
        let released = if target == OrderStatus::Cancelled {
            let reservation = order.reservation();
            self.ledger
                .release(
                    &order.run_key(),
                    reservation.seat,
                    reservation.interval,
                    order.id,
                )
                .await
                .map_err(|e| BookingError::ledger("release", e))?;
            Some((order.run_key(), reservation))
        } else {
            None
        };

        match self
            .router
            .update_status_on(partition, order_id, current, target)
            .await
        {
            Ok(updated) => {
                self.record_transition(&updated, current);
                Ok(updated)
            }
            Err(StoreError::VersionConflict { .. }) => {
                self.retry_after_conflict(partition, order_id, target, released)
                    .await
            }
            Err(e) => {
                // The write never happened; the optimistic release must
                // not stand.
                self.restore_if_released(&released).await;
                Err(BookingError::store("update_status", e))
            }
        }
    }

    /// Cancels an order, releasing its seat for rebooking.
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        self.advance(order_id, OrderStatus::Cancelled).await
    }

    /// Fetches an order from whichever partition owns it.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        let (_, order) = self
            .router
            .resolve(order_id, None)
            .await
            .map_err(|e| BookingError::store("resolve", e))?;
        Ok(order)
    }

    /// Lists an account's orders across both partitions, newest first.
    pub async fn orders_for_account(&self, account: AccountId) -> Result<Vec<Order>> {
        self.router
            .list_by_account(account)
            .await
            .map_err(|e| BookingError::store("list_by_account", e))
    }

    /// Seats left for a journey, by class.
    pub async fn left_tickets(
        &self,
        key: &TrainRunKey,
        from: &str,
        to: &str,
        class: SeatClass,
    ) -> Result<u32> {
        self.allocator.left_tickets(key, from, to, class).await
    }

    /// The single CAS retry after a lost race.
    async fn retry_after_conflict(
        &self,
        partition: Partition,
        order_id: OrderId,
        target: OrderStatus,
        released: Option<(TrainRunKey, Reservation)>,
    ) -> Result<Order> {
        metrics::counter!("booking_cas_conflicts_total").increment(1);
        tracing::debug!(%order_id, %target, "status write lost a race, retrying once");

        let (partition, fresh) = match self.router.resolve(order_id, Some(partition)).await {
            Ok(found) => found,
            Err(e) => {
                self.restore_if_released(&released).await;
                return Err(BookingError::store("resolve", e));
            }
        };

        if fresh.status == target {
            // The competing writer finished the same transition.
            return Ok(fresh);
        }
        if !fresh.status.can_transition_to(target) {
            self.restore_if_released(&released).await;
            return Err(BookingError::InvalidTransition {
                current: fresh.status,
                requested: target,
            });
        }

        match self
            .router
            .update_status_on(partition, order_id, fresh.status, target)
            .await
        {
            Ok(updated) => {
                self.record_transition(&updated, fresh.status);
                Ok(updated)
            }
            Err(StoreError::VersionConflict { actual, .. }) => {
                // A cancelled order keeps its seat released; any other
                // outcome still owns the reservation.
                if actual != OrderStatus::Cancelled {
                    self.restore_if_released(&released).await;
                }
                Err(BookingError::Conflict(order_id))
            }
            Err(e) => {
                self.restore_if_released(&released).await;
                Err(BookingError::store("update_status", e))
            }
        }
    }

    fn record_transition(&self, order: &Order, from: OrderStatus) {
        metrics::counter!("booking_transitions_total").increment(1);
        tracing::info!(order_id = %order.id, %from, to = %order.status, "order advanced");
        self.notify(order.clone());
    }

    /// Fire-and-forget notification; a lost delivery never fails the
    /// transition that triggered it.
    fn notify(&self, order: Order) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.order_status_changed(&order).await {
                metrics::counter!("booking_notify_failures_total").increment(1);
                tracing::warn!(order_id = %order.id, error = %e, "status notification failed");
            }
        });
    }

    async fn release_with_retry(&self, key: &TrainRunKey, reservation: Reservation) {
        let Reservation {
            seat,
            interval,
            order,
        } = reservation;
        match self.ledger.release(key, seat, interval, order).await {
            Ok(()) => return,
            Err(e) => {
                tracing::warn!(%key, %seat, %order, error = %e, "seat release failed, retrying")
            }
        }
        if let Err(e) = self.ledger.release(key, seat, interval, order).await {
            metrics::counter!("booking_orphan_reservations_total").increment(1);
            tracing::error!(%key, %seat, %order, error = %e, "seat release failed twice; reservation orphaned");
        }
    }

    async fn restore_if_released(&self, released: &Option<(TrainRunKey, Reservation)>) {
        let Some((key, reservation)) = released else {
            return;
        };
        if let Err(e) = self.ledger.restore(key, *reservation).await {
            metrics::counter!("booking_restore_failures_total").increment(1);
            tracing::error!(
                %key,
                seat = %reservation.seat,
                order = %reservation.order,
                error = %e,
                "could not restore reservation after failed cancel"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ledger::{SeatId, TrainLayout};
    use order_store::InMemoryOrderStore;

    use super::*;
    use crate::services::directory::{DirectoryClient, InMemoryRouteDirectory};
    use crate::services::notify::InMemoryNotifier;

    type TestCoordinator = LifecycleCoordinator<
        InMemoryOrderStore,
        DirectoryClient<InMemoryRouteDirectory>,
        InMemoryNotifier,
    >;

    const ROUTE: [&str; 7] = [
        "Beijing South",
        "Tianjin South",
        "Jinan West",
        "Xuzhou East",
        "Nanjing South",
        "Wuxi East",
        "Shanghai Hongqiao",
    ];

    fn key() -> TrainRunKey {
        TrainRunKey::new("G1234", TravelDate::parse("2025-05-04").unwrap())
    }

    fn request(class: SeatClass) -> NewOrder {
        NewOrder {
            account: AccountId::new(),
            train_number: "G1234".into(),
            travel_date: TravelDate::parse("2025-05-04").unwrap(),
            from_station: "Tianjin South".to_string(),
            to_station: "Nanjing South".to_string(),
            class,
        }
    }

    async fn setup() -> (
        TestCoordinator,
        SeatLedger,
        InMemoryRouteDirectory,
        InMemoryNotifier,
        InMemoryOrderStore,
    ) {
        let ledger = SeatLedger::new();
        let layout = TrainLayout::builder()
            .coach(1, SeatClass::FirstClass, 1)
            .coach(2, SeatClass::SecondClass, 2)
            .build();
        ledger
            .schedule(key(), layout, ROUTE.len() as u32)
            .await
            .unwrap();

        let directory = InMemoryRouteDirectory::new();
        directory.register_route(key(), ROUTE);

        let primary = InMemoryOrderStore::new(Partition::Primary);
        let secondary = InMemoryOrderStore::new(Partition::Secondary);
        let router = PartitionRouter::new(
            primary.clone(),
            secondary,
            Duration::from_millis(200),
        );

        let notifier = InMemoryNotifier::new();
        let allocator = SeatAllocator::new(
            DirectoryClient::new(directory.clone(), Duration::from_millis(100)),
            ledger.clone(),
        );
        let coordinator = LifecycleCoordinator::new(router, allocator, notifier.clone());

        (coordinator, ledger, directory, notifier, primary)
    }

    /// Lets spawned notification tasks run.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_create_order_assigns_seat_and_persists() {
        let (coordinator, ledger, _, _, primary) = setup().await;

        let order = coordinator
            .create_order(request(SeatClass::SecondClass))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Created);
        assert_eq!(order.seat, SeatId::new(2, 1));
        assert_eq!(order.interval.start(), 1);
        assert_eq!(order.interval.end(), 4);
        assert_eq!(ledger.reservation_count(&key()).await.unwrap(), 1);
        assert_eq!(primary.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_create_order_sold_out() {
        let (coordinator, ledger, _, _, _) = setup().await;

        coordinator
            .create_order(request(SeatClass::FirstClass))
            .await
            .unwrap();
        let result = coordinator.create_order(request(SeatClass::FirstClass)).await;

        assert!(matches!(result, Err(BookingError::SoldOut { .. })));
        assert_eq!(ledger.reservation_count(&key()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_order_compensates_when_the_store_is_down() {
        let (coordinator, ledger, _, _, primary) = setup().await;
        primary.set_unavailable(true).await;

        let result = coordinator.create_order(request(SeatClass::SecondClass)).await;

        assert!(matches!(result, Err(BookingError::Unavailable { .. })));
        // The claimed seat was released again.
        assert_eq!(ledger.reservation_count(&key()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_advance_walks_the_happy_path() {
        let (coordinator, _, _, notifier, _) = setup().await;
        let order = coordinator
            .create_order(request(SeatClass::SecondClass))
            .await
            .unwrap();

        let paid = coordinator
            .advance(order.id, OrderStatus::Paid)
            .await
            .unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);

        let collected = coordinator
            .advance(order.id, OrderStatus::Collected)
            .await
            .unwrap();
        assert_eq!(collected.status, OrderStatus::Collected);

        let used = coordinator
            .advance(order.id, OrderStatus::Used)
            .await
            .unwrap();
        assert_eq!(used.status, OrderStatus::Used);

        settle().await;
        assert_eq!(
            notifier.deliveries(),
            vec![
                (order.id, OrderStatus::Paid),
                (order.id, OrderStatus::Collected),
                (order.id, OrderStatus::Used),
            ]
        );
    }

    #[tokio::test]
    async fn test_advance_to_current_status_is_idempotent() {
        let (coordinator, _, _, notifier, _) = setup().await;
        let order = coordinator
            .create_order(request(SeatClass::SecondClass))
            .await
            .unwrap();

        coordinator
            .advance(order.id, OrderStatus::Paid)
            .await
            .unwrap();
        let again = coordinator
            .advance(order.id, OrderStatus::Paid)
            .await
            .unwrap();

        assert_eq!(again.status, OrderStatus::Paid);
        settle().await;
        // The no-op did not notify a second time.
        assert_eq!(notifier.delivery_count(), 1);
    }

    #[tokio::test]
    async fn test_advance_rejects_illegal_edges() {
        let (coordinator, _, _, _, _) = setup().await;
        let order = coordinator
            .create_order(request(SeatClass::SecondClass))
            .await
            .unwrap();

        let result = coordinator.advance(order.id, OrderStatus::Used).await;
        match result {
            Err(BookingError::InvalidTransition { current, requested }) => {
                assert_eq!(current, OrderStatus::Created);
                assert_eq!(requested, OrderStatus::Used);
            }
            other => panic!("expected invalid transition, got {other:?}"),
        }

        let result = coordinator.advance(order.id, OrderStatus::Collected).await;
        assert!(matches!(
            result,
            Err(BookingError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_releases_the_seat_for_rebooking() {
        let (coordinator, ledger, _, _, _) = setup().await;
        let order = coordinator
            .create_order(request(SeatClass::FirstClass))
            .await
            .unwrap();

        let cancelled = coordinator.cancel_order(order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(ledger.reservation_count(&key()).await.unwrap(), 0);

        // The only first class seat is free again.
        let rebooked = coordinator
            .create_order(request(SeatClass::FirstClass))
            .await
            .unwrap();
        assert_eq!(rebooked.seat, order.seat);
    }

    #[tokio::test]
    async fn test_cancel_twice_is_idempotent() {
        let (coordinator, _, _, _, _) = setup().await;
        let order = coordinator
            .create_order(request(SeatClass::SecondClass))
            .await
            .unwrap();

        coordinator.cancel_order(order.id).await.unwrap();
        let again = coordinator.cancel_order(order.id).await.unwrap();
        assert_eq!(again.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_of_collected_order_keeps_the_seat() {
        let (coordinator, ledger, _, _, _) = setup().await;
        let order = coordinator
            .create_order(request(SeatClass::SecondClass))
            .await
            .unwrap();
        coordinator
            .advance(order.id, OrderStatus::Paid)
            .await
            .unwrap();
        coordinator
            .advance(order.id, OrderStatus::Collected)
            .await
            .unwrap();

        let result = coordinator.cancel_order(order.id).await;
        assert!(matches!(
            result,
            Err(BookingError::InvalidTransition { .. })
        ));
        assert_eq!(ledger.reservation_count(&key()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let (coordinator, _, _, _, _) = setup().await;
        let missing = OrderId::new();

        let result = coordinator.advance(missing, OrderStatus::Paid).await;
        assert!(matches!(result, Err(BookingError::OrderNotFound(id)) if id == missing));

        let result = coordinator.get_order(missing).await;
        assert!(matches!(result, Err(BookingError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_fail_the_transition() {
        let (coordinator, _, _, notifier, _) = setup().await;
        notifier.set_fail_on_notify(true);

        let order = coordinator
            .create_order(request(SeatClass::SecondClass))
            .await
            .unwrap();
        let paid = coordinator
            .advance(order.id, OrderStatus::Paid)
            .await
            .unwrap();

        assert_eq!(paid.status, OrderStatus::Paid);
        settle().await;
        assert_eq!(notifier.delivery_count(), 0);
    }

    #[tokio::test]
    async fn test_orders_for_account_spans_partitions() {
        let (coordinator, ledger, directory, _, primary) = setup().await;

        // A slow train sharing the corridor; its orders land on the
        // secondary partition.
        let slow_key = TrainRunKey::new("K902", TravelDate::parse("2025-05-04").unwrap());
        directory.register_route(slow_key.clone(), ROUTE);
        ledger
            .schedule(
                slow_key.clone(),
                TrainLayout::builder()
                    .coach(1, SeatClass::SecondClass, 4)
                    .build(),
                ROUTE.len() as u32,
            )
            .await
            .unwrap();

        let account = AccountId::new();
        let mut fast = request(SeatClass::SecondClass);
        fast.account = account;
        let fast_order = coordinator.create_order(fast).await.unwrap();

        let mut slow = request(SeatClass::SecondClass);
        slow.account = account;
        slow.train_number = "K902".into();
        let slow_order = coordinator.create_order(slow).await.unwrap();

        assert_eq!(primary.order_count().await, 1);

        let listed = coordinator.orders_for_account(account).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|o| o.id).collect();
        assert_eq!(listed.len(), 2);
        assert!(ids.contains(&fast_order.id));
        assert!(ids.contains(&slow_order.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cancel_and_collect_stay_consistent() {
        // Whichever write wins, order status and seat occupancy must
        // agree afterwards: Collected keeps the seat, Cancelled frees it.
        for _ in 0..25 {
            let (coordinator, ledger, _, _, _) = setup().await;
            let coordinator = Arc::new(coordinator);
            let order = coordinator
                .create_order(request(SeatClass::SecondClass))
                .await
                .unwrap();
            coordinator
                .advance(order.id, OrderStatus::Paid)
                .await
                .unwrap();

            let cancel = {
                let coordinator = Arc::clone(&coordinator);
                tokio::spawn(async move { coordinator.cancel_order(order.id).await })
            };
            let collect = {
                let coordinator = Arc::clone(&coordinator);
                tokio::spawn(async move {
                    coordinator.advance(order.id, OrderStatus::Collected).await
                })
            };
            let _ = cancel.await.unwrap();
            let _ = collect.await.unwrap();
            settle().await;

            let final_order = coordinator.get_order(order.id).await.unwrap();
            let reservations = ledger.reservation_count(&key()).await.unwrap();
            match final_order.status {
                OrderStatus::Cancelled => assert_eq!(reservations, 0),
                OrderStatus::Collected => assert_eq!(reservations, 1),
                other => panic!("unexpected final status {other}"),
            }
        }
    }
}
