//! End-to-end booking flows over in-memory stores and collaborators.

use std::sync::Arc;
use std::time::Duration;

use booking::{
    BookingError, DirectoryClient, InMemoryNotifier, InMemoryRouteDirectory,
    LifecycleCoordinator, NewOrder, SeatAllocator,
};
use common::{AccountId, TrainRunKey, TravelDate};
use ledger::{SeatClass, SeatLedger, TrainLayout};
use order_store::{InMemoryOrderStore, Partition, PartitionRouter};
use orders::OrderStatus;

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

fn run_key() -> TrainRunKey {
    TrainRunKey::new("G1234", TravelDate::parse("2025-05-04").unwrap())
}

fn request(from: &str, to: &str, class: SeatClass) -> NewOrder {
    NewOrder {
        account: AccountId::new(),
        train_number: "G1234".into(),
        travel_date: TravelDate::parse("2025-05-04").unwrap(),
        from_station: from.to_string(),
        to_station: to.to_string(),
        class,
    }
}

struct TestHarness {
    coordinator: Arc<TestCoordinator>,
    ledger: SeatLedger,
    notifier: InMemoryNotifier,
    primary: InMemoryOrderStore,
}

impl TestHarness {
    async fn new() -> Self {
        let ledger = SeatLedger::new();
        let layout = TrainLayout::builder()
            .coach(1, SeatClass::FirstClass, 1)
            .coach(2, SeatClass::SecondClass, 2)
            .build();
        ledger
            .schedule(run_key(), layout, ROUTE.len() as u32)
            .await
            .unwrap();

        let directory = InMemoryRouteDirectory::new();
        directory.register_route(run_key(), ROUTE);

        let primary = InMemoryOrderStore::new(Partition::Primary);
        let secondary = InMemoryOrderStore::new(Partition::Secondary);
        let router =
            PartitionRouter::new(primary.clone(), secondary, Duration::from_millis(200));

        let notifier = InMemoryNotifier::new();
        let allocator = SeatAllocator::new(
            DirectoryClient::new(directory, Duration::from_millis(100)),
            ledger.clone(),
        );
        let coordinator =
            Arc::new(LifecycleCoordinator::new(router, allocator, notifier.clone()));

        Self {
            coordinator,
            ledger,
            notifier,
            primary,
        }
    }

    async fn reservations(&self) -> usize {
        self.ledger.reservation_count(&run_key()).await.unwrap()
    }
}

/// Lets spawned notification tasks run.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn test_full_booking_lifecycle() {
    let h = TestHarness::new().await;

    let order = h
        .coordinator
        .create_order(request(
            "Beijing South",
            "Shanghai Hongqiao",
            SeatClass::SecondClass,
        ))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Created);

    for target in [OrderStatus::Paid, OrderStatus::Collected, OrderStatus::Used] {
        let advanced = h.coordinator.advance(order.id, target).await.unwrap();
        assert_eq!(advanced.status, target);
    }

    settle().await;
    assert_eq!(
        h.notifier.deliveries(),
        vec![
            (order.id, OrderStatus::Paid),
            (order.id, OrderStatus::Collected),
            (order.id, OrderStatus::Used),
        ]
    );

    // A used journey still occupies its span.
    assert_eq!(h.reservations().await, 1);
    let fetched = h.coordinator.get_order(order.id).await.unwrap();
    assert_eq!(fetched.status, OrderStatus::Used);
}

#[tokio::test]
async fn test_one_first_class_seat_serves_the_whole_corridor() {
    let h = TestHarness::new().await;

    // Two passengers on disjoint legs share the single first class seat.
    let north = h
        .coordinator
        .create_order(request(
            "Beijing South",
            "Xuzhou East",
            SeatClass::FirstClass,
        ))
        .await
        .unwrap();
    let south = h
        .coordinator
        .create_order(request(
            "Xuzhou East",
            "Shanghai Hongqiao",
            SeatClass::FirstClass,
        ))
        .await
        .unwrap();
    assert_eq!(north.seat, south.seat);

    // A journey crossing the handover point finds no seat.
    let crossing = request("Tianjin South", "Nanjing South", SeatClass::FirstClass);
    let result = h.coordinator.create_order(crossing.clone()).await;
    assert!(matches!(result, Err(BookingError::SoldOut { .. })));

    // Cancelling the northern leg does not help: the crossing journey
    // still overlaps the southern one.
    h.coordinator.cancel_order(north.id).await.unwrap();
    let result = h.coordinator.create_order(crossing).await;
    assert!(matches!(result, Err(BookingError::SoldOut { .. })));

    // The freed northern leg itself is bookable again.
    let rebooked = h
        .coordinator
        .create_order(request(
            "Beijing South",
            "Xuzhou East",
            SeatClass::FirstClass,
        ))
        .await
        .unwrap();
    assert_eq!(rebooked.seat, north.seat);
}

#[tokio::test]
async fn test_store_outage_compensates_and_recovers() {
    let h = TestHarness::new().await;
    h.primary.set_unavailable(true).await;

    let result = h
        .coordinator
        .create_order(request(
            "Beijing South",
            "Nanjing South",
            SeatClass::FirstClass,
        ))
        .await;
    assert!(matches!(result, Err(BookingError::Unavailable { .. })));
    assert_eq!(h.reservations().await, 0);

    // Once the partition is back the same journey books cleanly.
    h.primary.set_unavailable(false).await;
    let order = h
        .coordinator
        .create_order(request(
            "Beijing South",
            "Nanjing South",
            SeatClass::FirstClass,
        ))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Created);
    assert_eq!(h.reservations().await, 1);
}

#[tokio::test]
async fn test_refund_path_frees_the_seat_for_another_account() {
    let h = TestHarness::new().await;

    let order = h
        .coordinator
        .create_order(request(
            "Jinan West",
            "Shanghai Hongqiao",
            SeatClass::FirstClass,
        ))
        .await
        .unwrap();
    h.coordinator
        .advance(order.id, OrderStatus::Paid)
        .await
        .unwrap();

    // Paid orders may still cancel; the seat frees immediately.
    let cancelled = h.coordinator.cancel_order(order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(h.reservations().await, 0);

    let rebooked = h
        .coordinator
        .create_order(request(
            "Beijing South",
            "Nanjing South",
            SeatClass::FirstClass,
        ))
        .await
        .unwrap();
    assert_eq!(rebooked.seat, order.seat);
}

#[tokio::test]
async fn test_outage_during_advance_is_reported_not_swallowed() {
    let h = TestHarness::new().await;
    let order = h
        .coordinator
        .create_order(request(
            "Beijing South",
            "Jinan West",
            SeatClass::SecondClass,
        ))
        .await
        .unwrap();

    h.primary.set_unavailable(true).await;

    // The owning partition is down. The order is not gone; reporting
    // NotFound (or pretending success) here would corrupt the lifecycle.
    let result = h.coordinator.advance(order.id, OrderStatus::Paid).await;
    assert!(matches!(result, Err(BookingError::Unavailable { .. })));

    let result = h.coordinator.get_order(order.id).await;
    assert!(matches!(result, Err(BookingError::Unavailable { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_seat_race_has_exactly_one_winner() {
    for _ in 0..20 {
        let h = TestHarness::new().await;

        let a = {
            let coordinator = Arc::clone(&h.coordinator);
            tokio::spawn(async move {
                coordinator
                    .create_order(request(
                        "Beijing South",
                        "Nanjing South",
                        SeatClass::FirstClass,
                    ))
                    .await
            })
        };
        let b = {
            let coordinator = Arc::clone(&h.coordinator);
            tokio::spawn(async move {
                coordinator
                    .create_order(request(
                        "Tianjin South",
                        "Shanghai Hongqiao",
                        SeatClass::FirstClass,
                    ))
                    .await
            })
        };

        let outcomes = [a.await.unwrap(), b.await.unwrap()];
        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        let sold_out = outcomes
            .iter()
            .filter(|r| matches!(r, Err(BookingError::SoldOut { .. })))
            .count();

        assert_eq!(winners, 1, "exactly one booking must win the last seat");
        assert_eq!(sold_out, 1);
        assert_eq!(h.reservations().await, 1);
    }
}
