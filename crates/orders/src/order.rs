//! The order record.

use chrono::{DateTime, Utc};
use common::{AccountId, OrderId, TrainNumber, TrainRunKey, TravelDate};
use ledger::{Reservation, RouteInterval, SeatClass, SeatId};
use serde::{Deserialize, Serialize};

use crate::status::OrderStatus;

/// One ticket order.
///
/// Identity fields are fixed at creation; only `status` changes
/// afterwards, and only through the lifecycle coordinator's guarded
/// transitions. An order lives in exactly one store partition and is
/// never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,

    /// The account that placed the order.
    pub account: AccountId,

    /// The train making the booked trip.
    pub train_number: TrainNumber,

    /// Departure date of the run.
    pub travel_date: TravelDate,

    /// Station-index span of the journey.
    pub interval: RouteInterval,

    /// The seat the ledger allocated.
    pub seat: SeatId,

    /// Service class the seat was sold as.
    pub class: SeatClass,

    /// Current lifecycle status.
    pub status: OrderStatus,

    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order in `Created` status for an allocated seat.
    pub fn new(
        id: OrderId,
        account: AccountId,
        run: TrainRunKey,
        interval: RouteInterval,
        seat: SeatId,
        class: SeatClass,
    ) -> Self {
        Self {
            id,
            account,
            train_number: run.train_number,
            travel_date: run.travel_date,
            interval,
            seat,
            class,
            status: OrderStatus::Created,
            created_at: Utc::now(),
        }
    }

    /// The run this order books a seat on.
    pub fn run_key(&self) -> TrainRunKey {
        TrainRunKey::new(self.train_number.clone(), self.travel_date)
    }

    /// The ledger reservation backing this order.
    pub fn reservation(&self) -> Reservation {
        Reservation {
            seat: self.seat,
            interval: self.interval,
            order: self.id,
        }
    }
}
