//! The seat ledger: authoritative per-run record of all reservations.

use std::collections::HashMap;
use std::sync::Arc;

use common::{OrderId, TrainRunKey};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{LedgerError, Result};
use crate::interval::RouteInterval;
use crate::seat::{SeatClass, SeatId, TrainLayout};

/// Binding of a seat to a route interval for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// The occupied seat.
    pub seat: SeatId,

    /// The span of the journey.
    pub interval: RouteInterval,

    /// The order holding the seat.
    pub order: OrderId,
}

/// Occupancy state of a single train run.
#[derive(Debug)]
struct RunState {
    layout: TrainLayout,
    station_count: u32,
    reservations: Vec<Reservation>,
}

impl RunState {
    fn seat_is_free(&self, seat: SeatId, interval: &RouteInterval) -> bool {
        self.reservations
            .iter()
            .filter(|r| r.seat == seat)
            .all(|r| !r.interval.overlaps(interval))
    }

    fn check_bounds(&self, key: &TrainRunKey, interval: &RouteInterval) -> Result<()> {
        // Station indices run 0..station_count; the last valid alighting
        // point is the final station.
        if interval.end() > self.station_count - 1 {
            return Err(LedgerError::IntervalOutOfBounds {
                key: key.clone(),
                interval: *interval,
                station_count: self.station_count,
            });
        }
        Ok(())
    }
}

/// Concurrent map of train runs to their occupancy state.
///
/// Cheaply clonable handle; clones share the same underlying state.
/// Each run is guarded by its own lock, so reservations on distinct runs
/// proceed in parallel while `reserve` calls for one run serialize.
/// `available` only takes the run's read lock and is therefore advisory:
/// a reservation attempted right after a positive availability answer may
/// still find the seats gone.
#[derive(Clone, Default)]
pub struct SeatLedger {
    runs: Arc<RwLock<HashMap<TrainRunKey, Arc<RwLock<RunState>>>>>,
}

impl SeatLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a train run with its immutable seat layout.
    ///
    /// `station_count` is the number of stations on the run's route and
    /// bounds every interval later booked against it.
    #[tracing::instrument(skip(self, layout))]
    pub async fn schedule(
        &self,
        key: TrainRunKey,
        layout: TrainLayout,
        station_count: u32,
    ) -> Result<()> {
        if station_count < 2 {
            return Err(LedgerError::RouteTooShort { key, station_count });
        }

        let mut runs = self.runs.write().await;
        if runs.contains_key(&key) {
            return Err(LedgerError::AlreadyScheduled(key));
        }

        tracing::info!(%key, seats = layout.seat_count(), station_count, "scheduling train run");
        runs.insert(
            key,
            Arc::new(RwLock::new(RunState {
                layout,
                station_count,
                reservations: Vec::new(),
            })),
        );
        Ok(())
    }

    /// Returns true if a run is scheduled under this key.
    pub async fn is_scheduled(&self, key: &TrainRunKey) -> bool {
        self.runs.read().await.contains_key(key)
    }

    /// Counts the seats of `class` with no reservation overlapping `interval`.
    ///
    /// Read-only; never blocks other readers of the same run.
    pub async fn available(
        &self,
        key: &TrainRunKey,
        interval: RouteInterval,
        class: SeatClass,
    ) -> Result<u32> {
        let run = self.run(key).await?;
        let state = run.read().await;
        state.check_bounds(key, &interval)?;

        let count = state
            .layout
            .seats_of_class(class)
            .filter(|s| state.seat_is_free(s.id, &interval))
            .count();
        Ok(count as u32)
    }

    /// Claims the first free seat of `class` over `interval` for `order`.
    ///
    /// Seats are scanned by coach then seat number, so allocation is
    /// deterministic for a given ledger state. The run's write lock is
    /// held across scan and insert, which is what keeps two concurrent
    /// reservations from claiming the same seat.
    #[tracing::instrument(skip(self))]
    pub async fn reserve(
        &self,
        key: &TrainRunKey,
        interval: RouteInterval,
        class: SeatClass,
        order: OrderId,
    ) -> Result<SeatId> {
        let run = self.run(key).await?;
        let mut state = run.write().await;
        state.check_bounds(key, &interval)?;

        let Some(seat) = state
            .layout
            .seats_of_class(class)
            .map(|s| s.id)
            .find(|id| state.seat_is_free(*id, &interval))
        else {
            metrics::counter!("ledger_sold_out_total").increment(1);
            return Err(LedgerError::SoldOut {
                key: key.clone(),
                class,
                interval,
            });
        };

        state.reservations.push(Reservation {
            seat,
            interval,
            order,
        });
        metrics::counter!("ledger_reservations_total").increment(1);
        tracing::debug!(%key, %seat, %interval, %order, "seat reserved");
        Ok(seat)
    }

    /// Removes the reservation matching (`seat`, `interval`, `order`).
    ///
    /// Succeeds as a no-op when no such reservation exists, so
    /// at-least-once cancellation retries stay harmless.
    #[tracing::instrument(skip(self))]
    pub async fn release(
        &self,
        key: &TrainRunKey,
        seat: SeatId,
        interval: RouteInterval,
        order: OrderId,
    ) -> Result<()> {
        let run = self.run(key).await?;
        let mut state = run.write().await;

        let before = state.reservations.len();
        state
            .reservations
            .retain(|r| !(r.seat == seat && r.interval == interval && r.order == order));

        if state.reservations.len() < before {
            metrics::counter!("ledger_releases_total").increment(1);
            tracing::debug!(%key, %seat, %interval, %order, "reservation released");
        }
        Ok(())
    }

    /// Puts a previously released reservation back.
    ///
    /// Used to undo an optimistic release when the status write it was
    /// paired with lost its race. Fails with `SeatTaken` if another
    /// booking claimed an overlapping span in the meantime.
    #[tracing::instrument(skip(self))]
    pub async fn restore(&self, key: &TrainRunKey, reservation: Reservation) -> Result<()> {
        let run = self.run(key).await?;
        let mut state = run.write().await;

        if !state.seat_is_free(reservation.seat, &reservation.interval) {
            return Err(LedgerError::SeatTaken {
                key: key.clone(),
                seat: reservation.seat,
                interval: reservation.interval,
            });
        }

        state.reservations.push(reservation);
        tracing::debug!(%key, seat = %reservation.seat, "reservation restored");
        Ok(())
    }

    /// Returns the number of live reservations on a run.
    pub async fn reservation_count(&self, key: &TrainRunKey) -> Result<usize> {
        let run = self.run(key).await?;
        let state = run.read().await;
        Ok(state.reservations.len())
    }

    /// Looks up a run's state handle without holding the map lock afterwards.
    async fn run(&self, key: &TrainRunKey) -> Result<Arc<RwLock<RunState>>> {
        let runs = self.runs.read().await;
        runs.get(key)
            .cloned()
            .ok_or_else(|| LedgerError::RunNotScheduled(key.clone()))
    }
}
