//! Seat allocation: station names in, a claimed seat out.

use common::{OrderId, TrainRunKey};
use ledger::{RouteInterval, SeatClass, SeatId, SeatLedger};

use crate::error::{BookingError, Result};
use crate::services::directory::RouteDirectory;

/// Translates journeys named by stations into route intervals and
/// claims seats for them in the ledger.
///
/// The allocator never invents a seat: every `SeatId` it hands out came
/// from [`SeatLedger::reserve`], and a sold-out answer is the ledger's,
/// not a guess.
pub struct SeatAllocator<D> {
    directory: D,
    ledger: SeatLedger,
}

impl<D: RouteDirectory> SeatAllocator<D> {
    /// Creates an allocator over a route directory and the shared ledger.
    pub fn new(directory: D, ledger: SeatLedger) -> Self {
        Self { directory, ledger }
    }

    /// The ledger this allocator books against.
    pub fn ledger(&self) -> &SeatLedger {
        &self.ledger
    }

    /// Resolves a journey from `from` to `to` into the half-open span of
    /// route positions it occupies.
    pub async fn interval_for(
        &self,
        key: &TrainRunKey,
        from: &str,
        to: &str,
    ) -> Result<RouteInterval> {
        let from_index = self.lookup(key, from).await?;
        let to_index = self.lookup(key, to).await?;

        if from_index >= to_index {
            return Err(BookingError::InvalidInterval {
                key: key.clone(),
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        RouteInterval::new(from_index, to_index)
            .map_err(|e| BookingError::ledger("interval_for", e))
    }

    /// Claims the first free seat of `class` for the journey and returns
    /// it along with the interval it is booked over.
    #[tracing::instrument(skip(self))]
    pub async fn allocate(
        &self,
        key: &TrainRunKey,
        from: &str,
        to: &str,
        class: SeatClass,
        order: OrderId,
    ) -> Result<(SeatId, RouteInterval)> {
        let interval = self.interval_for(key, from, to).await?;
        let seat = self
            .ledger
            .reserve(key, interval, class, order)
            .await
            .map_err(|e| BookingError::ledger("reserve", e))?;
        Ok((seat, interval))
    }

    /// Counts the seats of `class` still free for the journey.
    ///
    /// Advisory: a reservation placed right after this answer may still
    /// find the run sold out.
    pub async fn left_tickets(
        &self,
        key: &TrainRunKey,
        from: &str,
        to: &str,
        class: SeatClass,
    ) -> Result<u32> {
        let interval = self.interval_for(key, from, to).await?;
        self.ledger
            .available(key, interval, class)
            .await
            .map_err(|e| BookingError::ledger("available", e))
    }

    async fn lookup(&self, key: &TrainRunKey, station: &str) -> Result<u32> {
        self.directory
            .station_index(key, station)
            .await?
            .ok_or_else(|| BookingError::StationNotFound {
                key: key.clone(),
                station: station.to_string(),
            })
    }
}
