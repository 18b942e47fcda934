//! Interval ledger for train seat inventory.
//!
//! Tracks, per train run, which seats are occupied over which half-open
//! spans of station indices, and allocates seats to new journeys without
//! ever double-selling an overlapping span.

pub mod error;
pub mod interval;
pub mod ledger;
pub mod seat;

pub use common::{OrderId, TrainRunKey};
pub use error::{LedgerError, Result};
pub use interval::RouteInterval;
pub use ledger::{Reservation, SeatLedger};
pub use seat::{Seat, SeatClass, SeatId, TrainLayout, TrainLayoutBuilder};
