//! HTTP route handlers.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod runs;
pub mod tickets;

use common::TravelDate;
use ledger::SeatClass;

use crate::error::ApiError;

pub(crate) fn parse_travel_date(s: &str) -> Result<TravelDate, ApiError> {
    TravelDate::parse(s).map_err(|e| ApiError::BadRequest(format!("Invalid travel date: {e}")))
}

pub(crate) fn parse_seat_class(s: &str) -> Result<SeatClass, ApiError> {
    SeatClass::parse(s).ok_or_else(|| ApiError::BadRequest(format!("Unknown seat class: {s}")))
}
