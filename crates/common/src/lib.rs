//! Shared identity types for the seat inventory and order lifecycle core.

pub mod types;

pub use types::{AccountId, OrderId, TrainNumber, TrainRunKey, TravelDate};
