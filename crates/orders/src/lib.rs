//! Order records and the guarded status state machine.

pub mod error;
pub mod order;
pub mod status;

pub use common::{AccountId, OrderId};
pub use error::OrderError;
pub use order::Order;
pub use status::OrderStatus;
