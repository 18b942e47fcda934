//! Seat allocation and order lifecycle coordination.
//!
//! This crate ties the interval ledger to the partitioned order stores.
//! [`SeatAllocator`] turns station-named journeys into route intervals
//! and claims seats; [`LifecycleCoordinator`] creates orders with
//! compensation when persistence fails and drives status changes
//! through guarded, retried-once compare-and-swap writes. External
//! collaborators (route directory, notifications) sit behind traits in
//! [`services`] with in-memory implementations for tests.

pub mod allocator;
pub mod coordinator;
pub mod error;
pub mod services;

pub use allocator::SeatAllocator;
pub use coordinator::{LifecycleCoordinator, NewOrder};
pub use error::{BookingError, Result};
pub use services::directory::{
    DirectoryClient, DirectoryError, InMemoryRouteDirectory, RouteDirectory,
};
pub use services::notify::{InMemoryNotifier, Notifier, NotifyError};
