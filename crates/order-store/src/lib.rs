//! Partitioned persistence for ticket orders.
//!
//! Orders are split across two partitions by train-number prefix
//! ([`Partition::for_train`]): high-speed trains (G/D/C) land on the
//! primary partition, everything else on the secondary. The
//! [`OrderStore`] trait is the per-partition storage contract, with an
//! in-memory implementation for tests and a Postgres implementation
//! for production. [`PartitionRouter`] sits on top and fans reads out
//! across both partitions, never mistaking an unreachable partition for
//! a missing order.

pub mod error;
pub mod memory;
pub mod partition;
pub mod postgres;
pub mod router;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use partition::Partition;
pub use postgres::PostgresOrderStore;
pub use router::PartitionRouter;
pub use store::{OrderStore, OrderStoreExt};
