//! The two physical order partitions and the creation-time routing rule.

use common::TrainNumber;
use serde::{Deserialize, Serialize};

/// One of the two independent order stores.
///
/// An order is written to exactly one partition, chosen from its train
/// number at creation time, and never moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Partition {
    /// Holds orders for high-speed trains.
    Primary,
    /// Holds orders for everything else.
    Secondary,
}

impl Partition {
    /// The deterministic shard rule: high-speed train numbers (prefix
    /// `G`, `D` or `C`, case-insensitive) go to the primary partition,
    /// all other services to the secondary one.
    pub fn for_train(train: &TrainNumber) -> Self {
        match train.as_str().chars().next() {
            Some(c) if matches!(c.to_ascii_uppercase(), 'G' | 'D' | 'C') => Partition::Primary,
            _ => Partition::Secondary,
        }
    }

    /// The other partition.
    pub fn other(&self) -> Self {
        match self {
            Partition::Primary => Partition::Secondary,
            Partition::Secondary => Partition::Primary,
        }
    }

    /// Returns the partition name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Primary => "primary",
            Partition::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
