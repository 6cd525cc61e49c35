//! Logical time.
//!
//! Time is an externally supplied, monotonically non-decreasing counter
//! (a block height). Every operation reads it exactly once.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A block height, the unit every governance period is measured in.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockHeight(u64);

impl BlockHeight {
    /// The first height.
    pub const GENESIS: Self = Self(0);

    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// `self + blocks`, or `None` on overflow.
    pub fn checked_add(self, blocks: u64) -> Option<Self> {
        self.0.checked_add(blocks).map(Self)
    }

    /// Blocks from `self` until `later` (zero if `later` is not after `self`).
    pub fn blocks_until(&self, later: BlockHeight) -> u64 {
        later.0.saturating_sub(self.0)
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source of the current block height.
///
/// Implementations must never go backwards.
pub trait Clock: Send + Sync {
    fn now(&self) -> BlockHeight;
}
