//! Nullable clock with a deterministic block height for testing.

use agora_types::{BlockHeight, Clock};
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic clock for testing.
///
/// Height only advances when you tell it to.
pub struct NullClock {
    current: AtomicU64,
}

impl NullClock {
    pub fn new(initial_height: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_height),
        }
    }

    /// Advance by a number of blocks.
    pub fn advance(&self, blocks: u64) {
        self.current.fetch_add(blocks, Ordering::SeqCst);
    }

    /// Jump forward to `height`. Earlier heights are ignored, so the clock
    /// never goes backwards.
    pub fn set(&self, height: u64) {
        self.current.fetch_max(height, Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> BlockHeight {
        BlockHeight::new(self.current.load(Ordering::SeqCst))
    }
}
