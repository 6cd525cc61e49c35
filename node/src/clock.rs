//! Wall-clock block heights.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use agora_types::{BlockHeight, Clock};

/// Derives the current block height from the system clock:
/// `(unix_now - genesis) / interval`.
///
/// The reported height never decreases, even if the system clock is
/// stepped backwards.
pub struct WallClock {
    genesis_unix_secs: u64,
    interval_secs: u64,
    highest: AtomicU64,
}

impl WallClock {
    /// `interval_secs` of zero is treated as one second.
    pub fn new(genesis_unix_secs: u64, interval_secs: u64) -> Self {
        Self {
            genesis_unix_secs,
            interval_secs: interval_secs.max(1),
            highest: AtomicU64::new(0),
        }
    }

    fn height_at(&self, unix_secs: u64) -> u64 {
        unix_secs.saturating_sub(self.genesis_unix_secs) / self.interval_secs
    }

    fn observe(&self, unix_secs: u64) -> BlockHeight {
        let height = self.height_at(unix_secs);
        let previous = self.highest.fetch_max(height, Ordering::SeqCst);
        BlockHeight::new(previous.max(height))
    }
}

impl Clock for WallClock {
    fn now(&self) -> BlockHeight {
        let unix_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.observe(unix_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_counts_whole_intervals() {
        let clock = WallClock::new(1_000, 600);
        assert_eq!(clock.observe(1_000), BlockHeight::new(0));
        assert_eq!(clock.observe(1_599), BlockHeight::new(0));
        assert_eq!(clock.observe(1_600), BlockHeight::new(1));
    }

    #[test]
    fn before_genesis_is_zero() {
        let clock = WallClock::new(10_000, 600);
        assert_eq!(clock.observe(5), BlockHeight::GENESIS);
    }

    #[test]
    fn never_goes_backwards() {
        let clock = WallClock::new(0, 10);
        assert_eq!(clock.observe(100), BlockHeight::new(10));
        assert_eq!(clock.observe(50), BlockHeight::new(10));
        assert_eq!(clock.observe(120), BlockHeight::new(12));
    }
}
