//! Time management for the feeds
//!
//! Provides clock abstraction to handle different time sources:
//! - System clock (wall time, may step backwards under NTP)
//! - Fixed and manual clocks (for tests and virtual-time runs)
//!
//! Readings are stamped at *receipt* time through a [`ReceiptClock`], which
//! never hands out a timestamp older than the last one it issued.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};

/// Timestamp in milliseconds since the Unix epoch
pub type Timestamp = u64;

/// Source of time for the system
pub trait TimeSource: Send + Sync {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Check if this source provides wall clock time (vs monotonic)
    fn is_wall_clock(&self) -> bool;
}

/// System time source (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone, Default)]
pub struct SystemTime;

#[cfg(feature = "std")]
impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime as StdSystemTime, UNIX_EPOCH};

        StdSystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Fixed time source for testing
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    /// Create a clock frozen at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    /// Move the clock forward
    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// Shareable clock that tests can move while feeds are running
///
/// Clones share the same underlying counter.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    timestamp: Arc<AtomicU64>,
}

impl ManualTime {
    /// Create a clock starting at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp: Arc::new(AtomicU64::new(timestamp)),
        }
    }

    /// Move the clock to an absolute time (may go backwards)
    pub fn set(&self, timestamp: Timestamp) {
        self.timestamp.store(timestamp, Ordering::SeqCst);
    }

    /// Move the clock forward
    pub fn advance(&self, ms: u64) {
        self.timestamp.fetch_add(ms, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Timestamp {
        self.timestamp.load(Ordering::SeqCst)
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// Stamps readings at receipt time
///
/// If the underlying source steps backwards (clock adjustment), the last
/// issued stamp is repeated instead, so successive stamps are monotonically
/// non-decreasing.
pub struct ReceiptClock {
    source: Box<dyn TimeSource>,
    last_issued: AtomicU64,
}

impl ReceiptClock {
    /// Wrap a time source
    pub fn new(source: Box<dyn TimeSource>) -> Self {
        Self {
            source,
            last_issued: AtomicU64::new(0),
        }
    }

    /// Receipt clock over the system wall clock
    #[cfg(feature = "std")]
    pub fn system() -> Self {
        Self::new(Box::new(SystemTime))
    }

    /// Issue a receipt timestamp
    pub fn stamp(&self) -> Timestamp {
        let current = self.source.now();
        let previous = self.last_issued.fetch_max(current, Ordering::AcqRel);

        if current < previous {
            log_clock_step(previous, current);
        }

        current.max(previous)
    }

    /// Whether stamps represent wall-clock time
    pub fn is_wall_clock(&self) -> bool {
        self.source.is_wall_clock()
    }
}

#[cfg(feature = "log")]
fn log_clock_step(previous: Timestamp, current: Timestamp) {
    log::debug!("clock stepped back {} ms, holding at {}", previous - current, previous);
}

#[cfg(not(feature = "log"))]
fn log_clock_step(_previous: Timestamp, _current: Timestamp) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_advances() {
        let mut time = FixedTime::new(1000);
        assert_eq!(time.now(), 1000);

        time.advance(500);
        assert_eq!(time.now(), 1500);
    }

    #[test]
    fn manual_time_is_shared_between_clones() {
        let time = ManualTime::new(10);
        let other = time.clone();

        other.advance(5);
        assert_eq!(time.now(), 15);
    }

    #[test]
    fn receipt_stamps_never_go_backwards() {
        let time = ManualTime::new(5_000);
        let clock = ReceiptClock::new(Box::new(time.clone()));

        assert_eq!(clock.stamp(), 5_000);

        // NTP step backwards
        time.set(4_000);
        assert_eq!(clock.stamp(), 5_000);

        time.set(6_000);
        assert_eq!(clock.stamp(), 6_000);
    }
}
