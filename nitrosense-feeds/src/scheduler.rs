//! Periodic task scheduling
//!
//! Feeds do not own timers. They hand a tick closure to a [`Scheduler`] and
//! keep the returned [`CancelToken`]. The tokio implementation runs on
//! `tokio::time`, so tests with a paused runtime get a virtual clock for
//! free.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nitrosense_core::{TimeSource, Timestamp};
use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Work run on every tick
pub type Task = Box<dyn FnMut() + Send + 'static>;

/// Runs tasks on a fixed period
pub trait Scheduler: Send + Sync {
    /// Run `task` now, then every `interval` until the token is cancelled
    fn schedule_every(&self, interval: Duration, task: Task) -> CancelToken;
}

/// Stops a scheduled task
///
/// Cancelling is idempotent. Dropping the token cancels as well.
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CancelToken {
    /// Token over a shared flag and an optional timer task to abort
    pub fn new(cancelled: Arc<AtomicBool>, handle: Option<JoinHandle<()>>) -> Self {
        Self { cancelled, handle }
    }

    /// Prevent any further runs
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    /// Whether [`cancel`](Self::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for CancelToken {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Scheduler backed by `tokio::time::interval`
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    /// Scheduler on an explicit runtime
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Scheduler on the runtime we are currently inside
    pub fn try_current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_every(&self, interval: Duration, mut task: Task) -> CancelToken {
        // tokio::time::interval panics on a zero period
        let interval = interval.max(Duration::from_millis(1));
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        let handle = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // A late tick is not followed by a burst of catch-up ticks
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                task();
            }
        });

        CancelToken::new(cancelled, Some(handle))
    }
}

/// Millisecond clock that follows tokio's clock
///
/// Reads `origin_ms` at construction and advances with
/// `tokio::time::Instant`, so a paused test runtime moves it virtually.
#[derive(Debug, Clone)]
pub struct TokioTime {
    origin: Instant,
    origin_ms: Timestamp,
}

impl TokioTime {
    /// Clock that reads `origin_ms` right now
    pub fn starting_at(origin_ms: Timestamp) -> Self {
        Self {
            origin: Instant::now(),
            origin_ms,
        }
    }
}

impl TimeSource for TokioTime {
    fn now(&self) -> Timestamp {
        self.origin_ms + self.origin.elapsed().as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}
