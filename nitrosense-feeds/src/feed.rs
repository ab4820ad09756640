//! Shared feed machinery
//!
//! Both feeds are a [`FeedState`] behind a mutex, a watch channel that
//! publishes every accepted change, and a tick closure handed to a
//! [`Scheduler`]. Each tick reserves an attempt id and spawns the
//! acquisition as its own task; slow acquisitions may overlap and the
//! ordering rules in [`FeedState`] decide which outcomes still count.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use nitrosense_core::{
    AttemptId, Coordinate, Disposition, FeedError, FeedSnapshot, FeedState, FeedView,
    ReceiptClock, Timestamp, Timestamped,
};
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::scheduler::{CancelToken, Scheduler};

/// Step of a single acquisition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionPhase {
    /// Asking the host for its position
    Locating,
    /// Waiting on the remote source
    Fetching,
    /// Reading obtained
    Succeeded,
    /// Attempt failed
    Failed,
    /// Outcome arrived too late to be applied
    Discarded,
}

/// What the most recent attempt went through
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptTrace {
    /// Attempt id
    pub attempt: AttemptId,
    /// Phases in the order they were entered
    pub phases: Vec<AcquisitionPhase>,
    /// Geolocation fallback reason, if the fallback position was used
    pub geolocation: Option<FeedError>,
    /// Position the weather was fetched for
    pub coordinate: Option<Coordinate>,
}

impl AttemptTrace {
    fn new(attempt: AttemptId) -> Self {
        Self {
            attempt,
            phases: Vec::new(),
            geolocation: None,
            coordinate: None,
        }
    }

    /// Last phase entered
    pub fn phase(&self) -> Option<AcquisitionPhase> {
        self.phases.last().copied()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// State and channels of one running feed
pub(crate) struct FeedCore<R: Timestamped + Copy> {
    name: &'static str,
    state: Mutex<FeedState<R>>,
    // Taken on stop so receivers see the channel close
    snapshots: Mutex<Option<watch::Sender<FeedSnapshot<R>>>>,
    stopped: watch::Sender<bool>,
    clock: Arc<ReceiptClock>,
    trace: Mutex<Option<AttemptTrace>>,
}

impl<R> FeedCore<R>
where
    R: Timestamped + Copy + Send + Sync + 'static,
{
    pub(crate) fn new(name: &'static str, clock: Arc<ReceiptClock>) -> Self {
        Self {
            name,
            state: Mutex::new(FeedState::new()),
            snapshots: Mutex::new(Some(watch::Sender::new(FeedSnapshot::default()))),
            stopped: watch::Sender::new(false),
            clock,
            trace: Mutex::new(None),
        }
    }

    /// Receipt time for a reading obtained now
    pub(crate) fn stamp(&self) -> Timestamp {
        self.clock.stamp()
    }

    fn begin_attempt(&self) -> Option<AttemptId> {
        let mut state = lock(&self.state);
        if state.is_stopped() {
            return None;
        }
        Some(state.begin_attempt())
    }

    pub(crate) fn enter(&self, attempt: AttemptId, phase: AcquisitionPhase) {
        self.with_trace(attempt, |trace| trace.phases.push(phase));
    }

    pub(crate) fn fetching_at(&self, attempt: AttemptId, position: Coordinate) {
        self.with_trace(attempt, |trace| {
            trace.coordinate = Some(position);
            trace.phases.push(AcquisitionPhase::Fetching);
        });
    }

    pub(crate) fn accept(&self, attempt: AttemptId, reading: R) {
        let outcome = {
            let mut state = lock(&self.state);
            let outcome = state.accept(attempt, reading);
            self.settle(&state, attempt, outcome);
            outcome
        };
        self.conclude(attempt, outcome, AcquisitionPhase::Succeeded);
    }

    pub(crate) fn reject(&self, attempt: AttemptId, error: FeedError) {
        let message = error.to_string();
        let outcome = {
            let mut state = lock(&self.state);
            let outcome = state.reject(attempt, error);
            self.settle(&state, attempt, outcome);
            outcome
        };
        if outcome.is_accepted() {
            log::warn!("{} feed: attempt {} failed: {}", self.name, attempt, message);
        }
        self.conclude(attempt, outcome, AcquisitionPhase::Failed);
    }

    fn conclude(&self, attempt: AttemptId, outcome: Disposition, applied: AcquisitionPhase) {
        let phase = match outcome {
            Disposition::Accepted => applied,
            Disposition::Stopped => return,
            Disposition::Superseded | Disposition::OutOfOrder => AcquisitionPhase::Discarded,
        };
        self.enter(attempt, phase);
    }

    /// Geolocation fell back; the attempt carries on
    pub(crate) fn fallback(&self, attempt: AttemptId, error: FeedError) {
        self.with_trace(attempt, |trace| trace.geolocation = Some(error.clone()));
        let mut state = lock(&self.state);
        let outcome = state.note(attempt, error);
        self.settle(&state, attempt, outcome);
    }

    fn settle(&self, state: &FeedState<R>, attempt: AttemptId, outcome: Disposition) {
        match outcome {
            Disposition::Accepted => {
                if let Some(snapshots) = lock(&self.snapshots).as_ref() {
                    snapshots.send_replace(state.snapshot());
                }
            }
            Disposition::Stopped => {}
            other => log::debug!("{} feed: attempt {} dropped ({:?})", self.name, attempt, other),
        }
    }

    fn stop(&self) {
        let mut state = lock(&self.state);
        if state.is_stopped() {
            return;
        }
        state.stop();
        lock(&self.snapshots).take();
        self.stopped.send_replace(true);
        log::info!("{} feed stopped", self.name);
    }

    async fn until_stopped(&self) {
        let mut stopped = self.stopped.subscribe();
        // A closed channel also means nobody will apply outcomes any more
        let _ = stopped.wait_for(|stopped| *stopped).await;
    }

    fn with_trace(&self, attempt: AttemptId, update: impl FnOnce(&mut AttemptTrace)) {
        let mut slot = lock(&self.trace);
        match slot.as_mut() {
            Some(trace) if trace.attempt == attempt => update(trace),
            Some(trace) if trace.attempt > attempt => {}
            _ => {
                let mut trace = AttemptTrace::new(attempt);
                update(&mut trace);
                *slot = Some(trace);
            }
        }
    }
}

/// Wire `acquire` to `scheduler`, spawning one task per tick on `runtime`
pub(crate) fn run<R, F, Fut>(
    core: Arc<FeedCore<R>>,
    scheduler: &dyn Scheduler,
    interval: Duration,
    runtime: Handle,
    acquire: F,
) -> FeedSubscription<R>
where
    R: Timestamped + Copy + Send + Sync + 'static,
    F: Fn(Arc<FeedCore<R>>, AttemptId) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    log::info!("{} feed started, every {} ms", core.name, interval.as_millis());

    let ticking = core.clone();
    let timer = scheduler.schedule_every(
        interval,
        Box::new(move || {
            let Some(attempt) = ticking.begin_attempt() else {
                return;
            };
            log::debug!("{} feed: attempt {}", ticking.name, attempt);

            let work = acquire(ticking.clone(), attempt);
            let watcher = ticking.clone();
            runtime.spawn(async move {
                tokio::select! {
                    _ = work => {}
                    _ = watcher.until_stopped() => {}
                }
            });
        }),
    );

    FeedSubscription {
        core,
        timer: Mutex::new(Some(timer)),
    }
}

/// Handle to a running feed
///
/// Dropping the handle stops the feed.
pub struct FeedSubscription<R: Timestamped + Copy + Send + Sync + 'static> {
    core: Arc<FeedCore<R>>,
    timer: Mutex<Option<CancelToken>>,
}

impl<R> FeedSubscription<R>
where
    R: Timestamped + Copy + Send + Sync + 'static,
{
    /// Stop ticking; in-flight acquisitions no longer touch the state
    pub fn stop(&self) {
        if let Some(timer) = lock(&self.timer).take() {
            timer.cancel();
        }
        self.core.stop();
    }

    /// Whether the feed has been stopped
    pub fn is_stopped(&self) -> bool {
        lock(&self.core.state).is_stopped()
    }

    /// Receiver that sees every accepted change
    ///
    /// The channel closes when the feed stops.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot<R>> {
        if let Some(snapshots) = lock(&self.core.snapshots).as_ref() {
            return snapshots.subscribe();
        }
        watch::channel(self.snapshot()).1
    }

    /// Current `{latest, error}`
    pub fn snapshot(&self) -> FeedSnapshot<R> {
        lock(&self.core.state).snapshot()
    }

    /// Current snapshot as the consumer should show it
    pub fn view(&self) -> FeedView<R> {
        self.snapshot().view()
    }

    /// Chart window, oldest first
    pub fn series(&self) -> Vec<R> {
        lock(&self.core.state).series_vec()
    }

    /// Trace of the newest attempt that has made progress
    pub fn last_attempt(&self) -> Option<AttemptTrace> {
        lock(&self.core.trace).clone()
    }

    /// Why the newest attempt used the fallback position, if it did
    pub fn geolocation_error(&self) -> Option<FeedError> {
        lock(&self.core.trace).as_ref().and_then(|t| t.geolocation.clone())
    }
}

impl<R> Drop for FeedSubscription<R>
where
    R: Timestamped + Copy + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}

impl<R> std::fmt::Debug for FeedSubscription<R>
where
    R: Timestamped + Copy + Send + Sync + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSubscription")
            .field("name", &self.core.name)
            .field("snapshot", &self.snapshot())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nitrosense_core::time::FixedTime;
    use nitrosense_core::SoilReading;

    fn core() -> FeedCore<SoilReading> {
        FeedCore::new("soil", Arc::new(ReceiptClock::new(Box::new(FixedTime::new(0)))))
    }

    fn reading(timestamp: Timestamp) -> SoilReading {
        SoilReading::new(timestamp, 1.0, 0.0, 0.0)
    }

    fn phases(core: &FeedCore<SoilReading>) -> Vec<AcquisitionPhase> {
        lock(&core.trace).as_ref().map(|t| t.phases.clone()).unwrap_or_default()
    }

    #[test]
    fn applied_outcomes_close_the_trace() {
        let core = core();
        let first = core.begin_attempt().unwrap();
        core.enter(first, AcquisitionPhase::Fetching);
        core.accept(first, reading(500));
        assert_eq!(phases(&core), vec![AcquisitionPhase::Fetching, AcquisitionPhase::Succeeded]);

        let second = core.begin_attempt().unwrap();
        core.enter(second, AcquisitionPhase::Fetching);
        core.reject(second, FeedError::transport("down"));
        assert_eq!(phases(&core), vec![AcquisitionPhase::Fetching, AcquisitionPhase::Failed]);
    }

    #[test]
    fn dropped_reading_is_traced_as_discarded() {
        let core = core();
        let first = core.begin_attempt().unwrap();
        core.accept(first, reading(500));

        let second = core.begin_attempt().unwrap();
        core.enter(second, AcquisitionPhase::Fetching);
        core.accept(second, reading(400));

        assert_eq!(phases(&core), vec![AcquisitionPhase::Fetching, AcquisitionPhase::Discarded]);
        assert_eq!(lock(&core.state).snapshot().latest.map(|r| r.timestamp), Some(500));
    }

    #[test]
    fn dropped_error_is_traced_as_discarded() {
        let core = core();
        let older = core.begin_attempt().unwrap();
        let newer = core.begin_attempt().unwrap();
        core.accept(newer, reading(500));

        // Trace follows the older attempt once the newer one has no entry
        *lock(&core.trace) = None;
        core.enter(older, AcquisitionPhase::Fetching);
        core.reject(older, FeedError::transport("late"));

        assert_eq!(phases(&core), vec![AcquisitionPhase::Fetching, AcquisitionPhase::Discarded]);
        assert_eq!(lock(&core.state).snapshot().error, None);
    }

    #[test]
    fn stop_closes_the_snapshot_channel() {
        let core = core();
        let updates = lock(&core.snapshots).as_ref().map(|s| s.subscribe()).unwrap();

        core.stop();

        assert!(updates.has_changed().is_err());
        let attempt = lock(&core.state).begin_attempt();
        core.accept(attempt, reading(100));
        assert!(phases(&core).is_empty());
    }
}
