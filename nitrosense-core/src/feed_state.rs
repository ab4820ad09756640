//! Per-feed state machine
//!
//! A [`FeedState`] is owned by exactly one feed. It tracks the latest good
//! reading, the current error, and the chart window, and decides whether an
//! acquisition outcome may still be applied.
//!
//! ## Ordering
//!
//! Ticks are not de-duplicated: a slow acquisition can still be in flight
//! when the next tick fires, and the two responses may resolve in either
//! order. Nothing is applied once the feed has been stopped. Otherwise:
//!
//! - a reading is applied if its receipt stamp is at least as recent as the
//!   held `latest`, whichever attempt produced it
//! - an error (final or interim) is applied only if no newer attempt has
//!   settled yet, so a late failure never hides a fresher outcome
//!
//! Every tick takes an [`AttemptId`] up front for the second rule. Dropped
//! outcomes are reported back as a [`Disposition`].
//!
//! ## Errors and stale data
//!
//! A failed attempt sets `error` but keeps `latest`, so consumers can keep
//! showing the last good reading alongside the error (see [`FeedView`]).

use alloc::vec::Vec;

use crate::buffer::SeriesBuffer;
use crate::constants::buffers::SERIES_CAPACITY;
use crate::errors::FeedError;
use crate::readings::Timestamped;

/// Identifier handed out per tick, strictly increasing per feed
pub type AttemptId = u64;

/// What happened to an outcome handed to [`FeedState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Applied to the state
    Accepted,
    /// Error from an attempt older than one that already settled
    Superseded,
    /// Reading is older than the held `latest`
    OutOfOrder,
    /// The feed has been stopped
    Stopped,
}

impl Disposition {
    /// True if the state changed
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

/// Immutable copy of a feed's `{latest, error}`
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot<R> {
    /// Last successfully acquired reading
    pub latest: Option<R>,
    /// Error from the most recent settled attempt, if it failed
    pub error: Option<FeedError>,
}

impl<R> Default for FeedSnapshot<R> {
    fn default() -> Self {
        Self {
            latest: None,
            error: None,
        }
    }
}

impl<R: Clone> FeedSnapshot<R> {
    /// What a consumer should render for this snapshot
    pub fn view(&self) -> FeedView<R> {
        match (&self.latest, &self.error) {
            (None, None) => FeedView::Loading,
            (None, Some(err)) => FeedView::Failed(err.clone()),
            (Some(reading), None) => FeedView::Live(reading.clone()),
            (Some(reading), Some(err)) => FeedView::Stale(reading.clone(), err.clone()),
        }
    }
}

/// Consumer-facing interpretation of a snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum FeedView<R> {
    /// No reading and no error yet
    Loading,
    /// No reading has ever been obtained and the last attempt failed
    Failed(FeedError),
    /// Latest attempt succeeded
    Live(R),
    /// Last good reading, shown alongside the current error
    Stale(R, FeedError),
}

impl<R> FeedView<R> {
    /// Reading to display, if any
    pub fn reading(&self) -> Option<&R> {
        match self {
            Self::Live(r) | Self::Stale(r, _) => Some(r),
            Self::Loading | Self::Failed(_) => None,
        }
    }

    /// Error to display, if any
    pub fn error(&self) -> Option<&FeedError> {
        match self {
            Self::Failed(e) | Self::Stale(_, e) => Some(e),
            Self::Loading | Self::Live(_) => None,
        }
    }
}

/// State owned by a single feed
#[derive(Debug)]
pub struct FeedState<R: Timestamped + Copy, const N: usize = SERIES_CAPACITY> {
    latest: Option<R>,
    error: Option<FeedError>,
    series: SeriesBuffer<R, N>,
    next_attempt: AttemptId,
    last_settled: Option<AttemptId>,
    stopped: bool,
}

impl<R: Timestamped + Copy, const N: usize> FeedState<R, N> {
    /// Fresh state: no reading, no error, empty window
    pub fn new() -> Self {
        Self {
            latest: None,
            error: None,
            series: SeriesBuffer::new(),
            next_attempt: 0,
            last_settled: None,
            stopped: false,
        }
    }

    /// Reserve an id for a new acquisition
    pub fn begin_attempt(&mut self) -> AttemptId {
        self.next_attempt += 1;
        self.next_attempt
    }

    /// Apply a successful acquisition
    pub fn accept(&mut self, attempt: AttemptId, reading: R) -> Disposition {
        if self.stopped {
            return Disposition::Stopped;
        }

        if let Some(latest) = &self.latest {
            if reading.timestamp() < latest.timestamp() {
                return Disposition::OutOfOrder;
            }
        }

        self.latest = Some(reading);
        self.error = None;
        self.series.push(reading);
        self.last_settled = self.last_settled.max(Some(attempt));

        Disposition::Accepted
    }

    /// Apply a failed acquisition; `latest` is kept
    pub fn reject(&mut self, attempt: AttemptId, error: FeedError) -> Disposition {
        if let Some(blocked) = self.check(attempt) {
            return blocked;
        }

        self.error = Some(error);
        self.last_settled = Some(attempt);

        Disposition::Accepted
    }

    /// Record an interim error for an attempt that is still running
    ///
    /// Used for geolocation fallbacks: the error is visible until the attempt
    /// settles, but the attempt itself stays open.
    pub fn note(&mut self, attempt: AttemptId, error: FeedError) -> Disposition {
        if let Some(blocked) = self.check(attempt) {
            return blocked;
        }

        self.error = Some(error);

        Disposition::Accepted
    }

    /// Stop accepting outcomes; in-flight attempts become no-ops
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Whether [`stop`](Self::stop) has been called
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Last good reading
    pub fn latest(&self) -> Option<&R> {
        self.latest.as_ref()
    }

    /// Current error
    pub fn error(&self) -> Option<&FeedError> {
        self.error.as_ref()
    }

    /// Chart window
    pub fn series(&self) -> &SeriesBuffer<R, N> {
        &self.series
    }

    /// Copy of the chart window, oldest first
    pub fn series_vec(&self) -> Vec<R> {
        self.series.to_vec()
    }

    /// Owned copy of `{latest, error}`
    pub fn snapshot(&self) -> FeedSnapshot<R> {
        FeedSnapshot {
            latest: self.latest,
            error: self.error.clone(),
        }
    }

    fn check(&self, attempt: AttemptId) -> Option<Disposition> {
        if self.stopped {
            return Some(Disposition::Stopped);
        }

        match self.last_settled {
            Some(settled) if attempt <= settled => Some(Disposition::Superseded),
            _ => None,
        }
    }
}

impl<R: Timestamped + Copy, const N: usize> Default for FeedState<R, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readings::SoilReading;

    fn soil(timestamp: u64, nitrogen: f64) -> SoilReading {
        SoilReading::new(timestamp, nitrogen, 0.0, 0.0)
    }

    #[test]
    fn success_sets_latest_and_clears_error() {
        let mut state: FeedState<SoilReading> = FeedState::new();

        let a = state.begin_attempt();
        state.reject(a, FeedError::no_sensor_data());
        assert!(state.error().is_some());

        let b = state.begin_attempt();
        assert!(state.accept(b, soil(100, 12.0)).is_accepted());
        assert_eq!(state.latest().map(|r| r.nitrogen), Some(12.0));
        assert!(state.error().is_none());
        assert_eq!(state.series().len(), 1);
    }

    #[test]
    fn failure_keeps_latest() {
        let mut state: FeedState<SoilReading> = FeedState::new();

        let a = state.begin_attempt();
        state.accept(a, soil(100, 12.0));

        let b = state.begin_attempt();
        state.reject(b, FeedError::transport("connection refused"));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.latest, Some(soil(100, 12.0)));
        assert_eq!(snapshot.error, Some(FeedError::transport("connection refused")));
        assert!(matches!(snapshot.view(), FeedView::Stale(_, _)));
    }

    #[test]
    fn late_error_from_older_attempt_is_dropped() {
        let mut state: FeedState<SoilReading> = FeedState::new();

        let slow = state.begin_attempt();
        let fast = state.begin_attempt();

        assert!(state.accept(fast, soil(200, 2.0)).is_accepted());
        assert_eq!(state.reject(slow, FeedError::transport("late")), Disposition::Superseded);
        assert_eq!(state.note(slow, FeedError::geolocation_denied()), Disposition::Superseded);

        assert_eq!(state.latest().map(|r| r.nitrogen), Some(2.0));
        assert!(state.error().is_none());
    }

    #[test]
    fn late_reading_from_older_attempt_is_applied_when_fresher() {
        let mut state: FeedState<SoilReading> = FeedState::new();

        let slow = state.begin_attempt();
        let fast = state.begin_attempt();

        // Newer attempt fails first, older one then answers with a fresh stamp
        assert!(state.reject(fast, FeedError::transport("boom")).is_accepted());
        assert!(state.accept(slow, soil(3_000, 1.0)).is_accepted());

        assert_eq!(state.latest().map(|r| r.nitrogen), Some(1.0));
        assert!(state.error().is_none());
        assert_eq!(state.series().len(), 1);

        // The older attempt settling does not reopen the door for stale errors
        assert_eq!(state.reject(slow, FeedError::transport("again")), Disposition::Superseded);
    }

    #[test]
    fn late_reading_after_newer_reading_is_applied_in_stamp_order() {
        let mut state: FeedState<SoilReading> = FeedState::new();

        let slow = state.begin_attempt();
        let fast = state.begin_attempt();

        state.accept(fast, soil(200, 2.0));
        assert!(state.accept(slow, soil(250, 1.0)).is_accepted());
        assert_eq!(state.series().len(), 2);
        assert_eq!(state.latest().map(|r| r.timestamp), Some(250));
    }

    #[test]
    fn older_timestamp_is_out_of_order() {
        let mut state: FeedState<SoilReading> = FeedState::new();

        let a = state.begin_attempt();
        let b = state.begin_attempt();
        state.accept(a, soil(500, 1.0));

        assert_eq!(state.accept(b, soil(400, 2.0)), Disposition::OutOfOrder);
        assert_eq!(state.latest().map(|r| r.timestamp), Some(500));
    }

    #[test]
    fn equal_timestamp_updates_latest_but_not_series() {
        let mut state: FeedState<SoilReading> = FeedState::new();

        let a = state.begin_attempt();
        state.accept(a, soil(500, 1.0));
        let b = state.begin_attempt();

        assert!(state.accept(b, soil(500, 2.0)).is_accepted());
        assert_eq!(state.latest().map(|r| r.nitrogen), Some(2.0));
        assert_eq!(state.series().len(), 1);
    }

    #[test]
    fn stopped_state_ignores_everything() {
        let mut state: FeedState<SoilReading> = FeedState::new();
        let a = state.begin_attempt();
        state.stop();

        assert_eq!(state.accept(a, soil(1, 1.0)), Disposition::Stopped);
        assert_eq!(state.note(a, FeedError::geolocation_denied()), Disposition::Stopped);
        assert_eq!(state.snapshot(), FeedSnapshot::default());
        assert!(state.series().is_empty());
    }

    #[test]
    fn note_keeps_attempt_open() {
        let mut state: FeedState<SoilReading> = FeedState::new();
        let a = state.begin_attempt();

        state.note(a, FeedError::geolocation_denied());
        assert_eq!(state.error(), Some(&FeedError::geolocation_denied()));

        assert!(state.accept(a, soil(10, 3.0)).is_accepted());
        assert!(state.error().is_none());
    }

    #[test]
    fn views() {
        let empty: FeedSnapshot<SoilReading> = FeedSnapshot::default();
        assert_eq!(empty.view(), FeedView::Loading);

        let failed: FeedSnapshot<SoilReading> = FeedSnapshot {
            latest: None,
            error: Some(FeedError::no_sensor_data()),
        };
        assert_eq!(failed.view(), FeedView::Failed(FeedError::no_sensor_data()));
        assert!(failed.view().reading().is_none());

        let live = FeedSnapshot {
            latest: Some(soil(1, 5.0)),
            error: None,
        };
        assert_eq!(live.view().reading(), Some(&soil(1, 5.0)));
        assert!(live.view().error().is_none());
    }
}
