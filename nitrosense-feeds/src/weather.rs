//! Ambient weather feed
//!
//! Every tick walks `Locating -> Fetching -> Succeeded | Failed`:
//!
//! 1. Ask the geolocator for a position. A refusal, or a host without a
//!    geolocator, is recorded as the feed error and the fallback position is
//!    used instead. The attempt goes on.
//! 2. Fetch current conditions for that position.
//! 3. Stamp the observation at receipt, or record the provider failure.
//!
//! The position is asked for again on every tick, so a moving device is
//! followed.

use std::sync::Arc;
use std::time::Duration;

use nitrosense_connectors::{Geolocator, WeatherProvider};
use nitrosense_core::{AttemptId, Coordinate, FeedError, ReceiptClock, WeatherReading};
use tokio::runtime::Handle;

use crate::feed::{self, AcquisitionPhase, FeedCore, FeedSubscription};
use crate::scheduler::Scheduler;
use crate::FeedsError;

/// Polls a weather provider at the device position
pub struct WeatherFeed;

#[derive(Clone)]
struct Sources {
    provider: Arc<dyn WeatherProvider>,
    geolocator: Option<Arc<dyn Geolocator>>,
    fallback: Coordinate,
}

impl WeatherFeed {
    /// Start polling every `interval`, beginning immediately
    ///
    /// `geolocator` is `None` on hosts without the capability. `fallback` is
    /// used whenever no position can be had.
    pub fn start(
        provider: Arc<dyn WeatherProvider>,
        geolocator: Option<Arc<dyn Geolocator>>,
        clock: Arc<ReceiptClock>,
        scheduler: &dyn Scheduler,
        interval: Duration,
        fallback: Coordinate,
    ) -> Result<FeedSubscription<WeatherReading>, FeedsError> {
        let runtime = Handle::try_current()?;
        let core = Arc::new(FeedCore::new("weather", clock));
        let sources = Sources {
            provider,
            geolocator,
            fallback,
        };

        Ok(feed::run(core, scheduler, interval, runtime, move |core, attempt| {
            acquire(sources.clone(), core, attempt)
        }))
    }
}

async fn acquire(sources: Sources, core: Arc<FeedCore<WeatherReading>>, attempt: AttemptId) {
    let position = locate(&sources, &core, attempt).await;
    core.fetching_at(attempt, position);

    match sources.provider.current(position).await {
        Ok(observation) => {
            let reading = WeatherReading::new(
                core.stamp(),
                observation.temperature,
                observation.precipitation,
            );
            log::debug!(
                "weather feed: attempt {} at {},{}: {} °C, {} mm",
                attempt,
                position.latitude,
                position.longitude,
                reading.temperature,
                reading.precipitation
            );
            core.accept(attempt, reading);
        }
        Err(err) => core.reject(attempt, FeedError::transport(err.to_string())),
    }
}

async fn locate(
    sources: &Sources,
    core: &FeedCore<WeatherReading>,
    attempt: AttemptId,
) -> Coordinate {
    core.enter(attempt, AcquisitionPhase::Locating);

    let reason = match &sources.geolocator {
        None => FeedError::geolocation_unsupported(),
        Some(geolocator) => match geolocator.locate().await {
            Ok(position) => return position,
            Err(err) => {
                log::debug!("weather feed: geolocation failed: {}", err);
                FeedError::geolocation_denied()
            }
        },
    };

    log::warn!(
        "weather feed: {}, using {},{}",
        reason,
        sources.fallback.latitude,
        sources.fallback.longitude
    );
    core.fallback(attempt, reason);
    sources.fallback
}
