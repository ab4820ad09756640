//! Soil nutrient feed

use std::sync::Arc;
use std::time::Duration;

use nitrosense_connectors::SoilSource;
use nitrosense_core::constants::location::SOIL_NODE_PATH;
use nitrosense_core::{AttemptId, FeedError, ReceiptClock, SoilReading};
use tokio::runtime::Handle;

use crate::feed::{self, AcquisitionPhase, FeedCore, FeedSubscription};
use crate::scheduler::Scheduler;
use crate::FeedsError;

/// Polls the `soil` node of a key-value store
pub struct SensorFeed;

impl SensorFeed {
    /// Start polling `source` every `interval`, beginning immediately
    ///
    /// Must be called from inside a tokio runtime; acquisitions are spawned
    /// on it.
    pub fn start(
        source: Arc<dyn SoilSource>,
        clock: Arc<ReceiptClock>,
        scheduler: &dyn Scheduler,
        interval: Duration,
    ) -> Result<FeedSubscription<SoilReading>, FeedsError> {
        let runtime = Handle::try_current()?;
        let core = Arc::new(FeedCore::new("sensor", clock));

        Ok(feed::run(core, scheduler, interval, runtime, move |core, attempt| {
            acquire(source.clone(), core, attempt)
        }))
    }
}

async fn acquire(source: Arc<dyn SoilSource>, core: Arc<FeedCore<SoilReading>>, attempt: AttemptId) {
    core.enter(attempt, AcquisitionPhase::Fetching);

    match source.read_node(SOIL_NODE_PATH).await {
        Ok(Some(node)) => {
            let reading = SoilReading::new(
                core.stamp(),
                node.nitrogen.unwrap_or(0.0),
                node.phosphorus.unwrap_or(0.0),
                node.potassium.unwrap_or(0.0),
            );
            log::debug!("sensor feed: attempt {} read N={}", attempt, reading.nitrogen);
            core.accept(attempt, reading);
        }
        Ok(None) => core.reject(attempt, FeedError::no_sensor_data()),
        Err(err) => core.reject(attempt, FeedError::transport(err.to_string())),
    }
}
