//! Live Soil and Weather Feeds for NitroSense
//!
//! ## Overview
//!
//! Two independent feeds poll their remote sources on fixed intervals and
//! publish `{latest, error}` snapshots. The [`Dashboard`] consumes both and
//! produces a fertilizer recommendation whenever both have a reading.
//!
//! ```text
//! Scheduler tick ─▶ SensorFeed  ─▶ soil store   ─┐
//!                                                ├─▶ Dashboard ─▶ Recommendation
//! Scheduler tick ─▶ WeatherFeed ─▶ geolocation  ─┘
//!                               └▶ weather API
//! ```
//!
//! ## Feed lifecycle
//!
//! - `start` acquires immediately, then once per interval
//! - a slow acquisition does not delay the next tick; outcomes of older
//!   attempts are discarded once a newer one has settled
//! - errors are kept on the feed and the last good reading stays available
//! - `stop` (or dropping the handle) cancels the timer, and anything still
//!   in flight no longer touches the state
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use nitrosense_feeds::{Dashboard, DashboardConfig, TokioScheduler};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DashboardConfig::from_env()?;
//! let scheduler = TokioScheduler::try_current()?;
//! let mut dashboard = Dashboard::connect(&config, &scheduler)?;
//!
//! while dashboard.changed().await {
//!     if let Some(rec) = dashboard.recommendation()? {
//!         println!("apply {:.2} mg/kg", rec.suggested);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod dashboard;
pub mod feed;
pub mod scheduler;
pub mod sensor;
pub mod weather;

use thiserror::Error;

pub use config::{ConfigError, DashboardConfig, GeolocationMode};
pub use dashboard::{Dashboard, DashboardSources, Panel};
pub use feed::{AcquisitionPhase, AttemptTrace, FeedSubscription};
pub use scheduler::{CancelToken, Scheduler, Task, TokioScheduler, TokioTime};
pub use sensor::SensorFeed;
pub use weather::WeatherFeed;

/// Errors raised while setting feeds up
///
/// Once running, feeds never return errors; they hold them in their
/// snapshots.
#[derive(Debug, Error)]
pub enum FeedsError {
    /// Feeds spawn their acquisitions on the current tokio runtime
    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Connector could not be built
    #[error("connector setup failed: {0}")]
    Connector(#[from] nitrosense_connectors::HttpError),

    /// Optimizer parameters rejected
    #[error("invalid optimizer parameters: {0}")]
    Optimizer(#[from] nitrosense_core::OptimizerError),
}
