//! Core data model for NitroSense
//!
//! Fuses periodic soil-nutrient readings with periodic weather observations
//! and turns them into a nitrogen fertilizer recommendation.
//!
//! This crate holds everything that does not need an async runtime:
//! - Reading types for both feeds
//! - The rolling [`SeriesBuffer`] that backs the trend charts
//! - The per-feed state machine ([`FeedState`]) with staleness rules
//! - The nitrogen optimization model
//!
//! ```no_run
//! use nitrosense_core::{Recommendation, SoilReading, WeatherReading, OptimizerParams};
//!
//! let soil = SoilReading::new(1_000, 40.0, 12.0, 30.0);
//! let weather = WeatherReading::new(1_000, 22.0, 0.0);
//!
//! let rec = Recommendation::compute(&soil, &weather, &OptimizerParams::default())?;
//! assert!((rec.suggested - 60.0).abs() < 1e-9);
//! # Ok::<(), nitrosense_core::OptimizerError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

pub mod buffer;
pub mod constants;
pub mod errors;
pub mod feed_state;
pub mod optimizer;
pub mod readings;
pub mod time;

// Public API
pub use buffer::SeriesBuffer;
pub use errors::{FeedError, OptimizerError, OptimizerResult};
pub use feed_state::{AttemptId, Disposition, FeedSnapshot, FeedState, FeedView};
pub use optimizer::{optimal_nitrogen_content, NitrogenOptimizer, OptimizerParams, Recommendation};
pub use readings::{Coordinate, SoilReading, Timestamped, WeatherReading};
pub use time::{ReceiptClock, TimeSource, Timestamp};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
