//! Constants for NitroSense Core
//!
//! Centralized, documented constants used throughout the system. Values
//! that describe a deployment (poll intervals, fallback position) live here
//! rather than as magic numbers at the call site.
//!
//! ## Organization
//!
//! - **Time**: poll intervals
//! - **Buffers**: chart window sizes
//! - **Agronomy**: default parameters of the nitrogen model
//! - **Location**: fallback coordinate and source paths

/// Poll intervals.
pub mod time;

/// Chart window sizes.
pub mod buffers;

/// Default parameters of the nitrogen optimization model.
pub mod agronomy;

/// Fallback position and remote source paths.
pub mod location;

// Re-export commonly used constants for convenience
pub use time::{MIN_POLL_INTERVAL_MS, SENSOR_POLL_INTERVAL_MS, WEATHER_POLL_INTERVAL_MS};

pub use buffers::SERIES_CAPACITY;

pub use agronomy::{
    DEFAULT_BASE_OPTIMAL_N, DEFAULT_IDEAL_TEMP_C, DEFAULT_PRECIP_MIDPOINT_MM,
    DEFAULT_PRECIP_STEEPNESS, DEFAULT_TEMP_STD_DEV_C,
};

pub use location::{FALLBACK_LATITUDE, FALLBACK_LONGITUDE, SOIL_NODE_PATH};
