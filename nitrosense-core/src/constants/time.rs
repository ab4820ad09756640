//! Time-Related Constants
//!
//! Poll intervals for the two feeds and the bounds placed on them.

// ===== POLL INTERVALS =====

/// Soil sensor poll interval (milliseconds).
///
/// The probe pushes N/P/K to the store roughly every 500 ms, so a 2 s poll
/// keeps the chart current without hammering the database.
pub const SENSOR_POLL_INTERVAL_MS: u64 = 2000;

/// Weather poll interval (milliseconds).
///
/// Provider data changes on the order of minutes; 5 s is enough to follow a
/// moving device while staying well under free-tier rate limits.
pub const WEATHER_POLL_INTERVAL_MS: u64 = 5000;

/// Shortest poll interval accepted from configuration (milliseconds).
pub const MIN_POLL_INTERVAL_MS: u64 = 100;
