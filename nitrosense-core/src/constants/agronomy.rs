//! Nitrogen Model Defaults
//!
//! Default parameters for the Gaussian-temperature × logistic-precipitation
//! model in [`crate::optimizer`].

/// Target nitrogen under ideal conditions (mg/kg).
pub const DEFAULT_BASE_OPTIMAL_N: f64 = 100.0;

/// Temperature at which uptake peaks (°C).
pub const DEFAULT_IDEAL_TEMP_C: f64 = 22.0;

/// Width of the temperature response (°C).
///
/// At ±5 °C from ideal the response is ~0.61, at ±10 °C ~0.14.
pub const DEFAULT_TEMP_STD_DEV_C: f64 = 5.0;

/// Precipitation at which leaching reaches half its maximum (mm).
pub const DEFAULT_PRECIP_MIDPOINT_MM: f64 = 50.0;

/// Steepness of the leaching sigmoid (1/mm).
pub const DEFAULT_PRECIP_STEEPNESS: f64 = 0.1;
