//! Error Types for Feed Acquisition and Nitrogen Optimization
//!
//! ## Error Categories
//!
//! ### Feed errors ([`FeedError`])
//! - `SourceUnavailable`: the soil node or weather endpoint does not exist
//! - `TransportFailure`: network failure or non-success HTTP status
//! - `PermissionDenied`: the host refused to hand out a position
//! - `CapabilityUnsupported`: the host has no geolocation capability at all
//!
//! Feed errors are captured on the feed's own state and never cross the feed
//! boundary. They only hold for the tick that produced them; the next tick
//! retries from scratch.
//!
//! ### Optimizer errors ([`OptimizerError`])
//! - `InvalidArgument`: negative or non-finite precipitation, or a degenerate
//!   parameter set. This indicates a data error upstream and is always returned
//!   to the caller.
//!
//! ## Handling Strategy
//!
//! ```rust
//! use nitrosense_core::{optimal_nitrogen_content, OptimizerError, OptimizerParams};
//!
//! match optimal_nitrogen_content(-1.0, 22.0, &OptimizerParams::default()) {
//!     Ok(target) => println!("target N: {target:.2} mg/kg"),
//!     Err(OptimizerError::InvalidArgument { name, value }) => {
//!         // Upstream produced garbage - surface it, never clamp
//!         eprintln!("bad {name}: {value}");
//!     }
//! }
//! ```

use alloc::string::{String, ToString};
use thiserror_no_std::Error;

/// Result type for optimizer operations
pub type OptimizerResult<T> = Result<T, OptimizerError>;

/// Message reported when the soil node does not exist
pub const NO_SENSOR_DATA: &str = "No sensor data available";

/// Message reported when the host refuses geolocation
pub const GEOLOCATION_DENIED: &str = "Permission denied for geolocation";

/// Message reported when the host has no geolocation capability
pub const GEOLOCATION_UNSUPPORTED: &str = "Geolocation is not supported on this host";

/// Message reported when the weather provider answers with a non-success status
pub const WEATHER_FETCH_FAILED: &str = "Failed to fetch weather data";

/// Acquisition errors held on a feed's state
///
/// The payload is the user-visible message and is exactly what `Display`
/// prints, so consumers can render `error.to_string()` directly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Node or endpoint absent
    #[error("{0}")]
    SourceUnavailable(String),

    /// Network or HTTP failure
    #[error("{0}")]
    TransportFailure(String),

    /// Geolocation refused by the host
    #[error("{0}")]
    PermissionDenied(String),

    /// No geolocation capability on this host
    #[error("{0}")]
    CapabilityUnsupported(String),
}

impl FeedError {
    /// The soil node does not exist
    pub fn no_sensor_data() -> Self {
        Self::SourceUnavailable(NO_SENSOR_DATA.to_string())
    }

    /// Geolocation was refused
    pub fn geolocation_denied() -> Self {
        Self::PermissionDenied(GEOLOCATION_DENIED.to_string())
    }

    /// Geolocation is not available on this host
    pub fn geolocation_unsupported() -> Self {
        Self::CapabilityUnsupported(GEOLOCATION_UNSUPPORTED.to_string())
    }

    /// Wrap a transport-level failure message
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailure(message.into())
    }

    /// User-visible message
    pub fn message(&self) -> &str {
        match self {
            Self::SourceUnavailable(msg)
            | Self::TransportFailure(msg)
            | Self::PermissionDenied(msg)
            | Self::CapabilityUnsupported(msg) => msg,
        }
    }

    /// True for the two geolocation conditions, which never stop a weather tick
    pub fn is_geolocation(&self) -> bool {
        matches!(self, Self::PermissionDenied(_) | Self::CapabilityUnsupported(_))
    }
}

/// Optimizer input errors
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum OptimizerError {
    /// An input or parameter is outside its domain
    #[error("Invalid argument: {name} = {value}")]
    InvalidArgument {
        /// Name of the offending input
        name: &'static str,
        /// The value that was rejected
        value: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_message() {
        let err = FeedError::no_sensor_data();
        assert_eq!(err.to_string(), NO_SENSOR_DATA);
        assert_eq!(err.message(), NO_SENSOR_DATA);
    }

    #[test]
    fn geolocation_classification() {
        assert!(FeedError::geolocation_denied().is_geolocation());
        assert!(FeedError::geolocation_unsupported().is_geolocation());
        assert!(!FeedError::transport("connection reset").is_geolocation());
    }
}
