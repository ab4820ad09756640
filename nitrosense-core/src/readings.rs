//! Reading types produced by the two feeds
//!
//! Both readings are stamped with the local receipt time, not the time the
//! source measured them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Anything that carries a receipt timestamp
pub trait Timestamped {
    /// Receipt time in milliseconds since the Unix epoch
    fn timestamp(&self) -> Timestamp;
}

/// Soil nutrient reading from the NPK probe, in mg/kg
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SoilReading {
    /// Receipt time
    pub timestamp: Timestamp,
    /// Nitrogen content
    pub nitrogen: f64,
    /// Phosphorus content
    pub phosphorus: f64,
    /// Potassium content
    pub potassium: f64,
}

impl SoilReading {
    /// Build a reading
    pub fn new(timestamp: Timestamp, nitrogen: f64, phosphorus: f64, potassium: f64) -> Self {
        Self {
            timestamp,
            nitrogen,
            phosphorus,
            potassium,
        }
    }
}

impl Timestamped for SoilReading {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Ambient weather observation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeatherReading {
    /// Receipt time
    pub timestamp: Timestamp,
    /// Air temperature in °C (may be negative)
    pub temperature: f64,
    /// Precipitation over the last hour in mm
    pub precipitation: f64,
}

impl WeatherReading {
    /// Build a reading
    pub fn new(timestamp: Timestamp, temperature: f64, precipitation: f64) -> Self {
        Self {
            timestamp,
            temperature,
            precipitation,
        }
    }
}

impl Timestamped for WeatherReading {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// WGS84 position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coordinate {
    /// Latitude, north positive
    pub latitude: f64,
    /// Longitude, east positive
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Compiled-in position used when geolocation is unavailable
    pub const fn fallback() -> Self {
        Self::new(
            crate::constants::location::FALLBACK_LATITUDE,
            crate::constants::location::FALLBACK_LONGITUDE,
        )
    }

    /// Both components are finite and inside WGS84 bounds
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_nashville() {
        let c = Coordinate::fallback();
        assert_eq!(c.latitude, 36.1627);
        assert_eq!(c.longitude, -86.7816);
        assert!(c.is_valid());
    }

    #[test]
    fn coordinate_bounds() {
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::NAN).is_valid());
    }
}
