//! Nitrogen optimization model
//!
//! Computes the target soil nitrogen level for the current weather and the
//! fertilizer dose needed to reach it.
//!
//! ## Model
//!
//! ```text
//! temp_response   = exp(-(T - T_ideal)² / (2σ²))                 ∈ (0, 1]
//! precip_response = P > 0 ? 1 / (1 + exp(-k (P - P_mid))) : 0     ∈ [0, 1)
//! optimal         = N_base · temp_response · (1 - precip_response)
//! ```
//!
//! Uptake peaks at the ideal temperature and falls off symmetrically. Heavy
//! precipitation leaches nitrogen, so the target drops sigmoidally once rain
//! passes the midpoint.
//!
//! The dose is `max(0, optimal - current)`; removal is never suggested.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::agronomy::*;
use crate::errors::{OptimizerError, OptimizerResult};
use crate::readings::{SoilReading, WeatherReading};

/// Tuning parameters for the model
///
/// Immutable per call. Override individual fields with struct update syntax:
///
/// ```rust
/// use nitrosense_core::OptimizerParams;
///
/// let params = OptimizerParams { ideal_temp: 18.0, ..Default::default() };
/// assert_eq!(params.base_optimal_n, 100.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizerParams {
    /// Target N under ideal conditions (mg/kg)
    pub base_optimal_n: f64,
    /// Temperature at which uptake peaks (°C)
    pub ideal_temp: f64,
    /// Standard deviation of the temperature response (°C), must be > 0
    pub temp_std_dev: f64,
    /// Precipitation at which leaching is half-max (mm)
    pub precip_midpoint: f64,
    /// Sigmoid steepness (1/mm)
    pub precip_steepness: f64,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self {
            base_optimal_n: DEFAULT_BASE_OPTIMAL_N,
            ideal_temp: DEFAULT_IDEAL_TEMP_C,
            temp_std_dev: DEFAULT_TEMP_STD_DEV_C,
            precip_midpoint: DEFAULT_PRECIP_MIDPOINT_MM,
            precip_steepness: DEFAULT_PRECIP_STEEPNESS,
        }
    }
}

impl OptimizerParams {
    /// Reject parameter sets the model cannot evaluate
    pub fn validate(&self) -> OptimizerResult<()> {
        if !(self.temp_std_dev > 0.0) || !self.temp_std_dev.is_finite() {
            return Err(invalid("temp_std_dev", self.temp_std_dev));
        }

        let finite = [
            ("base_optimal_n", self.base_optimal_n),
            ("ideal_temp", self.ideal_temp),
            ("precip_midpoint", self.precip_midpoint),
            ("precip_steepness", self.precip_steepness),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(invalid(name, value));
            }
        }

        Ok(())
    }

    /// Gaussian temperature response in (0, 1]
    pub fn temperature_response(&self, temperature: f64) -> f64 {
        let deviation = temperature - self.ideal_temp;
        libm::exp(-(deviation * deviation) / (2.0 * self.temp_std_dev * self.temp_std_dev))
    }

    /// Logistic leaching response in [0, 1)
    ///
    /// Exactly zero when there is no precipitation.
    pub fn precipitation_response(&self, precipitation: f64) -> f64 {
        if precipitation > 0.0 {
            1.0 / (1.0 + libm::exp(-self.precip_steepness * (precipitation - self.precip_midpoint)))
        } else {
            0.0
        }
    }
}

fn invalid(name: &'static str, value: f64) -> OptimizerError {
    OptimizerError::InvalidArgument { name, value }
}

/// Optimal nitrogen content (mg/kg) for the given weather
///
/// Fails with [`OptimizerError::InvalidArgument`] when `precipitation` is
/// negative or not finite, or when `params` is degenerate. Inputs are never
/// clamped.
pub fn optimal_nitrogen_content(
    precipitation: f64,
    temperature: f64,
    params: &OptimizerParams,
) -> OptimizerResult<f64> {
    if !(precipitation >= 0.0) || !precipitation.is_finite() {
        return Err(invalid("precipitation", precipitation));
    }
    if !temperature.is_finite() {
        return Err(invalid("temperature", temperature));
    }
    params.validate()?;

    let temp_response = params.temperature_response(temperature);
    let precip_response = params.precipitation_response(precipitation);

    Ok(params.base_optimal_n * temp_response * (1.0 - precip_response))
}

/// Fertilizer to apply to reach `optimal`, never negative
pub fn suggested_application(optimal: f64, current_nitrogen: f64) -> f64 {
    (optimal - current_nitrogen).max(0.0)
}

/// Optimizer bound to one parameter set
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NitrogenOptimizer {
    params: OptimizerParams,
}

impl NitrogenOptimizer {
    /// Create optimizer, validating the parameters once
    pub fn new(params: OptimizerParams) -> OptimizerResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Parameters in use
    pub fn params(&self) -> &OptimizerParams {
        &self.params
    }

    /// See [`optimal_nitrogen_content`]
    pub fn optimal_nitrogen_content(&self, precipitation: f64, temperature: f64) -> OptimizerResult<f64> {
        optimal_nitrogen_content(precipitation, temperature, &self.params)
    }

    /// Recommendation for the latest pair of readings
    pub fn recommend(&self, soil: &SoilReading, weather: &WeatherReading) -> OptimizerResult<Recommendation> {
        Recommendation::compute(soil, weather, &self.params)
    }
}

/// Fertilizer suggestion derived from one soil and one weather reading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Recommendation {
    /// Model target (mg/kg)
    pub optimal: f64,
    /// Amount to apply (mg/kg), `max(0, optimal - nitrogen)`
    pub suggested: f64,
    /// Current nitrogen reading (mg/kg)
    pub nitrogen: f64,
    /// Temperature used (°C)
    pub temperature: f64,
    /// Precipitation used (mm)
    pub precipitation: f64,
}

impl Recommendation {
    /// Compute from the latest readings of both feeds
    pub fn compute(
        soil: &SoilReading,
        weather: &WeatherReading,
        params: &OptimizerParams,
    ) -> OptimizerResult<Self> {
        let optimal = optimal_nitrogen_content(weather.precipitation, weather.temperature, params)?;

        Ok(Self {
            optimal,
            suggested: suggested_application(optimal, soil.nitrogen),
            nitrogen: soil.nitrogen,
            temperature: weather.temperature,
            precipitation: weather.precipitation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn peak_conditions_give_base_value() {
        let n = optimal_nitrogen_content(0.0, 22.0, &OptimizerParams::default()).unwrap();
        assert_eq!(n, 100.0);
    }

    #[test]
    fn midpoint_precipitation_halves_target() {
        let params = OptimizerParams::default();
        assert!((params.precipitation_response(50.0) - 0.5).abs() < EPS);

        let n = optimal_nitrogen_content(50.0, 22.0, &params).unwrap();
        assert!((n - 50.0).abs() < EPS);
    }

    #[test]
    fn negative_precipitation_is_rejected() {
        let err = optimal_nitrogen_content(-1.0, 22.0, &OptimizerParams::default()).unwrap_err();
        assert_eq!(err, OptimizerError::InvalidArgument { name: "precipitation", value: -1.0 });
    }

    #[test]
    fn nan_precipitation_is_rejected() {
        assert!(optimal_nitrogen_content(f64::NAN, 22.0, &OptimizerParams::default()).is_err());
    }

    #[test]
    fn zero_std_dev_is_rejected() {
        let params = OptimizerParams { temp_std_dev: 0.0, ..Default::default() };
        assert!(NitrogenOptimizer::new(params).is_err());
        assert!(optimal_nitrogen_content(0.0, 22.0, &params).is_err());
    }

    #[test]
    fn one_std_dev_off_ideal() {
        let n = optimal_nitrogen_content(0.0, 27.0, &OptimizerParams::default()).unwrap();
        // exp(-0.5)
        assert!((n - 60.653_065_971_263_34).abs() < 1e-9);
    }

    #[test]
    fn recommendation_scenario() {
        let soil = SoilReading::new(1, 40.0, 0.0, 0.0);
        let weather = WeatherReading::new(1, 22.0, 0.0);

        let rec = Recommendation::compute(&soil, &weather, &OptimizerParams::default()).unwrap();
        assert!((rec.optimal - 100.0).abs() < EPS);
        assert!((rec.suggested - 60.0).abs() < EPS);
    }

    #[test]
    fn never_suggests_removal() {
        let soil = SoilReading::new(1, 140.0, 0.0, 0.0);
        let weather = WeatherReading::new(1, 22.0, 0.0);

        let rec = NitrogenOptimizer::default().recommend(&soil, &weather).unwrap();
        assert_eq!(rec.suggested, 0.0);
    }

    #[test]
    fn params_override_is_per_call() {
        let custom = OptimizerParams { base_optimal_n: 80.0, ..Default::default() };
        let a = optimal_nitrogen_content(0.0, 22.0, &custom).unwrap();
        let b = optimal_nitrogen_content(0.0, 22.0, &OptimizerParams::default()).unwrap();

        assert_eq!(a, 80.0);
        assert_eq!(b, 100.0);
    }
}
