//! Dashboard configuration
//!
//! Built in code with the `with_*` setters, or read from the process
//! environment:
//!
//! | Variable                          | Required | Meaning                               |
//! |-----------------------------------|----------|---------------------------------------|
//! | `OPENWEATHER_API_KEY`             | yes      | weather provider key                  |
//! | `NITROSENSE_DATABASE_URL`         | yes      | soil store root URL                   |
//! | `NITROSENSE_DATABASE_AUTH`        | no       | soil store secret or ID token         |
//! | `NITROSENSE_WEATHER_URL`          | no       | weather API root (proxy, mock)        |
//! | `NITROSENSE_SENSOR_INTERVAL_MS`   | no       | soil poll period, default 2000        |
//! | `NITROSENSE_WEATHER_INTERVAL_MS`  | no       | weather poll period, default 5000     |
//! | `NITROSENSE_GEOLOCATION`          | no       | `ip` (default), `off`, or `lat,lon`   |

use std::time::Duration;

use nitrosense_connectors::weather::OPENWEATHER_BASE_URL;
use nitrosense_core::constants::time::MIN_POLL_INTERVAL_MS;
use nitrosense_core::constants::{SENSOR_POLL_INTERVAL_MS, WEATHER_POLL_INTERVAL_MS};
use nitrosense_core::{Coordinate, OptimizerParams};
use thiserror::Error;

/// Weather API key
pub const ENV_WEATHER_API_KEY: &str = "OPENWEATHER_API_KEY";
/// Soil store URL
pub const ENV_DATABASE_URL: &str = "NITROSENSE_DATABASE_URL";
/// Soil store auth token
pub const ENV_DATABASE_AUTH: &str = "NITROSENSE_DATABASE_AUTH";
/// Weather API root
pub const ENV_WEATHER_URL: &str = "NITROSENSE_WEATHER_URL";
/// Soil poll period (ms)
pub const ENV_SENSOR_INTERVAL: &str = "NITROSENSE_SENSOR_INTERVAL_MS";
/// Weather poll period (ms)
pub const ENV_WEATHER_INTERVAL: &str = "NITROSENSE_WEATHER_INTERVAL_MS";
/// Geolocation mode
pub const ENV_GEOLOCATION: &str = "NITROSENSE_GEOLOCATION";

/// Configuration errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// Required setting absent or empty
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// Setting present but unusable
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Setting name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Where the weather feed gets its position from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeolocationMode {
    /// No capability; every tick uses the fallback
    Off,
    /// Public-IP lookup
    Ip,
    /// Static install position
    Fixed(Coordinate),
}

impl std::str::FromStr for GeolocationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "ip" => Ok(Self::Ip),
            other => {
                let (lat, lon) = other
                    .split_once(',')
                    .ok_or_else(|| format!("expected ip, off or lat,lon, got {other:?}"))?;
                let lat: f64 = lat.trim().parse().map_err(|e| format!("latitude: {e}"))?;
                let lon: f64 = lon.trim().parse().map_err(|e| format!("longitude: {e}"))?;

                let position = Coordinate::new(lat, lon);
                if !position.is_valid() {
                    return Err(format!("{lat},{lon} is not a valid position"));
                }
                Ok(Self::Fixed(position))
            }
        }
    }
}

/// Everything needed to run the dashboard
#[derive(Clone)]
pub struct DashboardConfig {
    /// Weather provider key
    pub weather_api_key: String,
    /// Weather API root
    pub weather_base_url: String,
    /// Soil store root URL
    pub database_url: String,
    /// Soil store auth token
    pub database_auth: Option<String>,
    /// Soil poll period
    pub sensor_interval: Duration,
    /// Weather poll period
    pub weather_interval: Duration,
    /// Position source
    pub geolocation: GeolocationMode,
    /// Position used when geolocation fails
    pub fallback: Coordinate,
    /// Nitrogen model parameters
    pub optimizer: OptimizerParams,
}

impl std::fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("weather_base_url", &self.weather_base_url)
            .field("database_url", &self.database_url)
            .field("sensor_interval", &self.sensor_interval)
            .field("weather_interval", &self.weather_interval)
            .field("geolocation", &self.geolocation)
            .field("fallback", &self.fallback)
            .field("optimizer", &self.optimizer)
            .finish_non_exhaustive()
    }
}

impl DashboardConfig {
    /// Defaults for everything but the two required settings
    pub fn new(weather_api_key: impl Into<String>, database_url: impl Into<String>) -> Self {
        Self {
            weather_api_key: weather_api_key.into(),
            weather_base_url: OPENWEATHER_BASE_URL.to_string(),
            database_url: database_url.into(),
            database_auth: None,
            sensor_interval: Duration::from_millis(SENSOR_POLL_INTERVAL_MS),
            weather_interval: Duration::from_millis(WEATHER_POLL_INTERVAL_MS),
            geolocation: GeolocationMode::Ip,
            fallback: Coordinate::fallback(),
            optimizer: OptimizerParams::default(),
        }
    }

    /// Set the soil store auth token
    pub fn with_database_auth(mut self, token: impl Into<String>) -> Self {
        self.database_auth = Some(token.into());
        self
    }

    /// Point the weather provider somewhere else
    pub fn with_weather_base_url(mut self, url: impl Into<String>) -> Self {
        self.weather_base_url = url.into();
        self
    }

    /// Set the soil poll period
    pub fn with_sensor_interval(mut self, interval: Duration) -> Self {
        self.sensor_interval = interval;
        self
    }

    /// Set the weather poll period
    pub fn with_weather_interval(mut self, interval: Duration) -> Self {
        self.weather_interval = interval;
        self
    }

    /// Set the position source
    pub fn with_geolocation(mut self, mode: GeolocationMode) -> Self {
        self.geolocation = mode;
        self
    }

    /// Set the fallback position
    pub fn with_fallback(mut self, position: Coordinate) -> Self {
        self.fallback = position;
        self
    }

    /// Set the nitrogen model parameters
    pub fn with_optimizer(mut self, params: OptimizerParams) -> Self {
        self.optimizer = params;
        self
    }

    /// Read from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through `lookup`; empty values count as absent
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let mut config = Self::new(require(ENV_WEATHER_API_KEY)?, require(ENV_DATABASE_URL)?);

        if let Some(token) = get(ENV_DATABASE_AUTH) {
            config = config.with_database_auth(token);
        }
        if let Some(url) = get(ENV_WEATHER_URL) {
            config = config.with_weather_base_url(url);
        }
        if let Some(value) = get(ENV_SENSOR_INTERVAL) {
            config = config.with_sensor_interval(parse_millis(ENV_SENSOR_INTERVAL, &value)?);
        }
        if let Some(value) = get(ENV_WEATHER_INTERVAL) {
            config = config.with_weather_interval(parse_millis(ENV_WEATHER_INTERVAL, &value)?);
        }
        if let Some(value) = get(ENV_GEOLOCATION) {
            let mode = value.parse().map_err(|reason| ConfigError::Invalid {
                name: ENV_GEOLOCATION,
                reason,
            })?;
            config = config.with_geolocation(mode);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.weather_api_key.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_WEATHER_API_KEY));
        }
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_DATABASE_URL));
        }

        let minimum = Duration::from_millis(MIN_POLL_INTERVAL_MS);
        for (name, interval) in [
            (ENV_SENSOR_INTERVAL, self.sensor_interval),
            (ENV_WEATHER_INTERVAL, self.weather_interval),
        ] {
            if interval < minimum {
                return Err(ConfigError::Invalid {
                    name,
                    reason: format!("{} ms is below the {} ms minimum", interval.as_millis(), MIN_POLL_INTERVAL_MS),
                });
            }
        }

        if !self.fallback.is_valid() {
            return Err(ConfigError::Invalid {
                name: "fallback",
                reason: format!("{},{} is not a valid position", self.fallback.latitude, self.fallback.longitude),
            });
        }

        self.optimizer.validate().map_err(|e| ConfigError::Invalid {
            name: "optimizer",
            reason: e.to_string(),
        })
    }
}

fn parse_millis(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })
}
