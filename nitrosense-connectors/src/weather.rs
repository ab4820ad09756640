//! Weather provider connector (OpenWeather current conditions)

use serde::Deserialize;

#[cfg(feature = "http")]
use crate::http::{HttpClient, HttpConfig, HttpError};
#[cfg(feature = "http")]
use crate::{ConnectorError, WeatherProvider};
#[cfg(feature = "http")]
use async_trait::async_trait;
#[cfg(feature = "http")]
use nitrosense_core::errors::WEATHER_FETCH_FAILED;
#[cfg(feature = "http")]
use nitrosense_core::Coordinate;

/// Default OpenWeather API root
pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Current conditions extracted from a provider response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Air temperature (°C)
    pub temperature: f64,
    /// Rain or snow over the last hour (mm)
    pub precipitation: f64,
}

/// Subset of the `/weather` response we read
#[derive(Debug, Deserialize)]
pub struct CurrentWeather {
    /// Main block
    pub main: MainBlock,
    /// Rain volumes, absent when dry
    #[serde(default)]
    pub rain: Option<Volume>,
    /// Snow volumes, absent when no snow
    #[serde(default)]
    pub snow: Option<Volume>,
}

/// `main` block
#[derive(Debug, Deserialize)]
pub struct MainBlock {
    /// Temperature in the requested units
    pub temp: f64,
}

/// `rain` / `snow` block
#[derive(Debug, Deserialize)]
pub struct Volume {
    /// Volume over the last hour (mm)
    #[serde(rename = "1h", default)]
    pub one_hour: Option<f64>,
}

impl CurrentWeather {
    /// 1-hour rain if present, else 1-hour snow if present, else 0
    ///
    /// A reported amount of zero counts as absent.
    pub fn precipitation(&self) -> f64 {
        let amount = |v: &Option<Volume>| {
            v.as_ref()
                .and_then(|v| v.one_hour)
                .filter(|mm| *mm != 0.0)
        };

        amount(&self.rain).or_else(|| amount(&self.snow)).unwrap_or(0.0)
    }

    /// Reduce to the values the feed needs
    pub fn observation(&self) -> Observation {
        Observation {
            temperature: self.main.temp,
            precipitation: self.precipitation(),
        }
    }
}

/// OpenWeather HTTP provider, metric units
#[cfg(feature = "http")]
pub struct OpenWeatherProvider {
    client: HttpClient,
}

#[cfg(feature = "http")]
impl OpenWeatherProvider {
    /// Provider against the public API
    pub fn new(api_key: &str) -> Result<Self, HttpError> {
        Self::with_base_url(OPENWEATHER_BASE_URL, api_key)
    }

    /// Provider against a custom endpoint (proxy, mock server)
    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self, HttpError> {
        if api_key.trim().is_empty() {
            return Err(HttpError::Config("weather API key is empty".into()));
        }

        let config = HttpConfig::new(base_url).query_auth("appid", api_key);
        Ok(Self {
            client: HttpClient::new(config)?,
        })
    }

    /// Underlying HTTP client (for statistics)
    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, at: Coordinate) -> Result<Observation, ConnectorError> {
        let query = [
            ("lat", at.latitude.to_string()),
            ("lon", at.longitude.to_string()),
            ("units", "metric".to_string()),
        ];

        let body = match self.client.get_json("/weather", &query).await {
            Ok(body) => body,
            Err(HttpError::ServerError { status, .. }) => {
                return Err(ConnectorError::Unsuccessful {
                    status,
                    message: WEATHER_FETCH_FAILED,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let parsed: CurrentWeather = serde_json::from_value(body)
            .map_err(|e| ConnectorError::ProtocolError(e.to_string()))?;

        Ok(parsed.observation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> CurrentWeather {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn dry_conditions() {
        let w = parse(json!({ "main": { "temp": 18.4, "humidity": 60 }, "name": "Nashville" }));
        assert_eq!(w.observation(), Observation { temperature: 18.4, precipitation: 0.0 });
    }

    #[test]
    fn rain_wins_over_snow() {
        let w = parse(json!({
            "main": { "temp": 1.0 },
            "rain": { "1h": 2.5 },
            "snow": { "1h": 4.0 }
        }));
        assert_eq!(w.precipitation(), 2.5);
    }

    #[test]
    fn snow_when_no_rain() {
        let w = parse(json!({ "main": { "temp": -3.0 }, "snow": { "1h": 0.8 } }));
        assert_eq!(w.observation().temperature, -3.0);
        assert_eq!(w.precipitation(), 0.8);
    }

    #[test]
    fn zero_rain_falls_through_to_snow() {
        let w = parse(json!({
            "main": { "temp": 0.5 },
            "rain": { "1h": 0.0 },
            "snow": { "1h": 1.2 }
        }));
        assert_eq!(w.precipitation(), 1.2);
    }

    #[test]
    fn three_hour_only_counts_as_none() {
        let w = parse(json!({ "main": { "temp": 10.0 }, "rain": { "3h": 6.0 } }));
        assert_eq!(w.precipitation(), 0.0);
    }

    #[test]
    fn missing_main_is_an_error() {
        let result: Result<CurrentWeather, _> = serde_json::from_value(json!({ "rain": {} }));
        assert!(result.is_err());
    }

    #[cfg(feature = "http")]
    #[test]
    fn empty_key_is_rejected() {
        assert!(OpenWeatherProvider::new("  ").is_err());
    }
}
