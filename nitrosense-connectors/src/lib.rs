//! Remote Source Connectors for the NitroSense Feeds
//!
//! ## Overview
//!
//! The feeds never talk to the network directly. They depend on three
//! contracts defined here, each with a production implementation:
//!
//! | Contract            | Implementation          | Transport                       |
//! |---------------------|-------------------------|---------------------------------|
//! | [`SoilSource`]      | [`RealtimeDbSource`]    | REST key-value store (`.json`)  |
//! | [`WeatherProvider`] | [`OpenWeatherProvider`] | HTTPS, OpenWeather current API  |
//! | [`Geolocator`]      | [`IpGeolocator`]        | HTTP IP geolocation             |
//! |                     | [`FixedGeolocator`]     | none (static position)          |
//!
//! ### Soil store
//!
//! The NPK probe writes `nitrogen`, `phosphorus` and `potassium` under the
//! `soil` node of a realtime key-value store. A read of a missing node is a
//! distinct "does not exist" signal (`Ok(None)`), separate from a node that
//! exists but lacks some fields.
//!
//! ### Weather provider
//!
//! `GET /weather?lat=..&lon=..&units=metric&appid=..`. Any non-success status
//! fails the request immediately; there are no retries and no timeout beyond
//! what the transport itself imposes.
//!
//! ### Geolocation
//!
//! A host capability returning a position or a refusal. A host *without* the
//! capability is modelled by not having a [`Geolocator`] at all.
//!
//! ## Blocking I/O
//!
//! HTTP goes through `ureq`, which blocks. Every call is moved onto tokio's
//! blocking pool so acquisitions never stall the event loop.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use nitrosense_connectors::{OpenWeatherProvider, WeatherProvider};
//! use nitrosense_core::Coordinate;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let weather = OpenWeatherProvider::new("your-api-key")?;
//! let now = weather.current(Coordinate::fallback()).await?;
//! println!("{} °C, {} mm", now.temperature, now.precipitation);
//! # Ok(())
//! # }
//! ```

pub mod geolocation;
#[cfg(feature = "http")]
pub mod http;
pub mod soil_store;
pub mod weather;

use async_trait::async_trait;
use nitrosense_core::Coordinate;
use thiserror::Error;

pub use geolocation::{FixedGeolocator, GeolocationError};
pub use soil_store::SoilNode;
pub use weather::Observation;

#[cfg(feature = "http")]
pub use geolocation::IpGeolocator;
#[cfg(feature = "http")]
pub use http::{AuthMethod, HttpClient, HttpConfig, HttpError};
#[cfg(feature = "http")]
pub use soil_store::RealtimeDbSource;
#[cfg(feature = "http")]
pub use weather::OpenWeatherProvider;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Remote answered with a non-success status
    #[error("{message}")]
    Unsuccessful {
        /// HTTP status code
        status: u16,
        /// Human-readable summary
        message: &'static str,
    },

    /// Response did not have the expected shape
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Transport-level failure
    #[error("{0}")]
    Transport(String),
}

#[cfg(feature = "http")]
impl From<HttpError> for ConnectorError {
    fn from(err: HttpError) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Reads nodes from the soil key-value store
#[async_trait]
pub trait SoilSource: Send + Sync {
    /// Read the node at `path`; `Ok(None)` if it does not exist
    async fn read_node(&self, path: &str) -> Result<Option<SoilNode>, ConnectorError>;
}

/// Current-conditions weather service
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current temperature and precipitation at `at`
    async fn current(&self, at: Coordinate) -> Result<Observation, ConnectorError>;
}

/// Host geolocation capability
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Current device position
    async fn locate(&self) -> Result<Coordinate, GeolocationError>;
}

/// Request statistics common to all HTTP-backed connectors
#[derive(Debug, Default, Clone)]
pub struct ConnectionStats {
    /// Requests that returned a success status
    pub requests_ok: u64,
    /// Requests that failed (transport or status)
    pub requests_failed: u64,
    /// Total response bytes read
    pub bytes_received: u64,
    /// Last error message
    pub last_error: Option<String>,
}
