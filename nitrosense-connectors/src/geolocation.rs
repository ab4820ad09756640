//! Geolocation capabilities
//!
//! A server has no browser prompt, so "the device position" comes from one
//! of:
//!
//! - [`FixedGeolocator`]: a configured static position
//! - [`IpGeolocator`]: the public IP's approximate position
//!
//! A host with geolocation switched off simply has no [`Geolocator`].

use async_trait::async_trait;
use nitrosense_core::Coordinate;
use thiserror::Error;

use crate::Geolocator;

#[cfg(feature = "http")]
use crate::http::{HttpClient, HttpConfig, HttpError};

/// Why a position could not be produced
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeolocationError {
    /// The host refused to share its position
    #[error("permission denied")]
    PermissionDenied,

    /// Position could not be determined
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

/// Always reports the same position
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator {
    position: Coordinate,
}

impl FixedGeolocator {
    /// Geolocator for a fixed install
    pub fn new(position: Coordinate) -> Self {
        Self { position }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinate, GeolocationError> {
        Ok(self.position)
    }
}

/// Default IP geolocation endpoint
#[cfg(feature = "http")]
pub const IP_API_BASE_URL: &str = "http://ip-api.com";

/// Approximate position from the public IP address
///
/// `GET /json?fields=status,message,lat,lon`
#[cfg(feature = "http")]
pub struct IpGeolocator {
    client: HttpClient,
}

#[cfg(feature = "http")]
impl IpGeolocator {
    /// Geolocator against the public endpoint
    pub fn new() -> Result<Self, HttpError> {
        Self::with_base_url(IP_API_BASE_URL)
    }

    /// Geolocator against a custom endpoint
    pub fn with_base_url(base_url: &str) -> Result<Self, HttpError> {
        Ok(Self {
            client: HttpClient::new(HttpConfig::new(base_url))?,
        })
    }

    /// Underlying HTTP client (for statistics)
    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinate, GeolocationError> {
        let body = self
            .client
            .get_json("/json", &[("fields", "status,message,lat,lon".to_string())])
            .await
            .map_err(|e| GeolocationError::Unavailable(e.to_string()))?;

        parse_ip_api(&body)
    }
}

#[cfg(feature = "http")]
fn parse_ip_api(body: &serde_json::Value) -> Result<Coordinate, GeolocationError> {
    if body.get("status").and_then(|s| s.as_str()) != Some("success") {
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("lookup failed");
        return Err(GeolocationError::Unavailable(message.to_string()));
    }

    let lat = body.get("lat").and_then(|v| v.as_f64());
    let lon = body.get("lon").and_then(|v| v.as_f64());

    match (lat, lon) {
        (Some(lat), Some(lon)) => {
            let position = Coordinate::new(lat, lon);
            if position.is_valid() {
                Ok(position)
            } else {
                Err(GeolocationError::Unavailable(format!("invalid position {lat},{lon}")))
            }
        }
        _ => Err(GeolocationError::Unavailable("missing lat/lon".to_string())),
    }
}
