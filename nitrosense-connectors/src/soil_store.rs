//! Soil key-value store connector
//!
//! The probe firmware writes integer mg/kg values to `/soil/nitrogen`,
//! `/soil/phosphorus` and `/soil/potassium`. Reading the `soil` node over
//! the store's REST interface returns the whole object, or `null` when the
//! node has never been written.

use serde_json::Value;

#[cfg(feature = "http")]
use crate::http::{HttpClient, HttpConfig, HttpError};
#[cfg(feature = "http")]
use crate::{ConnectorError, SoilSource};
#[cfg(feature = "http")]
use async_trait::async_trait;

/// Raw content of the soil node; every field is optional
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SoilNode {
    /// Nitrogen (mg/kg)
    pub nitrogen: Option<f64>,
    /// Phosphorus (mg/kg)
    pub phosphorus: Option<f64>,
    /// Potassium (mg/kg)
    pub potassium: Option<f64>,
}

impl SoilNode {
    /// Interpret a node value; `None` when the node does not exist
    ///
    /// Non-numeric, negative and non-finite fields are treated as absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }

        let field = |name: &str| {
            let amount = value.get(name).and_then(Value::as_f64)?;
            if amount.is_finite() && amount >= 0.0 {
                Some(amount)
            } else {
                log::warn!("soil node: ignoring {} = {}", name, amount);
                None
            }
        };

        Some(Self {
            nitrogen: field("nitrogen"),
            phosphorus: field("phosphorus"),
            potassium: field("potassium"),
        })
    }
}

/// Realtime database source reached through its REST interface
///
/// `GET {database_url}/{path}.json[?auth=token]`
#[cfg(feature = "http")]
pub struct RealtimeDbSource {
    client: HttpClient,
}

#[cfg(feature = "http")]
impl RealtimeDbSource {
    /// Connect to `database_url`, optionally with a database secret or ID token
    pub fn new(database_url: &str, auth: Option<&str>) -> Result<Self, HttpError> {
        let mut config = HttpConfig::new(database_url);
        if let Some(token) = auth {
            config = config.query_auth("auth", token);
        }

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
impl SoilSource for RealtimeDbSource {
    async fn read_node(&self, path: &str) -> Result<Option<SoilNode>, ConnectorError> {
        let resource = format!("/{}.json", path.trim_matches('/'));
        let value = self.client.get_json(&resource, &[]).await?;

        log::debug!("read {} -> {}", resource, value);

        Ok(SoilNode::from_value(&value))
    }
}
