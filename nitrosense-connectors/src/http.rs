//! HTTP/HTTPS Client shared by the REST-backed connectors
//!
//! ## Overview
//!
//! The soil store, the weather provider and IP geolocation are all plain
//! JSON-over-HTTP GETs. This module wraps a `ureq` agent with:
//!
//! - a base URL
//! - query-parameter authentication
//! - request statistics
//! - execution on tokio's blocking pool
//!
//! ## Failure policy
//!
//! Requests fail fast. A non-success status is returned as
//! [`HttpError::ServerError`] immediately; there is no retry loop, since the
//! next poll tick is the retry. No timeout is configured; a request fails
//! only when the transport itself gives up.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use nitrosense_connectors::http::{HttpClient, HttpConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpConfig::new("https://api.openweathermap.org/data/2.5")
//!     .query_auth("appid", "your-api-key");
//!
//! let http = HttpClient::new(config)?;
//! let body = http.get_json("/weather", &[("lat", "36.16".into()), ("lon", "-86.78".into())]).await?;
//! # Ok(())
//! # }
//! ```

use crate::ConnectionStats;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// HTTP-specific errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(String),

    /// Server returned error status
    #[error("Server error {status}: {message}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// Body was not valid JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// HTTP configuration
#[derive(Clone)]
pub struct HttpConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Authentication method
    pub auth: AuthMethod,
    /// User agent string
    pub user_agent: String,
}

/// Authentication methods
#[derive(Clone)]
pub enum AuthMethod {
    /// No authentication
    None,
    /// Secret passed as a query parameter (`appid=`, `auth=`)
    Query {
        /// Parameter name
        name: String,
        /// Secret value
        value: String,
    },
}

impl std::fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secrets stay out of logs
        let auth = match &self.auth {
            AuthMethod::None => "none",
            AuthMethod::Query { .. } => "query",
        };
        f.debug_struct("HttpConfig")
            .field("base_url", &self.base_url)
            .field("auth", &auth)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl HttpConfig {
    /// Create new configuration with base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth: AuthMethod::None,
            user_agent: format!("NitroSense/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Authenticate with a query parameter
    pub fn query_auth(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth = AuthMethod::Query {
            name: name.into(),
            value: value.into(),
        };
        self
    }
}

/// JSON-over-HTTP client using the lightweight ureq agent
#[derive(Clone)]
pub struct HttpClient {
    config: Arc<HttpConfig>,
    agent: ureq::Agent,
    stats: Arc<Mutex<ConnectionStats>>,
}

impl HttpClient {
    /// Create new HTTP client
    pub fn new(config: HttpConfig) -> Result<Self, HttpError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(HttpError::Config("Base URL must start with http:// or https://".into()));
        }

        let agent = ureq::AgentBuilder::new().user_agent(&config.user_agent).build();

        Ok(Self {
            config: Arc::new(config),
            agent,
            stats: Arc::new(Mutex::new(ConnectionStats::default())),
        })
    }

    /// GET `path` with `query` and parse the body as JSON
    ///
    /// An empty body parses as `Value::Null`.
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, HttpError> {
        let url = format!("{}{}", self.config.base_url, path);
        let query: Vec<(String, String)> = query
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();

        let client = self.clone();
        let result = tokio::task::spawn_blocking(move || client.execute(&url, &query))
            .await
            .map_err(|e| HttpError::Request(format!("request task failed: {e}")))?;

        let mut stats = self.lock_stats();
        match &result {
            Ok(_) => stats.requests_ok += 1,
            Err(e) => {
                stats.requests_failed += 1;
                stats.last_error = Some(e.to_string());
            }
        }

        result
    }

    /// Request statistics so far
    pub fn stats(&self) -> ConnectionStats {
        self.lock_stats().clone()
    }

    fn lock_stats(&self) -> MutexGuard<'_, ConnectionStats> {
        self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Blocking request; runs on the blocking pool
    fn execute(&self, url: &str, query: &[(String, String)]) -> Result<serde_json::Value, HttpError> {
        let request = self.build_request(self.agent.get(url), query);

        match request.call() {
            Ok(resp) => {
                let text = resp
                    .into_string()
                    .map_err(|e| HttpError::Request(e.to_string()))?;

                self.lock_stats().bytes_received += text.len() as u64;

                if text.trim().is_empty() {
                    return Ok(serde_json::Value::Null);
                }

                serde_json::from_str(&text).map_err(|e| HttpError::Serialization(e.to_string()))
            }
            Err(ureq::Error::Status(code, resp)) => Err(HttpError::ServerError {
                status: code,
                message: resp.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(e)) => Err(HttpError::Request(e.to_string())),
        }
    }

    /// Attach authentication and query parameters
    fn build_request(&self, mut request: ureq::Request, query: &[(String, String)]) -> ureq::Request {
        match &self.config.auth {
            AuthMethod::None => {}
            AuthMethod::Query { name, value } => {
                request = request.query(name, value);
            }
        }

        for (name, value) in query {
            request = request.query(name, value);
        }

        request.set("Accept", "application/json")
    }
}
