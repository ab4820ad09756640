//! Location and Source Path Constants

/// Fallback latitude (Nashville, TN), decimal degrees.
pub const FALLBACK_LATITUDE: f64 = 36.1627;

/// Fallback longitude (Nashville, TN), decimal degrees.
pub const FALLBACK_LONGITUDE: f64 = -86.7816;

/// Key path of the soil node in the remote store.
pub const SOIL_NODE_PATH: &str = "soil";
