//! Geodesy service wire models
//!
//! The service reports numeric fields either as JSON numbers or as numeric
//! strings, so both are accepted.

use serde::{Deserialize, Deserializer};

/// Response of the local-height conversion endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct HeightResponse {
    /// Intermediate ellipsoidal height on the source frame's ellipsoid
    #[serde(deserialize_with = "lenient_f64")]
    pub altitude: f64,
}

/// Response of the position conversion endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct PositionResponse {
    /// Longitude in the canonical frame
    #[serde(deserialize_with = "lenient_f64")]
    pub easting: f64,

    /// Latitude in the canonical frame
    #[serde(deserialize_with = "lenient_f64")]
    pub northing: f64,

    /// Ellipsoidal height in the canonical frame
    #[serde(deserialize_with = "lenient_f64")]
    pub altitude: f64,
}

/// Accepts a number or a numeric string
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}
