//! Request and response bodies of the rain prediction endpoint.

use serde::{Deserialize, Serialize};

/// Source tag attached to every model-backed prediction.
pub const ML_SOURCE: &str = "ml";

/// Probabilities at or above this value predict rain.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// A single prediction request, as posted by a client.
///
/// `temp`, `humidity` and `pressure` are required; they are optional here only so that a
/// missing field can be reported by name during validation instead of as a generic
/// deserialization failure. `wind_speed` defaults to `0.0` and `timestamp_iso` defaults
/// to the current UTC time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub temp: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    /// ISO-8601 timestamp, optionally suffixed with `Z`.
    #[serde(default, rename = "timestampISO")]
    pub timestamp_iso: Option<String>,
}

impl PredictionRequest {
    /// Convenience constructor with the three required readings set.
    pub fn new(temp: f64, humidity: f64, pressure: f64) -> Self {
        Self {
            temp: Some(temp),
            humidity: Some(humidity),
            pressure: Some(pressure),
            ..Self::default()
        }
    }

    pub fn with_wind_speed(mut self, wind_speed: f64) -> Self {
        self.wind_speed = Some(wind_speed);
        self
    }

    pub fn with_timestamp(mut self, timestamp_iso: impl Into<String>) -> Self {
        self.timestamp_iso = Some(timestamp_iso.into());
        self
    }
}

/// The model's answer for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// `1` if rain is expected within the forecast horizon, else `0`.
    pub pred: u8,
    /// Positive-class probability rounded to two decimals.
    pub prob: f64,
    pub source: String,
}

impl PredictionResponse {
    /// Turns a raw positive-class probability into a thresholded decision.
    pub fn from_probability(probability: f64) -> Self {
        Self {
            pred: u8::from(probability >= DECISION_THRESHOLD),
            prob: round_to(probability, 2),
            source: ML_SOURCE.to_string(),
        }
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
