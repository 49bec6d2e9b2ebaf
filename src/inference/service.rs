use crate::inference::error::PredictError;
use crate::inference::timestamp::{parse_timestamp, Clock, SystemClock};
use crate::model::persistence::ModelArtifact;
use crate::model::pipeline::RainModel;
use crate::types::features::FeatureVector;
use crate::types::prediction::{PredictionRequest, PredictionResponse};
use chrono::{Datelike, Timelike};
use log::{error, info};
use std::path::Path;
use std::sync::Arc;

/// Answers single-row rain predictions from an optionally loaded model.
///
/// Cloning is cheap; the model is shared and never mutated after construction.
#[derive(Clone)]
pub struct PredictionService {
    model: Option<Arc<RainModel>>,
    clock: Arc<dyn Clock>,
}

impl PredictionService {
    /// Loads the artifact at `path`. A missing or invalid artifact is logged and yields a
    /// service that answers every request with [`PredictError::ModelUnavailable`].
    pub fn load(path: &Path) -> Self {
        match ModelArtifact::load(path) {
            Ok(artifact) => {
                info!("ML model loaded from {:?}", path);
                Self::with_model(artifact.model)
            }
            Err(e) => {
                error!("Failed to load ML model from {:?}: {}", path, e);
                Self::unavailable()
            }
        }
    }

    pub fn with_model(model: RainModel) -> Self {
        Self {
            model: Some(Arc::new(model)),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            model: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used for requests without a timestamp.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn predict_rain(&self, request: &PredictionRequest) -> Result<PredictionResponse, PredictError> {
        let model = self.model.as_ref().ok_or(PredictError::ModelUnavailable)?;
        let features = request_features(request, self.clock.as_ref())?;
        Ok(PredictionResponse::from_probability(model.predict_proba(&features)))
    }
}

/// Validates a request and lays it out in the model's feature order.
///
/// `temp`, `humidity` and `pressure` must be present and finite. `wind_speed` defaults
/// to 0 and an absent or blank timestamp to `clock`'s current time.
pub fn request_features(request: &PredictionRequest, clock: &dyn Clock) -> Result<FeatureVector, PredictError> {
    let temp = required(request.temp, "temp")?;
    let humidity = required(request.humidity, "humidity")?;
    let pressure = required(request.pressure, "pressure")?;
    let wind_speed = match request.wind_speed {
        Some(value) => finite(value, "wind_speed")?,
        None => 0.0,
    };

    let timestamp = match request
        .timestamp_iso
        .as_deref()
        .filter(|value| !value.trim().is_empty())
    {
        Some(value) => parse_timestamp(value).map_err(|source| PredictError::InvalidTimestamp {
            value: value.to_string(),
            source,
        })?,
        None => clock.now_utc(),
    };

    Ok(FeatureVector::new(
        temp,
        humidity,
        pressure,
        wind_speed,
        timestamp.month(),
        timestamp.hour(),
    ))
}

fn required(value: Option<f64>, field: &'static str) -> Result<f64, PredictError> {
    finite(value.ok_or(PredictError::MissingField(field))?, field)
}

fn finite(value: f64, field: &'static str) -> Result<f64, PredictError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PredictError::InvalidField { field, value })
    }
}
