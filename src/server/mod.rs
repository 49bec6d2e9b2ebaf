//! HTTP surface over [`PredictionService`].

use crate::inference::error::PredictError;
use crate::inference::service::PredictionService;
use crate::types::prediction::{PredictionRequest, PredictionResponse};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::warn;
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub predictions: PredictionService,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub version: &'static str,
}

pub fn create_app(predictions: PredictionService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/predict-rain-ml", post(predict_rain_ml))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { predictions })
}

// The body is parsed by hand so that an unloaded model wins over a bad body and the
// Content-Type header is not required.
async fn predict_rain_ml(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, PredictError> {
    if !state.predictions.is_loaded() {
        return Err(PredictError::ModelUnavailable);
    }
    let request: PredictionRequest =
        serde_json::from_slice(&body).map_err(PredictError::MalformedBody)?;
    state.predictions.predict_rain(&request).map(Json)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_loaded: state.predictions.is_loaded(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        if status == StatusCode::BAD_REQUEST {
            warn!("Rejected prediction request: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
