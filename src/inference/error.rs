use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("ML model not loaded")]
    ModelUnavailable,

    #[error("Request body is not a valid prediction request: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Field '{field}' must be a finite number, got {value}")]
    InvalidField { field: &'static str, value: f64 },

    #[error("Invalid timestamp '{value}'")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl PredictError {
    /// Whether the request itself was at fault, as opposed to the service.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PredictError::ModelUnavailable)
    }
}
