use crate::dataset::error::DatasetError;
use crate::inference::error::PredictError;
use crate::model::error::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RainfallError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Predict(#[from] PredictError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
