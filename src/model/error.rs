use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Cannot train or split an empty training set")]
    EmptyTrainingSet,

    #[error("Got {rows} feature rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("Test fraction must be strictly between 0 and 1, got {0}")]
    InvalidSplit(f64),

    #[error("Failed to read model artifact '{0}'")]
    ArtifactRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write model artifact '{0}'")]
    ArtifactWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode model artifact '{0}'")]
    ArtifactDecode(PathBuf, #[source] Box<bincode::error::DecodeError>),

    #[error("Failed to encode model artifact")]
    ArtifactEncode(#[source] Box<bincode::error::EncodeError>),

    // The artifact was trained on a different feature layout
    #[error("Model was trained on features {found:?}, expected {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Unsupported model artifact format version {0}")]
    UnsupportedVersion(u32),
}
