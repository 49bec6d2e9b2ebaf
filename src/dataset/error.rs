use polars::error::PolarsError;
use polars::prelude::DataType;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Required source file '{0}' does not exist")]
    SourceMissing(PathBuf),

    #[error("Failed to read source file '{path}'")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Missing required column '{column}' in {source_name}")]
    MissingColumn { source_name: String, column: String },

    #[error("Timestamp column of {source_name} was read as {dtype}, expected a datetime")]
    TimestampNotParsed { source_name: String, dtype: DataType },

    // Lookahead labels are only meaningful on a (city, datetime)-sorted table
    #[error("Observations are not grouped by city: '{city}' reappears after another city")]
    UnsortedInput { city: String },

    #[error("Training set has {features} feature rows but {labels} labels")]
    LengthMismatch { features: usize, labels: usize },

    #[error("I/O error writing dataset '{0}'")]
    DatasetWriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing dataset '{0}'")]
    DatasetWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed processing DataFrame: {0}")]
    Polars(#[from] PolarsError),
}
