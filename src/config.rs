//! Layered configuration for training and serving.
//!
//! Values are resolved in order, later sources winning:
//! 1. defaults in code
//! 2. a TOML file (`config/rainfall.toml` unless a path is given)
//! 3. environment variables prefixed with `RAINFALL`, e.g. `RAINFALL__SERVER__PORT=8080`

use crate::dataset::labels::DEFAULT_HORIZON;
use crate::model::forest::ForestConfig;
use crate::model::split::{DEFAULT_SEED, DEFAULT_TEST_FRACTION};
use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config/rainfall";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RainfallConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DataConfig {
    /// Directory holding the six wide CSVs and `city_attributes.csv`.
    pub raw_dir: PathBuf,
    /// Where the labelled dataset is written.
    pub processed_csv: PathBuf,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ModelConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TrainingConfig {
    pub test_fraction: f64,
    pub seed: u64,
    pub n_trees: usize,
    pub min_samples_leaf: usize,
    /// Lookahead steps for the `future_rain` label.
    pub horizon: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl TrainingConfig {
    pub fn forest(&self) -> ForestConfig {
        ForestConfig::builder()
            .n_trees(self.n_trees)
            .min_samples_leaf(self.min_samples_leaf)
            .seed(self.seed)
            .build()
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl RainfallConfig {
    /// Loads defaults, the optional default config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`RainfallConfig::load`], reading `file` instead of the default file. An
    /// explicitly given file must exist.
    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            .set_default("data.raw_dir", "data/hourly")?
            .set_default("data.processed_csv", "data/hourly_ml.csv")?
            .set_default("model.path", "models/rain_clf.bin")?
            .set_default("training.test_fraction", DEFAULT_TEST_FRACTION)?
            .set_default("training.seed", DEFAULT_SEED)?
            .set_default("training.n_trees", 50)?
            .set_default("training.min_samples_leaf", 3)?
            .set_default("training.horizon", DEFAULT_HORIZON as u64)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .add_source(file_source)
            .add_source(
                Environment::with_prefix("RAINFALL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
