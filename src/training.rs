//! The offline training run: raw CSVs in, labelled dataset and model artifact out.

use crate::config::RainfallConfig;
use crate::dataset::error::DatasetError;
use crate::dataset::features::assemble_training_set;
use crate::dataset::join::{join_sources, JoinReport};
use crate::dataset::labels::derive_labels;
use crate::dataset::loader::{write_dataset, SourceLoader};
use crate::dataset::reshape::wide_to_long;
use crate::error::RainfallError;
use crate::model::metrics::{evaluate, ClassificationReport};
use crate::model::persistence::ModelArtifact;
use crate::model::pipeline::RainModel;
use crate::model::split::stratified_split;
use chrono::Utc;
use log::info;
use polars::prelude::DataFrame;
use std::path::PathBuf;

/// What a completed training run produced.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Labelled examples after dropping rows with missing features.
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub report: ClassificationReport,
    pub join: JoinReport,
    pub model_path: PathBuf,
    pub dataset_path: PathBuf,
}

pub struct TrainingDriver {
    config: RainfallConfig,
}

impl TrainingDriver {
    pub fn new(config: RainfallConfig) -> Self {
        Self { config }
    }

    /// Loads, reshapes, joins and labels the raw sources.
    ///
    /// Every source is read before any transformation starts, so a missing file fails the
    /// run without producing output.
    pub fn build_dataset(&self) -> Result<(DataFrame, JoinReport), DatasetError> {
        let sources = SourceLoader::new(&self.config.data.raw_dir).load_all()?;
        let long_tables = sources
            .tables
            .iter()
            .map(wide_to_long)
            .collect::<Result<Vec<_>, _>>()?;
        let (unified, join) = join_sources(&long_tables, &sources.cities)?;
        let labeled = derive_labels(unified, self.config.training.horizon)?;
        Ok((labeled, join))
    }

    /// Runs the whole pipeline and persists the dataset and the model.
    pub fn run(&self) -> Result<TrainingOutcome, RainfallError> {
        info!("Loading raw sources from {:?}", self.config.data.raw_dir);
        let (mut labeled, join) = self.build_dataset()?;

        let dataset_path = self.config.data.processed_csv.clone();
        write_dataset(&mut labeled, &dataset_path)?;

        let set = assemble_training_set(&labeled)?;
        let training = &self.config.training;
        let split = stratified_split(&set, training.test_fraction, training.seed)?;

        info!("Training random forest on {} rows", split.train.len());
        let model = RainModel::train(&split.train, training.forest())?;

        let report = evaluate(&model, &split.test);
        info!("Classification report on test data:\n{}", report);

        let model_path = self.config.model.path.clone();
        ModelArtifact::new(model, split.train.len(), Utc::now()).save(&model_path)?;

        Ok(TrainingOutcome {
            rows: set.len(),
            train_rows: split.train.len(),
            test_rows: split.test.len(),
            report,
            join,
            model_path,
            dataset_path,
        })
    }

    /// [`TrainingDriver::run`] on the blocking thread pool.
    pub async fn run_blocking(self) -> Result<TrainingOutcome, RainfallError> {
        tokio::task::spawn_blocking(move || self.run()).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataConfig, ModelConfig, ServerConfig, TrainingConfig};
    use std::path::Path;
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> RainfallConfig {
        RainfallConfig {
            data: DataConfig {
                raw_dir: dir.join("raw"),
                processed_csv: dir.join("out").join("hourly_ml.csv"),
            },
            model: ModelConfig {
                path: dir.join("models").join("rain_clf.bin"),
            },
            training: TrainingConfig {
                test_fraction: 0.2,
                seed: 42,
                n_trees: 5,
                min_samples_leaf: 3,
                horizon: 3,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
        }
    }

    #[tokio::test]
    async fn test_missing_sources_write_nothing() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("raw")).unwrap();
        let config = config_in(dir.path());
        let dataset_path = config.data.processed_csv.clone();
        let model_path = config.model.path.clone();

        let result = TrainingDriver::new(config).run_blocking().await;

        assert!(matches!(
            result,
            Err(RainfallError::Dataset(DatasetError::SourceMissing(_)))
        ));
        assert!(!dataset_path.exists());
        assert!(!model_path.exists());
    }
}
