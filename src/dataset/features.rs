use crate::dataset::error::DatasetError;
use crate::dataset::labels::FUTURE_RAIN_COLUMN;
use crate::types::features::{FeatureVector, FEATURE_COLUMNS, N_FEATURES};
use log::info;
use polars::prelude::*;

/// Model inputs and binary labels, row-aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub features: Vec<FeatureVector>,
    /// `1` for rain within the horizon, `0` otherwise.
    pub labels: Vec<u8>,
}

impl TrainingSet {
    /// Pairs features with labels row by row; both must have the same length.
    pub fn new(features: Vec<FeatureVector>, labels: Vec<u8>) -> Result<Self, DatasetError> {
        if features.len() != labels.len() {
            return Err(DatasetError::LengthMismatch {
                features: features.len(),
                labels: labels.len(),
            });
        }
        Ok(Self { features, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of rows labelled `0` and `1`.
    pub fn class_counts(&self) -> [usize; 2] {
        let positives = self.labels.iter().filter(|l| **l == 1).count();
        [self.len() - positives, positives]
    }

    pub fn positive_rate(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.class_counts()[1] as f64 / self.len() as f64
    }

    /// Copies the given rows, in the given order.
    pub fn subset(&self, indices: &[usize]) -> TrainingSet {
        TrainingSet {
            features: indices.iter().map(|i| self.features[*i]).collect(),
            labels: indices.iter().map(|i| self.labels[*i]).collect(),
        }
    }
}

/// Projects labelled observations onto the model schema plus the `future_rain` label.
///
/// Rows with a null in any feature column are dropped.
pub fn assemble_training_set(labeled: &DataFrame) -> Result<TrainingSet, DatasetError> {
    let columns = feature_columns(labeled)?;
    let labels = column_values(labeled, FUTURE_RAIN_COLUMN, DataType::Int32)?;
    let labels: Vec<Option<i32>> = labels.i32()?.into_iter().collect();

    let mut set = TrainingSet::default();
    for (row, label) in labels.iter().enumerate() {
        let (Some(values), Some(label)) = (row_values(&columns, row), label) else {
            continue;
        };
        set.features.push(FeatureVector::from_array(values));
        set.labels.push(u8::from(*label != 0));
    }

    let dropped = labeled.height() - set.len();
    info!(
        "Assembled {} training examples ({} rows dropped for missing features), positive rate {:.4}",
        set.len(),
        dropped,
        set.positive_rate()
    );
    Ok(set)
}

/// The feature vector of a single labelled row, or `None` if any feature is null.
pub fn labeled_row_features(labeled: &DataFrame, row: usize) -> Result<Option<FeatureVector>, DatasetError> {
    let columns = feature_columns(&labeled.slice(row as i64, 1))?;
    Ok(row_values(&columns, 0).map(FeatureVector::from_array))
}

fn feature_columns(labeled: &DataFrame) -> Result<Vec<Vec<Option<f64>>>, DatasetError> {
    FEATURE_COLUMNS
        .iter()
        .map(|name| {
            let column = column_values(labeled, name, DataType::Float64)?;
            Ok(column.f64()?.into_iter().collect())
        })
        .collect()
}

fn column_values(frame: &DataFrame, name: &str, dtype: DataType) -> Result<Column, DatasetError> {
    let column = frame.column(name).map_err(|_| DatasetError::MissingColumn {
        source_name: "labelled observations".to_string(),
        column: name.to_string(),
    })?;
    Ok(column.cast(&dtype)?)
}

fn row_values(columns: &[Vec<Option<f64>>], row: usize) -> Option<[f64; N_FEATURES]> {
    let mut values = [0.0; N_FEATURES];
    for (slot, column) in values.iter_mut().zip(columns) {
        *slot = column.get(row).copied().flatten()?;
    }
    Some(values)
}
