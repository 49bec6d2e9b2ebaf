use crate::types::features::{FeatureVector, N_FEATURES};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Replaces missing (`NaN`) feature values with the per-column training median.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianImputer {
    medians: [f64; N_FEATURES],
}

impl MedianImputer {
    /// Learns one median per column, ignoring `NaN`. A column with no values at all gets 0.
    pub fn fit(rows: &[FeatureVector]) -> Self {
        let mut medians = [0.0; N_FEATURES];
        for (idx, median) in medians.iter_mut().enumerate() {
            let mut values: Vec<OrderedFloat<f64>> = rows
                .iter()
                .map(|row| row.as_slice()[idx])
                .filter(|v| !v.is_nan())
                .map(OrderedFloat)
                .collect();
            *median = median_of(&mut values).unwrap_or(0.0);
        }
        Self { medians }
    }

    pub fn medians(&self) -> &[f64; N_FEATURES] {
        &self.medians
    }

    pub fn transform(&self, row: &FeatureVector) -> FeatureVector {
        let mut values = [0.0; N_FEATURES];
        for (idx, value) in row.as_slice().iter().enumerate() {
            values[idx] = if value.is_nan() { self.medians[idx] } else { *value };
        }
        FeatureVector::from_array(values)
    }
}

fn median_of(values: &mut [OrderedFloat<f64>]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid].0)
    } else {
        Some((values[mid - 1].0 + values[mid].0) / 2.0)
    }
}
