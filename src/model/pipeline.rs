use crate::dataset::features::TrainingSet;
use crate::model::error::ModelError;
use crate::model::forest::{ForestConfig, RandomForest};
use crate::model::imputer::MedianImputer;
use crate::types::features::FeatureVector;
use crate::types::prediction::DECISION_THRESHOLD;
use serde::{Deserialize, Serialize};

/// A binary classifier producing the probability of the positive class.
pub trait Classifier {
    /// Fits on complete (imputed) rows. `labels` holds `0` or `1` per row.
    fn fit(&mut self, rows: &[FeatureVector], labels: &[u8]) -> Result<(), ModelError>;

    fn predict_proba(&self, row: &FeatureVector) -> f64;
}

/// Median imputation followed by a classifier, fitted together and applied together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainModel<C = RandomForest> {
    imputer: MedianImputer,
    classifier: C,
}

impl RainModel<RandomForest> {
    /// Fits the imputer and a random forest built from `config`.
    pub fn train(set: &TrainingSet, config: ForestConfig) -> Result<Self, ModelError> {
        Self::fit(set, RandomForest::new(config))
    }
}

impl<C: Classifier> RainModel<C> {
    /// Learns medians from `set`, imputes it, and fits `classifier` on the result.
    pub fn fit(set: &TrainingSet, mut classifier: C) -> Result<Self, ModelError> {
        if set.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        let imputer = MedianImputer::fit(&set.features);
        let imputed: Vec<FeatureVector> = set.features.iter().map(|row| imputer.transform(row)).collect();
        classifier.fit(&imputed, &set.labels)?;
        Ok(Self { imputer, classifier })
    }

    /// Probability of rain within the horizon. `NaN` inputs are imputed first.
    pub fn predict_proba(&self, row: &FeatureVector) -> f64 {
        self.classifier.predict_proba(&self.imputer.transform(row))
    }

    pub fn predict(&self, row: &FeatureVector) -> u8 {
        u8::from(self.predict_proba(row) >= DECISION_THRESHOLD)
    }

    pub fn imputer(&self) -> &MedianImputer {
        &self.imputer
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Remembers what it was fitted on and answers with the first feature.
    #[derive(Default)]
    struct Echo {
        fitted_rows: Vec<FeatureVector>,
    }

    impl Classifier for Echo {
        fn fit(&mut self, rows: &[FeatureVector], _labels: &[u8]) -> Result<(), ModelError> {
            self.fitted_rows = rows.to_vec();
            Ok(())
        }

        fn predict_proba(&self, row: &FeatureVector) -> f64 {
            row.as_slice()[0]
        }
    }

    fn set() -> TrainingSet {
        TrainingSet::new(
            vec![
                FeatureVector::new(0.2, 60.0, 1000.0, 1.0, 1, 1),
                FeatureVector::new(f64::NAN, 70.0, 1010.0, 2.0, 2, 2),
                FeatureVector::new(0.8, 80.0, 1020.0, f64::NAN, 3, 3),
            ],
            vec![0, 1, 1],
        )
        .unwrap()
    }

    #[test]
    fn test_classifier_sees_imputed_rows() -> Result<(), ModelError> {
        let model = RainModel::fit(&set(), Echo::default())?;
        let fitted = &model.classifier().fitted_rows;
        assert!(fitted.iter().all(|row| !row.has_missing()));
        assert_eq!(fitted[1].get("temp"), Some(0.5));
        assert_eq!(fitted[2].get("wind_speed"), Some(1.5));
        Ok(())
    }

    #[test]
    fn test_inference_applies_same_imputation() -> Result<(), ModelError> {
        let model = RainModel::fit(&set(), Echo::default())?;
        let row = FeatureVector::new(f64::NAN, 1.0, 1.0, 1.0, 1, 1);
        assert_eq!(model.predict_proba(&row), 0.5);
        assert_eq!(model.predict(&row), 1);
        assert_eq!(model.predict(&FeatureVector::new(0.49, 1.0, 1.0, 1.0, 1, 1)), 0);
        Ok(())
    }

    #[test]
    fn test_empty_set_is_rejected() {
        let result = RainModel::fit(&TrainingSet::default(), Echo::default());
        assert!(matches!(result, Err(ModelError::EmptyTrainingSet)));
    }
}
