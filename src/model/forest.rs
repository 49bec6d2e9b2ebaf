//! A seeded random forest of weighted CART trees.

use crate::model::error::ModelError;
use crate::model::pipeline::Classifier;
use crate::model::tree::{DecisionTree, TreeParams, WeightedSample};
use crate::types::features::{FeatureVector, N_FEATURES};
use bon::bon;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How samples are reweighted before each tree is grown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    /// Every bootstrap draw counts once.
    Uniform,
    /// Each tree's bootstrap sample is reweighted so that both classes carry the same
    /// total weight: `n_bootstrap / (n_classes * count_in_bootstrap(class))`.
    BalancedSubsample,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub min_samples_leaf: usize,
    /// Candidate features per split. `None` means `sqrt(n_features)`.
    pub max_features: Option<usize>,
    pub class_weight: ClassWeight,
    pub seed: u64,
}

#[bon]
impl ForestConfig {
    /// Builds a forest configuration. Unset options take the defaults used for training
    /// the rain classifier: 50 trees, 3 samples per leaf, balanced subsample weights and
    /// seed 42.
    ///
    /// # Examples
    ///
    /// ```
    /// use rainfall::{ClassWeight, ForestConfig};
    ///
    /// let config = ForestConfig::builder().n_trees(10).build();
    /// assert_eq!(config.n_trees, 10);
    /// assert_eq!(config.min_samples_leaf, 3);
    /// assert_eq!(config.class_weight, ClassWeight::BalancedSubsample);
    /// ```
    #[builder]
    pub fn new(
        n_trees: Option<usize>,
        min_samples_leaf: Option<usize>,
        max_features: Option<usize>,
        class_weight: Option<ClassWeight>,
        seed: Option<u64>,
    ) -> Self {
        Self {
            n_trees: n_trees.unwrap_or(50),
            min_samples_leaf: min_samples_leaf.unwrap_or(3),
            max_features,
            class_weight: class_weight.unwrap_or(ClassWeight::BalancedSubsample),
            seed: seed.unwrap_or(42),
        }
    }

    fn features_per_split(&self) -> usize {
        self.max_features
            .unwrap_or_else(|| (N_FEATURES as f64).sqrt().floor() as usize)
            .clamp(1, N_FEATURES)
    }
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// An unfitted forest.
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    // Mixes the tree index into the forest seed so every tree has its own stream.
    fn tree_seed(&self, tree_index: usize) -> u64 {
        self.config
            .seed
            .wrapping_add((tree_index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    fn grow_tree(&self, tree_index: usize, rows: &[FeatureVector], labels: &[u8], n_classes: usize) -> DecisionTree {
        let mut rng = StdRng::seed_from_u64(self.tree_seed(tree_index));
        let n = rows.len();

        let mut draws = vec![0u32; n];
        for _ in 0..n {
            draws[rng.gen_range(0..n)] += 1;
        }

        let class_weights = match self.config.class_weight {
            ClassWeight::Uniform => [1.0, 1.0],
            ClassWeight::BalancedSubsample => balanced_weights(&draws, labels, n_classes),
        };

        let samples: Vec<WeightedSample> = draws
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(row, count)| WeightedSample {
                row,
                weight: f64::from(*count) * class_weights[usize::from(labels[row])],
            })
            .collect();

        let params = TreeParams {
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: self.config.features_per_split(),
        };
        DecisionTree::fit(rows, labels, samples, params, &mut rng)
    }
}

fn balanced_weights(draws: &[u32], labels: &[u8], n_classes: usize) -> [f64; 2] {
    let mut counts = [0u32; 2];
    for (count, label) in draws.iter().zip(labels) {
        counts[usize::from(*label)] += count;
    }
    let n_bootstrap = f64::from(counts[0] + counts[1]);
    counts.map(|count| {
        if count == 0 {
            0.0
        } else {
            n_bootstrap / (n_classes as f64 * f64::from(count))
        }
    })
}

impl Classifier for RandomForest {
    fn fit(&mut self, rows: &[FeatureVector], labels: &[u8]) -> Result<(), ModelError> {
        if rows.len() != labels.len() {
            return Err(ModelError::LengthMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }
        let n = rows.len();
        if n == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        // Anything non-zero is the positive class.
        let labels: Vec<u8> = labels.iter().map(|l| u8::from(*l != 0)).collect();
        let positives = labels.iter().filter(|l| **l == 1).count();
        let n_classes = if positives == 0 || positives == n { 1 } else { 2 };

        let started = std::time::Instant::now();
        let trees: Vec<DecisionTree> = (0..self.config.n_trees)
            .into_par_iter()
            .map(|tree_index| self.grow_tree(tree_index, rows, &labels, n_classes))
            .collect();
        self.trees = trees;

        info!(
            "Fitted {} trees on {} rows ({} positive) in {:?}",
            self.trees.len(),
            n,
            positives,
            started.elapsed()
        );
        Ok(())
    }

    /// Mean of the per-tree positive fractions. An unfitted forest answers 0.
    fn predict_proba(&self, row: &FeatureVector) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|tree| tree.predict_proba(row)).sum();
        total / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable(n: usize) -> (Vec<FeatureVector>, Vec<u8>) {
        let rows = (0..n)
            .map(|i| {
                let humid = i % 2 == 0;
                let humidity = if humid { 90.0 + (i % 7) as f64 } else { 40.0 + (i % 7) as f64 };
                FeatureVector::new(285.0 + (i % 5) as f64, humidity, 1010.0, 2.0, 6, 12)
            })
            .collect();
        let labels = (0..n).map(|i| u8::from(i % 2 == 0)).collect();
        (rows, labels)
    }

    #[test]
    fn test_classifies_separable_data() -> Result<(), ModelError> {
        let (rows, labels) = separable(120);
        let mut forest = RandomForest::new(ForestConfig::builder().n_trees(15).build());
        forest.fit(&rows, &labels)?;

        assert_eq!(forest.trees().len(), 15);
        let wet = FeatureVector::new(286.0, 93.0, 1010.0, 2.0, 4, 6);
        let dry = FeatureVector::new(286.0, 42.0, 1010.0, 2.0, 4, 6);
        assert!(forest.predict_proba(&wet) > 0.9);
        assert!(forest.predict_proba(&dry) < 0.1);
        Ok(())
    }

    #[test]
    fn test_unequal_lengths_are_rejected() {
        let (rows, labels) = separable(20);
        let mut forest = RandomForest::new(ForestConfig::default());
        let result = forest.fit(&rows, &labels[..15]);
        assert!(matches!(
            result,
            Err(ModelError::LengthMismatch { rows: 20, labels: 15 })
        ));
        assert!(!forest.is_fitted());
    }

    #[test]
    fn test_same_seed_same_forest() -> Result<(), ModelError> {
        let (rows, labels) = separable(60);
        let config = ForestConfig::builder().n_trees(8).seed(3).build();
        let mut first = RandomForest::new(config.clone());
        let mut second = RandomForest::new(config);
        first.fit(&rows, &labels)?;
        second.fit(&rows, &labels)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_single_class_gives_constant_probability() -> Result<(), ModelError> {
        let (rows, _) = separable(30);
        let mut forest = RandomForest::new(ForestConfig::builder().n_trees(5).build());
        forest.fit(&rows, &[0; 30])?;
        for row in &rows {
            assert_eq!(forest.predict_proba(row), 0.0);
        }
        Ok(())
    }

    #[test]
    fn test_empty_training_set_is_rejected() {
        let mut forest = RandomForest::new(ForestConfig::default());
        assert!(matches!(forest.fit(&[], &[]), Err(ModelError::EmptyTrainingSet)));
        assert!(!forest.is_fitted());
    }

    #[test]
    fn test_balanced_weights_equalise_classes() {
        // Bootstrap drew three negatives and one positive.
        let weights = balanced_weights(&[2, 1, 1, 0], &[0, 0, 1, 1], 2);
        assert_eq!(weights, [4.0 / 6.0, 2.0]);
        assert!((weights[0] * 3.0 - weights[1]).abs() < 1e-12);
    }

    #[test]
    fn test_default_features_per_split() {
        assert_eq!(ForestConfig::default().features_per_split(), 2);
        let all = ForestConfig::builder().max_features(99).build();
        assert_eq!(all.features_per_split(), N_FEATURES);
    }
}
