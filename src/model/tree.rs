//! Weighted CART decision trees for binary classification.
//!
//! Trees are grown on Gini impurity with per-sample weights, so that a bootstrap sample
//! can be expressed as `(row, multiplicity * class_weight)` pairs instead of duplicated
//! rows. Each leaf stores the weighted fraction of positive samples that reached it.

use crate::types::features::{FeatureVector, N_FEATURES};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

// Minimum impurity decrease for a split to be worth making.
const MIN_GAIN: f64 = 1e-12;

/// One training row reaching a node, with its accumulated weight.
#[derive(Debug, Clone, Copy)]
pub struct WeightedSample {
    pub row: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub min_samples_leaf: usize,
    /// Candidate features drawn at each split.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        positive_fraction: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    // Number of samples sent left once sorted by `feature`.
    split_at: usize,
    score: f64,
}

impl DecisionTree {
    /// Grows a tree over `samples`, which index into `rows` and `labels`.
    pub fn fit<R: Rng>(
        rows: &[FeatureVector],
        labels: &[u8],
        mut samples: Vec<WeightedSample>,
        params: TreeParams,
        rng: &mut R,
    ) -> Self {
        let mut tree = DecisionTree { nodes: Vec::new() };
        let data = TrainingData { rows, labels };
        tree.grow(&data, &mut samples, params, rng);
        tree
    }

    /// Weighted positive fraction of the leaf `row` falls into.
    pub fn predict_proba(&self, row: &FeatureVector) -> f64 {
        let values = row.as_slice();
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { positive_fraction } => return *positive_fraction,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if values[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        self.depth_from(0)
    }

    fn depth_from(&self, idx: usize) -> usize {
        match &self.nodes[idx] {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => 1 + self.depth_from(*left).max(self.depth_from(*right)),
        }
    }

    fn grow<R: Rng>(
        &mut self,
        data: &TrainingData,
        samples: &mut [WeightedSample],
        params: TreeParams,
        rng: &mut R,
    ) -> usize {
        let (negative, positive) = data.class_weights(samples);
        let total = negative + positive;
        let positive_fraction = if total > 0.0 { positive / total } else { 0.0 };

        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { positive_fraction });

        let is_pure = negative <= 0.0 || positive <= 0.0;
        if is_pure || samples.len() < 2 * params.min_samples_leaf.max(1) {
            return idx;
        }

        let Some(best) = data.best_split(samples, params, rng) else {
            return idx;
        };

        data.sort_by_feature(samples, best.feature);
        let (left_samples, right_samples) = samples.split_at_mut(best.split_at);
        let left = self.grow(data, left_samples, params, rng);
        let right = self.grow(data, right_samples, params, rng);
        self.nodes[idx] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        idx
    }
}

struct TrainingData<'a> {
    rows: &'a [FeatureVector],
    labels: &'a [u8],
}

impl TrainingData<'_> {
    fn value(&self, sample: &WeightedSample, feature: usize) -> f64 {
        self.rows[sample.row].as_slice()[feature]
    }

    fn is_positive(&self, sample: &WeightedSample) -> bool {
        self.labels[sample.row] == 1
    }

    fn class_weights(&self, samples: &[WeightedSample]) -> (f64, f64) {
        samples.iter().fold((0.0, 0.0), |(neg, pos), s| {
            if self.is_positive(s) {
                (neg, pos + s.weight)
            } else {
                (neg + s.weight, pos)
            }
        })
    }

    fn sort_by_feature(&self, samples: &mut [WeightedSample], feature: usize) {
        samples.sort_by(|a, b| {
            self.value(a, feature)
                .total_cmp(&self.value(b, feature))
                .then(a.row.cmp(&b.row))
        });
    }

    /// Searches a random subset of features; falls through to the remaining ones only if
    /// none of the drawn features admits a valid split.
    fn best_split<R: Rng>(
        &self,
        samples: &mut [WeightedSample],
        params: TreeParams,
        rng: &mut R,
    ) -> Option<Candidate> {
        let mut features: Vec<usize> = (0..N_FEATURES).collect();
        features.shuffle(rng);

        let (negative, positive) = self.class_weights(samples);
        let parent_score = weighted_gini(negative, positive);

        let mut best: Option<Candidate> = None;
        for (visited, feature) in features.into_iter().enumerate() {
            if visited >= params.max_features && best.is_some() {
                break;
            }
            let Some(candidate) = self.best_threshold(samples, feature, params, (negative, positive))
            else {
                continue;
            };
            if parent_score - candidate.score <= MIN_GAIN {
                continue;
            }
            if best.as_ref().map_or(true, |b| candidate.score < b.score) {
                best = Some(candidate);
            }
        }
        best
    }

    fn best_threshold(
        &self,
        samples: &mut [WeightedSample],
        feature: usize,
        params: TreeParams,
        (negative, positive): (f64, f64),
    ) -> Option<Candidate> {
        self.sort_by_feature(samples, feature);
        let min_leaf = params.min_samples_leaf.max(1);

        let mut best: Option<Candidate> = None;
        let (mut left_neg, mut left_pos) = (0.0, 0.0);
        for split_at in 1..samples.len() {
            let moved = &samples[split_at - 1];
            if self.is_positive(moved) {
                left_pos += moved.weight;
            } else {
                left_neg += moved.weight;
            }
            if split_at < min_leaf || samples.len() - split_at < min_leaf {
                continue;
            }
            let lower = self.value(moved, feature);
            let upper = self.value(&samples[split_at], feature);
            if lower >= upper {
                continue;
            }
            let score = weighted_gini(left_neg, left_pos)
                + weighted_gini(negative - left_neg, positive - left_pos);
            if best.as_ref().map_or(true, |b| score < b.score) {
                best = Some(Candidate {
                    feature,
                    threshold: lower + (upper - lower) / 2.0,
                    split_at,
                    score,
                });
            }
        }
        best
    }
}

/// Gini impurity scaled by the node's total weight.
fn weighted_gini(negative: f64, positive: f64) -> f64 {
    let total = negative + positive;
    if total <= 0.0 {
        return 0.0;
    }
    let p = positive / total;
    total * 2.0 * p * (1.0 - p)
}
