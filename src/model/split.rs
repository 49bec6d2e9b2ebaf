use crate::dataset::features::TrainingSet;
use crate::model::error::ModelError;
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub const DEFAULT_TEST_FRACTION: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

/// Disjoint train and test partitions, each in ascending original row order.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: TrainingSet,
    pub test: TrainingSet,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Splits `set` so that each class keeps its proportion in both partitions.
///
/// For each label, `round(count * test_fraction)` rows are moved to the test partition,
/// chosen after a shuffle seeded by `seed`.
pub fn stratified_split(set: &TrainingSet, test_fraction: f64, seed: u64) -> Result<Split, ModelError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ModelError::InvalidSplit(test_fraction));
    }
    if set.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_indices = Vec::with_capacity(set.len());
    let mut test_indices = Vec::new();

    for class in [0u8, 1] {
        let mut members: Vec<usize> = set
            .labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == class)
            .map(|(idx, _)| idx)
            .collect();
        members.shuffle(&mut rng);
        let n_test = (members.len() as f64 * test_fraction).round() as usize;
        test_indices.extend_from_slice(&members[..n_test]);
        train_indices.extend_from_slice(&members[n_test..]);
    }

    train_indices.sort_unstable();
    test_indices.sort_unstable();
    info!(
        "Split {} rows into {} train / {} test (seed {})",
        set.len(),
        train_indices.len(),
        test_indices.len(),
        seed
    );

    Ok(Split {
        train: set.subset(&train_indices),
        test: set.subset(&test_indices),
        train_indices,
        test_indices,
    })
}
