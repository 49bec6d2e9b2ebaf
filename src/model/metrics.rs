//! Evaluation of a fitted model against held-out examples.

use crate::dataset::features::TrainingSet;
use crate::model::pipeline::{Classifier, RainModel};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CLASS_NAMES: [&str; 2] = ["no rain", "rain"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision, recall and F1, plus accuracy and the macro and support-weighted
/// averages. Any ratio with a zero denominator is reported as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Builds the report from true and predicted labels, compared pairwise.
    pub fn from_predictions(truth: &[u8], predicted: &[u8]) -> Self {
        // confusion[actual][predicted]
        let mut confusion = [[0usize; 2]; 2];
        for (actual, pred) in truth.iter().zip(predicted) {
            confusion[usize::from(*actual != 0)][usize::from(*pred != 0)] += 1;
        }
        let total: usize = confusion.iter().flatten().sum();

        let classes = [0, 1].map(|class| {
            let tp = confusion[class][class];
            let predicted_as = confusion[0][class] + confusion[1][class];
            let support = confusion[class][0] + confusion[class][1];
            let precision = ratio(tp, predicted_as);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                precision,
                recall,
                f1,
                support,
            }
        });

        let macro_avg = ClassMetrics {
            precision: (classes[0].precision + classes[1].precision) / 2.0,
            recall: (classes[0].recall + classes[1].recall) / 2.0,
            f1: (classes[0].f1 + classes[1].f1) / 2.0,
            support: total,
        };
        let weighted = |field: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                return 0.0;
            }
            classes.iter().map(|c| field(c) * c.support as f64).sum::<f64>() / total as f64
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
            support: total,
        };

        Self {
            classes,
            accuracy: ratio(confusion[0][0] + confusion[1][1], total),
            macro_avg,
            weighted_avg,
        }
    }

    pub fn support(&self) -> usize {
        self.macro_avg.support
    }
}

/// Scores `model` on `test` using the default decision threshold.
pub fn evaluate<C: Classifier>(model: &RainModel<C>, test: &TrainingSet) -> ClassificationReport {
    let predicted: Vec<u8> = test.features.iter().map(|row| model.predict(row)).collect();
    ClassificationReport::from_predictions(&test.labels, &predicted)
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
        for (name, class) in CLASS_NAMES.iter().zip(&self.classes) {
            write_row(f, name, class)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.4} {:>10}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.support()
        )?;
        write_row(f, "macro avg", &self.macro_avg)?;
        write_row(f, "weighted avg", &self.weighted_avg)
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, name: &str, metrics: &ClassMetrics) -> fmt::Result {
    writeln!(
        f,
        "{:>14} {:>10.4} {:>10.4} {:>10.4} {:>10}",
        name, metrics.precision, metrics.recall, metrics.f1, metrics.support
    )
}
