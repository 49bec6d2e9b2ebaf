//! The feature schema shared by dataset assembly and request-time inference.
//!
//! Both the training set and the prediction path build their model inputs through
//! [`FeatureVector`], whose layout is fixed by [`FEATURE_COLUMNS`]. The trained model
//! artifact records the same list, so a model trained against a different layout is
//! rejected on load instead of silently producing wrong probabilities.

use serde::{Deserialize, Serialize};

/// Ordered names of the model input columns.
pub const FEATURE_COLUMNS: [&str; 6] = ["temp", "humidity", "pressure", "wind_speed", "month", "hour"];

/// Number of model inputs.
pub const N_FEATURES: usize = FEATURE_COLUMNS.len();

/// One model input row, laid out in [`FEATURE_COLUMNS`] order.
///
/// Missing values are represented as `NaN` and are filled by the model's imputation
/// step.
///
/// # Examples
///
/// ```
/// use rainfall::{FeatureVector, FEATURE_COLUMNS};
///
/// let row = FeatureVector::new(290.0, 70.0, 1014.0, 3.2, 6, 12);
/// assert_eq!(row.get("pressure"), Some(1014.0));
/// assert_eq!(row.as_slice().len(), FEATURE_COLUMNS.len());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; N_FEATURES]);

impl FeatureVector {
    /// Builds a row from named readings and calendar fields.
    pub fn new(temp: f64, humidity: f64, pressure: f64, wind_speed: f64, month: u32, hour: u32) -> Self {
        Self([temp, humidity, pressure, wind_speed, month as f64, hour as f64])
    }

    /// Wraps raw values that are already in [`FEATURE_COLUMNS`] order.
    pub fn from_array(values: [f64; N_FEATURES]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Looks up a value by feature name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_COLUMNS
            .iter()
            .position(|column| *column == name)
            .map(|idx| self.0[idx])
    }

    /// Pairs each value with its feature name, in schema order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        (0..N_FEATURES).map(move |idx| (FEATURE_COLUMNS[idx], self.0[idx]))
    }

    pub fn has_missing(&self) -> bool {
        self.0.iter().any(|v| v.is_nan())
    }
}

impl From<[f64; N_FEATURES]> for FeatureVector {
    fn from(values: [f64; N_FEATURES]) -> Self {
        Self::from_array(values)
    }
}

/// Checks that a recorded feature list matches the compiled-in schema.
pub fn schema_matches(columns: &[String]) -> bool {
    columns.len() == N_FEATURES && columns.iter().zip(FEATURE_COLUMNS).all(|(a, b)| a == b)
}
