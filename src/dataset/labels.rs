//! Rain labels and calendar fields derived from the unified observation table.

use crate::dataset::error::DatasetError;
use crate::dataset::loader::{CITY_COLUMN, TIMESTAMP_COLUMN};
use log::info;
use polars::prelude::*;
use std::collections::HashSet;

pub const CURRENT_RAIN_COLUMN: &str = "current_rain";
pub const FUTURE_RAIN_COLUMN: &str = "future_rain";
pub const MONTH_COLUMN: &str = "month";
pub const HOUR_COLUMN: &str = "hour";
pub const DESCRIPTION_COLUMN: &str = "description";

/// Substrings that mark a description as rainy.
pub const RAIN_KEYWORDS: [&str; 4] = ["rain", "drizzle", "shower", "thunderstorm"];

/// Number of following observations the `future_rain` label looks at.
pub const DEFAULT_HORIZON: usize = 3;

/// Whether a free-text weather description reports rain, ignoring case.
///
/// # Examples
///
/// ```
/// use rainfall::is_rain_description;
///
/// assert!(is_rain_description("Thunderstorm with hail"));
/// assert!(!is_rain_description("few clouds"));
/// ```
pub fn is_rain_description(text: &str) -> bool {
    let text = text.to_lowercase();
    RAIN_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

/// For each position, whether any of the next `horizon` flags is set.
///
/// Positions past the end of the slice count as unset, so the last element is always
/// `false`.
pub fn lookahead_any(flags: &[bool], horizon: usize) -> Vec<bool> {
    let mut result = vec![false; flags.len()];
    let mut next_positive: Option<usize> = None;
    for idx in (0..flags.len()).rev() {
        result[idx] = next_positive.is_some_and(|pos| pos - idx <= horizon);
        if flags[idx] {
            next_positive = Some(idx);
        }
    }
    result
}

/// Adds `current_rain`, `future_rain`, `month` and `hour` to a unified observation table.
///
/// The input must be grouped by city with each city's rows in time order, which is how
/// [`crate::dataset::join::join_sources`] returns it. The lookahead never crosses from
/// one city's run into the next.
pub fn derive_labels(unified: DataFrame, horizon: usize) -> Result<DataFrame, DatasetError> {
    let current: Vec<bool> = unified
        .column(DESCRIPTION_COLUMN)?
        .str()?
        .into_iter()
        .map(|description| description.is_some_and(is_rain_description))
        .collect();

    let future = per_city_lookahead(&unified, &current, horizon)?;

    let positives = current.iter().filter(|v| **v).count();
    let future_positives = future.iter().filter(|v| **v).count();
    info!(
        "Labelled {} observations: {} raining now, {} with rain in the next {} steps",
        current.len(),
        positives,
        future_positives,
        horizon
    );

    let mut labeled = unified;
    labeled.with_column(as_flag_column(CURRENT_RAIN_COLUMN, &current))?;
    labeled.with_column(as_flag_column(FUTURE_RAIN_COLUMN, &future))?;

    let labeled = labeled
        .lazy()
        .with_columns([
            col(TIMESTAMP_COLUMN)
                .dt()
                .month()
                .cast(DataType::Int32)
                .alias(MONTH_COLUMN),
            col(TIMESTAMP_COLUMN)
                .dt()
                .hour()
                .cast(DataType::Int32)
                .alias(HOUR_COLUMN),
        ])
        .collect()?;
    Ok(labeled)
}

fn per_city_lookahead(
    frame: &DataFrame,
    current: &[bool],
    horizon: usize,
) -> Result<Vec<bool>, DatasetError> {
    let cities = frame.column(CITY_COLUMN)?.str()?;
    let mut future = Vec::with_capacity(current.len());
    let mut finished: HashSet<Option<&str>> = HashSet::new();
    let mut run_start = 0;
    let mut run_city: Option<Option<&str>> = None;

    for (idx, city) in cities.into_iter().enumerate() {
        match run_city {
            Some(active) if active == city => continue,
            Some(active) => {
                future.extend(lookahead_any(&current[run_start..idx], horizon));
                finished.insert(active);
            }
            None => {}
        }
        if finished.contains(&city) {
            return Err(DatasetError::UnsortedInput {
                city: city.unwrap_or_default().to_string(),
            });
        }
        run_city = Some(city);
        run_start = idx;
    }
    future.extend(lookahead_any(&current[run_start..], horizon));
    Ok(future)
}

fn as_flag_column(name: &str, flags: &[bool]) -> Column {
    let values: Vec<i32> = flags.iter().map(|f| i32::from(*f)).collect();
    Column::new(name.into(), values)
}
