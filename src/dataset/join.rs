//! Aligns the long per-variable tables and the city metadata into one observation table.

use crate::dataset::error::DatasetError;
use crate::dataset::loader::{CITY_COLUMN, TIMESTAMP_COLUMN};
use crate::dataset::reshape::LongTable;
use crate::types::city::{cities_to_frame, CityAttributes};
use crate::types::weather_variable::WeatherVariable;
use log::{info, warn};
use polars::prelude::*;
use std::collections::{BTreeSet, HashSet};

/// What the join discarded or could not enrich. Purely diagnostic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinReport {
    /// Rows in the unified table.
    pub joined_rows: usize,
    /// Long-table rows per variable whose `(datetime, city)` key is absent from the result.
    ///
    /// Counted by key, so duplicated timestamps that fan out in the join are not mistaken
    /// for kept rows of another variable.
    pub dropped_rows: Vec<(WeatherVariable, usize)>,
    /// Observed cities with no entry in the metadata, sorted by name.
    pub cities_without_attributes: Vec<String>,
}

impl JoinReport {
    pub fn total_dropped(&self) -> usize {
        self.dropped_rows.iter().map(|(_, n)| n).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total_dropped() == 0 && self.cities_without_attributes.is_empty()
    }

    fn log(&self) {
        info!("Joined observations: {} rows", self.joined_rows);
        for (variable, dropped) in self.dropped_rows.iter().filter(|(_, n)| *n > 0) {
            warn!(
                "Inner join dropped {} {} rows without a match in every variable",
                dropped, variable
            );
        }
        if !self.cities_without_attributes.is_empty() {
            warn!(
                "No city attributes for {} cities, keeping them with null metadata: {:?}",
                self.cities_without_attributes.len(),
                self.cities_without_attributes
            );
        }
    }
}

/// Inner-joins the six long tables on `(datetime, city)`, then left-joins city metadata.
///
/// The result is sorted by `(city, datetime)` ascending, which the label deriver relies
/// on. Rows missing from any variable are dropped (and counted in the report); cities
/// without metadata are kept with null `lat`, `lng` and `country`.
pub fn join_sources(
    long_tables: &[LongTable],
    cities: &[CityAttributes],
) -> Result<(DataFrame, JoinReport), DatasetError> {
    let mut ordered = Vec::with_capacity(WeatherVariable::ALL.len());
    for variable in WeatherVariable::ALL {
        let table = long_tables
            .iter()
            .find(|t| t.variable == variable)
            .ok_or_else(|| DatasetError::MissingColumn {
                source_name: "observation join".to_string(),
                column: variable.column_name().to_string(),
            })?;
        ordered.push((variable, table.frame.clone().collect()?));
    }

    let keys = [col(TIMESTAMP_COLUMN), col(CITY_COLUMN)];
    let mut joined = ordered[0].1.clone().lazy();
    for (_, frame) in ordered.iter().skip(1) {
        joined = joined.join(
            frame.clone().lazy(),
            keys.clone(),
            keys.clone(),
            JoinArgs::new(JoinType::Inner),
        );
    }

    let attributes = cities_to_frame(cities)?;
    let unified = joined
        .join(
            attributes.lazy(),
            [col(CITY_COLUMN)],
            [col(CITY_COLUMN)],
            JoinArgs::new(JoinType::Left),
        )
        .sort(
            [CITY_COLUMN, TIMESTAMP_COLUMN],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    let joined_rows = unified.height();
    let joined_keys = unified.select([TIMESTAMP_COLUMN, CITY_COLUMN])?.lazy();
    let mut dropped_rows = Vec::with_capacity(ordered.len());
    for (variable, frame) in &ordered {
        let matched = frame
            .clone()
            .lazy()
            .join(
                joined_keys.clone(),
                keys.clone(),
                keys.clone(),
                JoinArgs::new(JoinType::Semi),
            )
            .collect()?
            .height();
        dropped_rows.push((*variable, frame.height() - matched));
    }

    let known: HashSet<&str> = cities.iter().map(|c| c.city.as_str()).collect();
    let cities_without_attributes = unified
        .column(CITY_COLUMN)?
        .str()?
        .into_iter()
        .flatten()
        .filter(|city| !known.contains(city))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let report = JoinReport {
        joined_rows,
        dropped_rows,
        cities_without_attributes,
    };
    report.log();
    Ok((unified, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::reshape::melt_variable;
    use crate::dataset::test_support::hours;

    fn wide(variable: WeatherVariable, cities: &[&str], n_hours: usize) -> DataFrame {
        let mut columns = vec![Column::new(TIMESTAMP_COLUMN.into(), hours(n_hours))];
        for (c, city) in cities.iter().enumerate() {
            let column = if variable == WeatherVariable::Description {
                let values: Vec<String> = (0..n_hours).map(|h| format!("sky {c}-{h}")).collect();
                Column::new((*city).into(), values)
            } else {
                let values: Vec<f64> = (0..n_hours).map(|h| (c * 100 + h) as f64).collect();
                Column::new((*city).into(), values)
            };
            columns.push(column);
        }
        DataFrame::new(columns).unwrap()
    }

    fn long(variable: WeatherVariable, cities: &[&str], n_hours: usize) -> LongTable {
        LongTable {
            variable,
            frame: melt_variable(&wide(variable, cities, n_hours), variable).unwrap(),
        }
    }

    #[test]
    fn test_inner_join_keeps_only_common_pairs() -> Result<(), DatasetError> {
        let all = ["Paris", "Rome", "Oslo"];
        let tables: Vec<LongTable> = WeatherVariable::ALL
            .iter()
            .map(|v| match v {
                WeatherVariable::Humidity => long(*v, &["Paris", "Rome"], 4),
                WeatherVariable::Pressure => long(*v, &all, 3),
                _ => long(*v, &all, 4),
            })
            .collect();
        let cities = vec![CityAttributes::new("Paris")
            .with_location(48.85, 2.35)
            .with_country("France")];

        let (unified, report) = join_sources(&tables, &cities)?;

        // Paris and Rome are in every table, but pressure stops after three hours.
        assert_eq!(unified.height(), 6);
        assert_eq!(report.joined_rows, 6);
        assert_eq!(report.cities_without_attributes, vec!["Rome".to_string()]);
        assert!(report
            .dropped_rows
            .contains(&(WeatherVariable::Temperature, 6)));
        assert!(report.dropped_rows.contains(&(WeatherVariable::Humidity, 2)));
        assert!(report.dropped_rows.contains(&(WeatherVariable::Pressure, 3)));
        assert!(!report.is_clean());

        let expected_columns = [
            "datetime",
            "city",
            "temp",
            "humidity",
            "pressure",
            "wind_speed",
            "wind_dir",
            "description",
            "lat",
            "lng",
            "country",
        ];
        let columns: Vec<_> = unified
            .get_column_names()
            .into_iter()
            .map(|n| n.as_str())
            .collect();
        assert_eq!(columns, expected_columns);
        Ok(())
    }

    #[test]
    fn test_cities_without_metadata_are_kept_with_nulls() -> Result<(), DatasetError> {
        let cities_observed = ["Paris", "Rome"];
        let tables: Vec<LongTable> = WeatherVariable::ALL
            .iter()
            .map(|v| long(*v, &cities_observed, 2))
            .collect();

        let (unified, report) = join_sources(&tables, &[])?;

        assert_eq!(unified.height(), 4);
        assert_eq!(unified.column("lat")?.null_count(), 4);
        assert_eq!(unified.column("country")?.null_count(), 4);
        assert_eq!(report.cities_without_attributes.len(), 2);
        assert_eq!(report.total_dropped(), 0);
        Ok(())
    }

    #[test]
    fn test_output_is_sorted_by_city_then_time() -> Result<(), DatasetError> {
        let tables: Vec<LongTable> = WeatherVariable::ALL
            .iter()
            .map(|v| long(*v, &["Rome", "Paris"], 3))
            .collect();
        let (unified, _) = join_sources(&tables, &[])?;

        let cities: Vec<_> = unified.column("city")?.str()?.into_iter().flatten().collect();
        assert_eq!(cities, vec!["Paris", "Paris", "Paris", "Rome", "Rome", "Rome"]);

        let temps: Vec<_> = unified.column("temp")?.f64()?.into_iter().flatten().collect();
        // Rome is the first wide column (values 0..), Paris the second (100..).
        assert_eq!(temps, vec![100.0, 101.0, 102.0, 0.0, 1.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_dropped_rows_are_counted_by_key() -> Result<(), DatasetError> {
        let tables: Vec<LongTable> = WeatherVariable::ALL
            .iter()
            .map(|v| match v {
                WeatherVariable::Pressure => long(*v, &["Paris"], 2),
                WeatherVariable::Temperature => {
                    let frame = long(*v, &["Paris"], 3).frame.collect().unwrap();
                    let duplicated = frame.vstack(&frame.slice(0, 1)).unwrap();
                    LongTable {
                        variable: *v,
                        frame: duplicated.lazy(),
                    }
                }
                _ => long(*v, &["Paris"], 3),
            })
            .collect();

        let (unified, report) = join_sources(&tables, &[])?;

        // Hour 0 fans out to two rows; hour 2 has no pressure reading.
        assert_eq!(unified.height(), 3);
        assert!(report.dropped_rows.contains(&(WeatherVariable::Temperature, 1)));
        assert!(report.dropped_rows.contains(&(WeatherVariable::Humidity, 1)));
        assert!(report.dropped_rows.contains(&(WeatherVariable::Pressure, 0)));
        Ok(())
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let tables: Vec<LongTable> = WeatherVariable::ALL[..5]
            .iter()
            .map(|v| long(*v, &["Paris"], 2))
            .collect();
        let result = join_sources(&tables, &[]);
        assert!(matches!(result, Err(DatasetError::MissingColumn { .. })));
    }
}
