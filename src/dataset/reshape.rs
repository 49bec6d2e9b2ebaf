//! Wide-to-long reshaping of per-variable observation tables.

use crate::dataset::error::DatasetError;
use crate::dataset::loader::{WideTable, CITY_COLUMN, TIMESTAMP_COLUMN};
use crate::types::weather_variable::WeatherVariable;
use polars::prelude::*;

/// A weather variable in long form: `{datetime, city, <variable column>}`.
#[derive(Clone)]
pub struct LongTable {
    pub variable: WeatherVariable,
    pub frame: LazyFrame,
}

/// Reshapes a validated wide table into its long form.
pub fn wide_to_long(table: &WideTable) -> Result<LongTable, DatasetError> {
    let frame = melt_variable(&table.frame, table.variable)?;
    Ok(LongTable {
        variable: table.variable,
        frame,
    })
}

/// Turns `datetime + one column per city` into `datetime, city, <value>` rows.
///
/// Every cell produces exactly one row, including cells holding nulls. Rows are ordered
/// by city column (source order), then by timestamp (source order). Values are cast to
/// the variable's dtype; cells that cannot be cast become null.
pub fn melt_variable(frame: &DataFrame, variable: WeatherVariable) -> PolarsResult<LazyFrame> {
    let value_name = variable.column_name();
    let value_dtype = variable.value_dtype();

    let cities: Vec<String> = frame
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != TIMESTAMP_COLUMN)
        .map(|name| name.to_string())
        .collect();

    if cities.is_empty() {
        let timestamp_dtype = frame.column(TIMESTAMP_COLUMN)?.dtype().clone();
        let empty = DataFrame::new(vec![
            Column::new_empty(TIMESTAMP_COLUMN.into(), &timestamp_dtype),
            Column::new_empty(CITY_COLUMN.into(), &DataType::String),
            Column::new_empty(value_name.into(), &value_dtype),
        ])?;
        return Ok(empty.lazy());
    }

    let per_city: Vec<LazyFrame> = cities
        .iter()
        .map(|city| {
            frame.clone().lazy().select([
                col(TIMESTAMP_COLUMN),
                lit(city.as_str()).alias(CITY_COLUMN),
                col(city.as_str()).cast(value_dtype.clone()).alias(value_name),
            ])
        })
        .collect();

    concat(per_city, UnionArgs::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::hours;

    #[test]
    fn test_every_cell_becomes_a_row() -> Result<(), DatasetError> {
        let frame = df!(
            "datetime" => hours(3),
            "Paris" => [Some(280.0), None, Some(281.5)],
            "Rome" => [Some(290.0), Some(291.0), None],
        )?;
        let table = WideTable::new(WeatherVariable::Temperature, frame)?;
        let long = wide_to_long(&table)?.frame.collect()?;

        assert_eq!(long.height(), 6);
        assert_eq!(
            long.get_column_names()
                .into_iter()
                .map(|n| n.as_str())
                .collect::<Vec<_>>(),
            vec!["datetime", "city", "temp"]
        );
        let cities: Vec<_> = long.column("city")?.str()?.into_iter().flatten().collect();
        assert_eq!(cities, vec!["Paris", "Paris", "Paris", "Rome", "Rome", "Rome"]);

        let temps = long.column("temp")?;
        assert_eq!(temps.null_count(), 2);
        assert_eq!(temps.f64()?.get(2), Some(281.5));
        Ok(())
    }

    #[test]
    fn test_integer_readings_are_cast_to_float() -> Result<(), DatasetError> {
        let frame = df!("datetime" => hours(2), "Haifa" => [Some(70i64), None])?;
        let long = melt_variable(&frame, WeatherVariable::Humidity)?.collect()?;
        assert_eq!(long.column("humidity")?.dtype(), &DataType::Float64);
        assert_eq!(long.column("humidity")?.f64()?.get(0), Some(70.0));
        Ok(())
    }

    #[test]
    fn test_descriptions_stay_textual() -> Result<(), DatasetError> {
        let frame = df!(
            "datetime" => hours(2),
            "Haifa" => [Some("sky is clear"), None],
        )?;
        let long = melt_variable(&frame, WeatherVariable::Description)?.collect()?;
        let descriptions = long.column("description")?.str()?;
        assert_eq!(descriptions.get(0), Some("sky is clear"));
        assert_eq!(descriptions.get(1), None);
        Ok(())
    }

    #[test]
    fn test_no_city_columns_gives_empty_table() -> Result<(), DatasetError> {
        let frame = df!("datetime" => hours(4))?;
        let long = melt_variable(&frame, WeatherVariable::Pressure)?.collect()?;
        assert_eq!(long.height(), 0);
        assert_eq!(long.width(), 3);
        Ok(())
    }
}
