//! Defines the weather variables that make up the raw hourly dataset and how each one
//! maps onto source files and long-table columns.

use polars::prelude::DataType;
use std::fmt;

/// One of the six per-city weather variables recorded in the hourly dataset.
///
/// Each variable is delivered as its own wide table (one column per city) and ends up
/// as a single column of the unified observation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherVariable {
    /// Air temperature (Kelvin in the reference dataset).
    Temperature,
    /// Relative humidity in percent.
    Humidity,
    /// Atmospheric pressure in hPa.
    Pressure,
    /// Wind speed in m/s.
    WindSpeed,
    /// Wind direction in degrees.
    WindDirection,
    /// Free-text weather description, e.g. "light rain" or "scattered clouds".
    Description,
}

impl WeatherVariable {
    /// All variables, in the order they are joined.
    pub const ALL: [WeatherVariable; 6] = [
        WeatherVariable::Temperature,
        WeatherVariable::Humidity,
        WeatherVariable::Pressure,
        WeatherVariable::WindSpeed,
        WeatherVariable::WindDirection,
        WeatherVariable::Description,
    ];

    /// File stem of the wide CSV holding this variable (without `.csv`).
    pub fn file_stem(&self) -> &'static str {
        match self {
            WeatherVariable::Temperature => "temperature",
            WeatherVariable::Humidity => "humidity",
            WeatherVariable::Pressure => "pressure",
            WeatherVariable::WindSpeed => "wind_speed",
            WeatherVariable::WindDirection => "wind_direction",
            WeatherVariable::Description => "weather_description",
        }
    }

    /// Name of the value column once the variable is in long form.
    pub fn column_name(&self) -> &'static str {
        match self {
            WeatherVariable::Temperature => "temp",
            WeatherVariable::Humidity => "humidity",
            WeatherVariable::Pressure => "pressure",
            WeatherVariable::WindSpeed => "wind_speed",
            WeatherVariable::WindDirection => "wind_dir",
            WeatherVariable::Description => "description",
        }
    }

    pub(crate) fn value_dtype(&self) -> DataType {
        match self {
            WeatherVariable::Description => DataType::String,
            _ => DataType::Float64,
        }
    }

    pub(crate) fn file_name(&self) -> String {
        format!("{}.csv", self.file_stem())
    }
}

/// Formats a `WeatherVariable` using its long-table column name.
///
/// # Examples
///
/// ```
/// use rainfall::WeatherVariable;
///
/// assert_eq!(WeatherVariable::WindDirection.to_string(), "wind_dir");
/// assert_eq!(format!("{}", WeatherVariable::Temperature), "temp");
/// ```
impl fmt::Display for WeatherVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_column_names_are_unique() {
        let names: HashSet<_> = WeatherVariable::ALL.iter().map(|v| v.column_name()).collect();
        assert_eq!(names.len(), WeatherVariable::ALL.len());
    }

    #[test]
    fn test_only_description_is_textual() {
        for variable in WeatherVariable::ALL {
            let expected = if variable == WeatherVariable::Description {
                DataType::String
            } else {
                DataType::Float64
            };
            assert_eq!(variable.value_dtype(), expected, "{variable}");
        }
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            WeatherVariable::Description.file_name(),
            "weather_description.csv"
        );
    }
}
