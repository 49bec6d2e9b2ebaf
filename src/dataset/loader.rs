use crate::dataset::error::DatasetError;
use crate::types::city::CityAttributes;
use crate::types::weather_variable::WeatherVariable;
use log::{info, warn};
use polars::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the timestamp column shared by all wide tables and the derived frames.
pub const TIMESTAMP_COLUMN: &str = "datetime";
/// Name of the city key column in long and unified frames.
pub const CITY_COLUMN: &str = "city";
/// File holding the per-city metadata, next to the wide tables.
pub const CITY_ATTRIBUTES_FILE: &str = "city_attributes.csv";

/// A wide observation table: a `datetime` column followed by one column per city.
#[derive(Debug, Clone)]
pub struct WideTable {
    pub variable: WeatherVariable,
    pub frame: DataFrame,
}

impl WideTable {
    /// Wraps a frame after checking that it has a datetime-typed timestamp column.
    pub fn new(variable: WeatherVariable, frame: DataFrame) -> Result<Self, DatasetError> {
        let timestamp = frame
            .column(TIMESTAMP_COLUMN)
            .map_err(|_| DatasetError::MissingColumn {
                source_name: variable.file_name(),
                column: TIMESTAMP_COLUMN.to_string(),
            })?;
        if !matches!(timestamp.dtype(), DataType::Datetime(_, _)) {
            return Err(DatasetError::TimestampNotParsed {
                source_name: variable.file_name(),
                dtype: timestamp.dtype().clone(),
            });
        }
        Ok(Self { variable, frame })
    }

    /// City column names, in source order.
    pub fn cities(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != TIMESTAMP_COLUMN)
            .map(|name| name.to_string())
            .collect()
    }
}

/// Everything a training run reads from disk.
#[derive(Debug, Clone)]
pub struct RawSources {
    /// One table per [`WeatherVariable`], in [`WeatherVariable::ALL`] order.
    pub tables: Vec<WideTable>,
    pub cities: Vec<CityAttributes>,
}

/// Reads the raw hourly CSV files from a single directory.
pub struct SourceLoader {
    raw_dir: PathBuf,
}

impl SourceLoader {
    pub fn new(raw_dir: &Path) -> SourceLoader {
        SourceLoader {
            raw_dir: raw_dir.to_path_buf(),
        }
    }

    /// Loads all six wide tables and the city metadata.
    ///
    /// Every source is mandatory; the first missing or unreadable file aborts the load.
    pub fn load_all(&self) -> Result<RawSources, DatasetError> {
        let tables = WeatherVariable::ALL
            .iter()
            .map(|variable| self.load_wide(*variable))
            .collect::<Result<Vec<_>, _>>()?;
        let cities = self.load_cities()?;
        Ok(RawSources { tables, cities })
    }

    /// Loads the wide table for one variable, parsing the `datetime` column as a timestamp.
    pub fn load_wide(&self, variable: WeatherVariable) -> Result<WideTable, DatasetError> {
        let path = self.raw_dir.join(variable.file_name());
        let frame = read_csv(&path, true)?;
        let table = WideTable::new(variable, frame)?;
        info!(
            "Loaded {} from {:?}: {} rows, {} cities",
            variable,
            path,
            table.frame.height(),
            table.frame.width() - 1
        );
        Ok(table)
    }

    /// Loads the city metadata, normalising its headers to `city`/`lat`/`lng`/`country`.
    pub fn load_cities(&self) -> Result<Vec<CityAttributes>, DatasetError> {
        let path = self.raw_dir.join(CITY_ATTRIBUTES_FILE);
        let frame = read_csv(&path, false)?;
        let cities = parse_city_attributes(&frame, CITY_ATTRIBUTES_FILE)?;
        info!("Loaded attributes for {} cities from {:?}", cities.len(), path);
        Ok(cities)
    }
}

fn read_csv(path: &Path, parse_dates: bool) -> Result<DataFrame, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::SourceMissing(path.to_path_buf()));
    }
    CsvReadOptions::default()
        .with_has_header(true)
        // Infer over every row; a city column may turn fractional deep into the file.
        .with_infer_schema_length(None)
        .map_parse_options(|options| options.with_try_parse_dates(parse_dates))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| DatasetError::SourceRead {
            path: path.to_path_buf(),
            source: e,
        })?
        .finish()
        .map_err(|e| DatasetError::SourceRead {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Maps a source header onto the normalised attribute name it stands for.
fn normalise_attribute_header(header: &str) -> Option<&'static str> {
    match header.trim().to_ascii_lowercase().as_str() {
        "city" => Some("city"),
        "lat" | "latitude" => Some("lat"),
        "lng" | "lon" | "long" | "longitude" => Some("lng"),
        "country" => Some("country"),
        _ => None,
    }
}

/// Extracts [`CityAttributes`] from a metadata frame with arbitrary header casing.
///
/// Rows without a city name are skipped and duplicate cities keep their first row.
/// Missing `lat`/`lng`/`country` columns yield `None` for every city.
pub(crate) fn parse_city_attributes(
    frame: &DataFrame,
    source_name: &str,
) -> Result<Vec<CityAttributes>, DatasetError> {
    let mut city_col = None;
    let mut lat_col = None;
    let mut lng_col = None;
    let mut country_col = None;
    for name in frame.get_column_names() {
        let slot = match normalise_attribute_header(name.as_str()) {
            Some("city") => &mut city_col,
            Some("lat") => &mut lat_col,
            Some("lng") => &mut lng_col,
            Some("country") => &mut country_col,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(name.to_string());
        }
    }

    let city_name = city_col.ok_or_else(|| DatasetError::MissingColumn {
        source_name: source_name.to_string(),
        column: CITY_COLUMN.to_string(),
    })?;
    let names = frame.column(&city_name)?.cast(&DataType::String)?;
    let names = names.str()?;

    let lats = optional_f64_column(frame, lat_col.as_deref())?;
    let lngs = optional_f64_column(frame, lng_col.as_deref())?;
    let countries: Vec<Option<String>> = match country_col.as_deref() {
        Some(name) => {
            let column = frame.column(name)?.cast(&DataType::String)?;
            column
                .str()?
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect()
        }
        None => vec![None; frame.height()],
    };

    let mut seen = HashSet::new();
    let mut cities = Vec::with_capacity(frame.height());
    for (idx, name) in names.into_iter().enumerate() {
        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        if !seen.insert(name.to_string()) {
            warn!("Duplicate attributes for city '{}' in {}, keeping the first", name, source_name);
            continue;
        }
        cities.push(CityAttributes {
            city: name.to_string(),
            lat: lats[idx],
            lng: lngs[idx],
            country: countries[idx].clone(),
        });
    }
    Ok(cities)
}

fn optional_f64_column(frame: &DataFrame, name: Option<&str>) -> Result<Vec<Option<f64>>, DatasetError> {
    match name {
        Some(name) => {
            let column = frame.column(name)?.cast(&DataType::Float64)?;
            Ok(column.f64()?.into_iter().collect())
        }
        None => Ok(vec![None; frame.height()]),
    }
}

/// Writes a frame as CSV with a header row, creating parent directories as needed.
pub fn write_dataset(frame: &mut DataFrame, path: &Path) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| DatasetError::DatasetWriteIo(parent.to_path_buf(), e))?;
    }
    let mut file =
        fs::File::create(path).map_err(|e| DatasetError::DatasetWriteIo(path.to_path_buf(), e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)
        .map_err(|e| DatasetError::DatasetWritePolars(path.to_path_buf(), e))?;
    info!("Wrote {} rows to {:?}", frame.height(), path);
    Ok(())
}
