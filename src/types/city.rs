//! Static per-city metadata joined onto the hourly observations.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Static attributes of one city in the observation dataset.
///
/// The metadata file may cover fewer cities than the observations do; cities without
/// an entry keep their observation rows and carry null attributes after the join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityAttributes {
    /// City name, matching the column header used in the wide observation tables.
    pub city: String,
    /// Latitude in decimal degrees, if known.
    pub lat: Option<f64>,
    /// Longitude in decimal degrees, if known.
    pub lng: Option<f64>,
    /// Country name, if known.
    pub country: Option<String>,
}

impl CityAttributes {
    pub fn new(city: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            lat: None,
            lng: None,
            country: None,
        }
    }

    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.lat = Some(lat);
        self.lng = Some(lng);
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }
}

/// Builds the `{city, lat, lng, country}` frame used as the right side of the metadata join.
pub(crate) fn cities_to_frame(cities: &[CityAttributes]) -> PolarsResult<DataFrame> {
    let names: Vec<&str> = cities.iter().map(|c| c.city.as_str()).collect();
    let lats: Vec<Option<f64>> = cities.iter().map(|c| c.lat).collect();
    let lngs: Vec<Option<f64>> = cities.iter().map(|c| c.lng).collect();
    let countries: Vec<Option<&str>> = cities.iter().map(|c| c.country.as_deref()).collect();

    df!(
        "city" => names,
        "lat" => lats,
        "lng" => lngs,
        "country" => countries,
    )
}
