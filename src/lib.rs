mod config;
mod dataset;
mod error;
mod inference;
mod model;
mod server;
mod training;
mod types;

pub use crate::config::*;
pub use error::RainfallError;
pub use training::*;

pub use dataset::error::DatasetError;
pub use dataset::features::*;
pub use dataset::join::*;
pub use dataset::labels::*;
pub use dataset::loader::*;
pub use dataset::reshape::*;

pub use model::error::ModelError;
pub use model::forest::*;
pub use model::imputer::MedianImputer;
pub use model::metrics::*;
pub use model::persistence::*;
pub use model::pipeline::*;
pub use model::split::*;
pub use model::tree::{DecisionTree, TreeParams, WeightedSample};

pub use inference::error::PredictError;
pub use inference::service::*;
pub use inference::timestamp::*;

pub use server::*;

pub use types::city::CityAttributes;
pub use types::features::*;
pub use types::prediction::*;
pub use types::weather_variable::WeatherVariable;
