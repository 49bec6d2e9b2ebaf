pub mod error;
pub mod forest;
pub mod imputer;
pub mod metrics;
pub mod persistence;
pub mod pipeline;
pub mod split;
pub mod tree;
