//! Type definitions for the prediction API

pub mod metadata;
pub mod prediction;

pub use metadata::ModelMetadata;
pub use prediction::{PredictionResponse, PredictionResult};
