//! Obesity Prediction API Library
//!
//! Serves a pre-trained obesity category classifier over HTTP: records are
//! validated, encoded and scaled the way the training pipeline did it, scored
//! by the exported model, and returned with BMI, advice and a risk tier.

pub mod api;
pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod recommendations;
pub mod types;

pub use api::{router, AppState};
pub use config::AppConfig;
pub use error::PredictError;
pub use feature_extractor::FeatureExtractor;
pub use models::inference::InferenceEngine;
pub use types::{metadata::ModelMetadata, prediction::PredictionResult};
