//! Model metadata descriptor produced alongside the trained artifacts

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Descriptor of the trained model: input schema, output classes and the
/// evaluation scores reported by the training run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    /// Feature names in model input order
    pub features: Vec<String>,

    /// Class names in probability-vector order
    pub classes: Vec<String>,

    /// Hold-out accuracy
    pub accuracy: f64,

    /// Hold-out precision
    pub precision: f64,

    /// Hold-out recall
    pub recall: f64,

    /// Hold-out F1 score
    pub f1_score: f64,

    /// Mean cross-validation score
    pub cv_mean: f64,

    /// Standard deviation of the cross-validation scores
    pub cv_std: f64,

    /// Hyperparameters selected by the search, kept as exported
    pub best_params: Value,
}

impl ModelMetadata {
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}
