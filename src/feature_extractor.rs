//! Request validation and feature encoding for model inference.
//!
//! Turns a raw JSON record into the numeric vector the scaler expects,
//! matching the preprocessing done by the training pipeline: categorical
//! columns are replaced by their fitted integer codes, numeric columns pass
//! through, and the output follows the metadata feature order.

use crate::error::PredictError;
use crate::models::encoder::LabelEncoder;
use anyhow::anyhow;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Raw inbound record: feature name to JSON value
pub type InputRecord = Map<String, Value>;

/// Feature extractor that transforms records into model input features.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    /// Feature names in model input order
    features: Vec<String>,
    /// Fitted encoders for the categorical columns
    encoders: BTreeMap<String, LabelEncoder>,
}

impl FeatureExtractor {
    /// Create a feature extractor for the given feature order and encoders.
    pub fn new(features: Vec<String>, encoders: BTreeMap<String, LabelEncoder>) -> Self {
        Self { features, encoders }
    }

    /// Check that every required feature is present.
    ///
    /// Reports the first missing feature in model order.
    pub fn validate(&self, record: &InputRecord) -> Result<(), PredictError> {
        match self.features.iter().find(|f| !record.contains_key(f.as_str())) {
            Some(missing) => Err(PredictError::MissingField(missing.clone())),
            None => Ok(()),
        }
    }

    /// Encode a validated record.
    ///
    /// Returns one value per feature in model order; fields that are not
    /// features are ignored.
    pub fn extract(&self, record: &InputRecord) -> Result<Vec<f64>, PredictError> {
        let mut features = Vec::with_capacity(self.features.len());

        for name in &self.features {
            let value = record
                .get(name)
                .ok_or_else(|| PredictError::MissingField(name.clone()))?;

            let encoded = match self.encoders.get(name) {
                Some(encoder) => encode_categorical(encoder, value)
                    .ok_or_else(|| PredictError::InvalidValue(name.clone()))?
                    as f64,
                None => numeric_value(value).ok_or_else(|| {
                    anyhow!("could not convert value {} of {} to float", value, name)
                })?,
            };
            features.push(encoded);
        }

        Ok(features)
    }

    /// Validate then encode
    pub fn validate_and_extract(&self, record: &InputRecord) -> Result<Vec<f64>, PredictError> {
        self.validate(record)?;
        self.extract(record)
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }
}

/// Look up a scalar value in the fitted vocabulary
fn encode_categorical(encoder: &LabelEncoder, value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => encoder.transform(s),
        Value::Number(n) => encoder.transform(&n.to_string()),
        _ => None,
    }
}

/// Read a JSON number or a string holding one
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}
