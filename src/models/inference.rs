//! Prediction pipeline over the loaded artifacts

use crate::config::ArtifactsConfig;
use crate::error::PredictError;
use crate::feature_extractor::{numeric_value, FeatureExtractor, InputRecord};
use crate::models::classifier::Classifier;
use crate::models::encoder::LabelEncoder;
use crate::models::loader::{Artifacts, ModelLoader};
use crate::models::scaler::FeatureScaler;
use crate::types::metadata::ModelMetadata;
use crate::types::prediction::{bmi, PredictionResult};
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Raw request field holding body weight in kilograms
pub const WEIGHT_FIELD: &str = "Weight";
/// Raw request field holding height in meters
pub const HEIGHT_FIELD: &str = "Height";

/// Read-only inference context shared by all requests.
///
/// Each call to [`InferenceEngine::predict`] runs
/// validate → encode → scale → classify → format with no retained state.
pub struct InferenceEngine {
    metadata: ModelMetadata,
    extractor: FeatureExtractor,
    scaler: FeatureScaler,
    classifier: Arc<dyn Classifier>,
    target_encoder: LabelEncoder,
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("metadata", &self.metadata)
            .field("extractor", &self.extractor)
            .field("scaler", &self.scaler)
            .field("classifier", &self.classifier.name())
            .field("target_encoder", &self.target_encoder)
            .finish()
    }
}

impl InferenceEngine {
    /// Load artifacts from the configured location
    pub fn load(config: &ArtifactsConfig) -> Result<Self> {
        let artifacts = ModelLoader::new(config.clone()).load()?;
        let engine = Self::from_artifacts(artifacts);

        info!(
            classifier = engine.classifier.name(),
            accuracy = engine.metadata.accuracy,
            "Inference engine initialized"
        );
        Ok(engine)
    }

    /// Build an engine from already loaded artifacts
    pub fn from_artifacts(artifacts: Artifacts) -> Self {
        let extractor = FeatureExtractor::new(
            artifacts.metadata.features.clone(),
            artifacts.label_encoders,
        );

        Self {
            metadata: artifacts.metadata,
            extractor,
            scaler: artifacts.scaler,
            classifier: artifacts.classifier,
            target_encoder: artifacts.target_encoder,
        }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Run one record through the full pipeline
    pub fn predict(&self, record: &InputRecord) -> Result<PredictionResult, PredictError> {
        let encoded = self.extractor.validate_and_extract(record)?;

        let scaled = self
            .scaler
            .transform(&encoded)
            .context("Feature scaling failed")?;

        let scores = self
            .classifier
            .predict(&scaled)
            .context("Model inference failed")?;

        let class = self
            .target_encoder
            .inverse_transform(scores.class_index)
            .ok_or_else(|| anyhow!("class index {} has no label", scores.class_index))?
            .to_string();

        let probabilities: BTreeMap<String, f64> = self
            .metadata
            .classes
            .iter()
            .cloned()
            .zip(scores.probabilities.iter().copied())
            .collect();

        let bmi = raw_bmi(record)?;
        let confidence = scores.confidence();

        debug!(
            class = %class,
            confidence = confidence,
            bmi = bmi,
            "Prediction complete"
        );

        Ok(PredictionResult {
            class,
            confidence,
            probabilities,
            bmi,
        })
    }
}

/// BMI from the raw, pre-encoding request values
fn raw_bmi(record: &InputRecord) -> Result<f64, PredictError> {
    let read = |field: &str| -> Result<f64, PredictError> {
        let value = record
            .get(field)
            .ok_or_else(|| anyhow!("request has no {} value", field))?;
        numeric_value(value)
            .ok_or_else(|| anyhow!("could not convert {} value {} to float", field, value).into())
    };

    let weight = read(WEIGHT_FIELD)?;
    let height = read(HEIGHT_FIELD)?;
    bmi(weight, height)
        .ok_or_else(|| anyhow!("cannot compute BMI from height {}", height).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classifier::{ExportedClassifier, LinearClassifier};
    use serde_json::json;

    fn engine() -> InferenceEngine {
        let metadata = ModelMetadata {
            features: vec!["Gender".into(), "Height".into(), "Weight".into()],
            classes: vec!["Normal_Weight".into(), "Obesity_Type_I".into()],
            accuracy: 0.9,
            precision: 0.9,
            recall: 0.9,
            f1_score: 0.9,
            cv_mean: 0.88,
            cv_std: 0.02,
            best_params: json!({}),
        };
        let mut label_encoders = BTreeMap::new();
        label_encoders.insert(
            "Gender".to_string(),
            LabelEncoder::new(vec!["Female".into(), "Male".into()]).unwrap(),
        );
        // Heavier people score higher on the second class
        let classifier = ExportedClassifier::Linear(LinearClassifier {
            coefficients: vec![vec![0.0, 0.0, -1.0], vec![0.0, 0.0, 1.0]],
            intercepts: vec![0.0, 0.0],
        });

        InferenceEngine::from_artifacts(Artifacts {
            metadata,
            classifier: Arc::new(classifier),
            scaler: FeatureScaler::Standard {
                mean: vec![0.5, 1.7, 80.0],
                scale: vec![0.5, 0.1, 20.0],
            },
            label_encoders,
            target_encoder: LabelEncoder::new(vec![
                "Normal_Weight".into(),
                "Obesity_Type_I".into(),
            ])
            .unwrap(),
        })
    }

    fn record(value: serde_json::Value) -> InputRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_predict_light_and_heavy() {
        let engine = engine();

        let light = engine
            .predict(&record(json!({"Gender": "Female", "Height": 1.62, "Weight": 64})))
            .unwrap();
        assert_eq!(light.class, "Normal_Weight");
        assert_eq!(light.bmi, 24.39);

        let heavy = engine
            .predict(&record(json!({"Gender": "Male", "Height": 1.70, "Weight": 120})))
            .unwrap();
        assert_eq!(heavy.class, "Obesity_Type_I");
        assert!(heavy.confidence > 0.5 && heavy.confidence <= 1.0);

        let total: f64 = heavy.probabilities.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_is_deterministic() {
        let engine = engine();
        let input = record(json!({"Gender": "Male", "Height": "1.80", "Weight": "81.5"}));
        assert_eq!(engine.predict(&input).unwrap(), engine.predict(&input).unwrap());
    }

    #[test]
    fn test_zero_height_is_internal_error() {
        let err = engine()
            .predict(&record(json!({"Gender": "Male", "Height": 0, "Weight": 70})))
            .unwrap_err();
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("BMI"));
    }

    #[test]
    fn test_validation_errors_pass_through() {
        let err = engine()
            .predict(&record(json!({"Gender": "Other", "Height": 1.7, "Weight": 70})))
            .unwrap_err();
        assert!(matches!(err, PredictError::InvalidValue(ref c) if c == "Gender"));
    }
}
