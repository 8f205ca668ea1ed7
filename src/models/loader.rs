//! Trained artifact loader

use crate::config::ArtifactsConfig;
use crate::models::classifier::{Classifier, ExportedClassifier};
use crate::models::encoder::LabelEncoder;
use crate::models::scaler::FeatureScaler;
use crate::types::metadata::ModelMetadata;
use anyhow::{ensure, Context, Result};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Everything the training pipeline exported, loaded and cross-checked
pub struct Artifacts {
    pub metadata: ModelMetadata,
    pub classifier: Arc<dyn Classifier>,
    pub scaler: FeatureScaler,
    pub label_encoders: BTreeMap<String, LabelEncoder>,
    pub target_encoder: LabelEncoder,
}

impl std::fmt::Debug for Artifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifacts")
            .field("metadata", &self.metadata)
            .field("classifier", &self.classifier.name())
            .field("scaler", &self.scaler)
            .field("label_encoders", &self.label_encoders.keys())
            .field("target_encoder", &self.target_encoder)
            .finish()
    }
}

/// Loader for the exported model artifacts
pub struct ModelLoader {
    config: ArtifactsConfig,
}

impl ModelLoader {
    pub fn new(config: ArtifactsConfig) -> Self {
        Self { config }
    }

    /// Load and cross-check every artifact.
    ///
    /// Any missing or malformed file is an error; the service cannot start
    /// without the full set.
    pub fn load(&self) -> Result<Artifacts> {
        info!(dir = %self.config.dir, "Loading model artifacts");

        let metadata: ModelMetadata = read_json(&self.config.metadata_path(), "model metadata")?;
        let scaler: FeatureScaler = read_json(&self.config.scaler_path(), "scaler")?;
        scaler.validate().context("Invalid scaler")?;
        let label_encoders: BTreeMap<String, LabelEncoder> =
            read_json(&self.config.label_encoders_path(), "label encoders")?;
        let target_encoder: LabelEncoder =
            read_json(&self.config.target_encoder_path(), "target encoder")?;
        let classifier = self.load_classifier(target_encoder.len())?;

        let artifacts = Artifacts {
            metadata,
            classifier,
            scaler,
            label_encoders,
            target_encoder,
        };
        check_consistency(&artifacts)?;

        info!(
            classifier = artifacts.classifier.name(),
            features = artifacts.metadata.feature_count(),
            classes = artifacts.metadata.class_count(),
            categorical = artifacts.label_encoders.len(),
            "Model artifacts loaded successfully"
        );

        Ok(artifacts)
    }

    fn load_classifier(&self, n_classes: usize) -> Result<Arc<dyn Classifier>> {
        let path = self.config.classifier_path();
        let is_onnx = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("onnx"))
            .unwrap_or(false);

        if is_onnx {
            return self.load_onnx(&path, n_classes);
        }

        let classifier: ExportedClassifier = read_json(&path, "classifier")?;
        classifier
            .validate()
            .with_context(|| format!("Invalid classifier in {}", path.display()))?;
        info!(model = classifier.name(), path = %path.display(), "Classifier loaded");
        Ok(Arc::new(classifier))
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self, path: &Path, n_classes: usize) -> Result<Arc<dyn Classifier>> {
        let classifier =
            crate::models::onnx::OnnxClassifier::load(path, n_classes, self.config.onnx_threads)?;
        Ok(Arc::new(classifier))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self, path: &Path, _n_classes: usize) -> Result<Arc<dyn Classifier>> {
        anyhow::bail!(
            "{} is an ONNX model but this build lacks the `onnx` feature",
            path.display()
        )
    }
}

/// Read and deserialize one JSON artifact
fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} from {}", what, path.display()))?;
    let value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {} from {}", what, path.display()))?;
    info!(artifact = what, path = %path.display(), "Artifact loaded");
    Ok(value)
}

/// Shapes and vocabularies must agree across artifacts
fn check_consistency(artifacts: &Artifacts) -> Result<()> {
    let metadata = &artifacts.metadata;
    let n_features = metadata.feature_count();
    let n_classes = metadata.class_count();

    ensure!(n_features > 0, "metadata lists no features");
    ensure!(n_classes > 0, "metadata lists no classes");
    ensure!(
        artifacts.scaler.n_features() == n_features,
        "scaler was fitted on {} features but metadata lists {}",
        artifacts.scaler.n_features(),
        n_features
    );
    ensure!(
        artifacts.target_encoder.len() == n_classes,
        "target encoder has {} classes but metadata lists {}",
        artifacts.target_encoder.len(),
        n_classes
    );
    ensure!(
        artifacts.target_encoder.classes() == metadata.classes.as_slice(),
        "target encoder classes {:?} do not match metadata classes {:?}",
        artifacts.target_encoder.classes(),
        metadata.classes
    );
    ensure!(
        artifacts.classifier.n_classes() == n_classes,
        "classifier scores {} classes but metadata lists {}",
        artifacts.classifier.n_classes(),
        n_classes
    );
    if let Some(width) = artifacts.classifier.n_features() {
        ensure!(
            width == n_features,
            "classifier expects {} features but metadata lists {}",
            width,
            n_features
        );
    }
    for column in artifacts.label_encoders.keys() {
        ensure!(
            metadata.features.contains(column),
            "label encoder for '{}' does not match any feature",
            column
        );
    }
    Ok(())
}
