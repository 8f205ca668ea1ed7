//! ONNX Runtime classifier backend
//!
//! Expects a classifier graph as emitted by the usual scikit-learn exporters:
//! a `label` output (int64) and a probability output that is either a
//! `[1, n_classes]` float tensor or a `seq(map(int64, float))`.

use crate::models::classifier::{ClassScores, Classifier};
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Classifier backed by an ONNX Runtime session
pub struct OnnxClassifier {
    /// Running a session needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    label_name: Option<String>,
    probability_name: String,
    n_classes: usize,
}

impl OnnxClassifier {
    /// Load a classifier graph; `n_classes` comes from the target encoder
    pub fn load<P: AsRef<Path>>(path: P, n_classes: usize, onnx_threads: usize) -> Result<Self> {
        let path = path.as_ref();

        ort::init().commit()?;
        info!(path = %path.display(), threads = onnx_threads, "Loading ONNX classifier");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load ONNX model from {}", path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let probability_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(
            input = %input_name,
            label = ?label_name,
            probabilities = %probability_name,
            "ONNX classifier loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            label_name,
            probability_name,
            n_classes,
        })
    }

    /// Read the class distribution from whichever layout the graph emits
    fn extract_probabilities(&self, outputs: &SessionOutputs) -> Result<Vec<f64>> {
        let output = outputs
            .get(self.probability_name.as_str())
            .with_context(|| format!("model produced no '{}' output", self.probability_name))?;

        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            anyhow::ensure!(
                data.len() >= self.n_classes,
                "probability tensor has {} values, expected {}",
                data.len(),
                self.n_classes
            );
            return Ok(data[..self.n_classes].iter().map(|&p| p as f64).collect());
        }

        if DynSequenceValueType::can_downcast(&output.dtype()) {
            return self.extract_from_sequence_map(&output);
        }

        anyhow::bail!("unsupported probability output layout")
    }

    /// `seq(map(int64, float))` layout produced by the ZipMap operator
    fn extract_from_sequence_map(&self, output: &ort::value::DynValue) -> Result<Vec<f64>> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;
        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
        let map_value = maps.first().context("Empty probability sequence")?;

        let mut probabilities = vec![0.0; self.n_classes];
        for (class_id, prob) in map_value.try_extract_key_values::<i64, f32>()? {
            let slot = usize::try_from(class_id)
                .ok()
                .and_then(|i| probabilities.get_mut(i))
                .with_context(|| format!("class id {} out of range", class_id))?;
            *slot = prob as f64;
        }
        Ok(probabilities)
    }

    fn extract_label(&self, outputs: &SessionOutputs) -> Option<usize> {
        let name = self.label_name.as_deref()?;
        let (_, data) = outputs.get(name)?.try_extract_tensor::<i64>().ok()?;
        data.first().and_then(|&l| usize::try_from(l).ok())
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx"
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict(&self, features: &[f64]) -> Result<ClassScores> {
        // Shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input: Vec<f32> = features.iter().map(|&x| x as f32).collect();
        let input_tensor =
            Tensor::from_array((shape, input)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let probabilities = self.extract_probabilities(&outputs)?;
        let scores = match self.extract_label(&outputs) {
            Some(class_index) if class_index < self.n_classes => ClassScores {
                class_index,
                probabilities,
            },
            _ => ClassScores::from_probabilities(probabilities)?,
        };

        debug!(class_index = scores.class_index, "ONNX inference complete");
        Ok(scores)
    }
}
