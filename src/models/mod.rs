//! ML model artifacts and inference components

pub mod classifier;
pub mod encoder;
pub mod inference;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod scaler;

pub use classifier::{ClassScores, Classifier};
pub use inference::InferenceEngine;
pub use loader::{Artifacts, ModelLoader};
