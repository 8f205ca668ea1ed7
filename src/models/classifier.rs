//! Classifier capability and the JSON-exported model backends
//!
//! Two exported formats are understood:
//!
//! - `random_forest`: a bag of decision trees whose leaves hold per-class
//!   weights. Probabilities are the mean of the normalized leaf weights.
//! - `linear`: a multinomial linear model, probabilities are
//!   `softmax(coefficients · x + intercepts)`.
//!
//! ONNX graphs are handled by [`crate::models::onnx`] behind the `onnx` feature.

use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;

/// Output of a single classifier call
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScores {
    /// Index of the predicted class in the target encoder
    pub class_index: usize,
    /// Probability of every class, indexed like the target encoder
    pub probabilities: Vec<f64>,
}

impl ClassScores {
    /// Derive the hard decision from a probability distribution
    pub fn from_probabilities(probabilities: Vec<f64>) -> Result<Self> {
        let class_index = argmax(&probabilities).context("empty probability distribution")?;
        Ok(Self {
            class_index,
            probabilities,
        })
    }

    /// Probability mass of the most likely class
    pub fn confidence(&self) -> f64 {
        self.probabilities
            .iter()
            .copied()
            .fold(0.0, f64::max)
    }
}

/// Capability shared by all classifier backends.
///
/// Implementations are immutable after load and shared across requests.
pub trait Classifier: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Number of classes in the output distribution
    fn n_classes(&self) -> usize;

    /// Number of input features, when the backend declares it
    fn n_features(&self) -> Option<usize>;

    /// Score one scaled feature vector
    fn predict(&self, features: &[f64]) -> Result<ClassScores>;
}

/// Index of the largest value; the first one wins on ties
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Classifier exported as JSON
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportedClassifier {
    RandomForest(ForestClassifier),
    Linear(LinearClassifier),
}

impl ExportedClassifier {
    /// Check internal consistency of the exported parameters
    pub fn validate(&self) -> Result<()> {
        match self {
            ExportedClassifier::RandomForest(forest) => forest.validate(),
            ExportedClassifier::Linear(linear) => linear.validate(),
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            ExportedClassifier::RandomForest(forest) => forest,
            ExportedClassifier::Linear(linear) => linear,
        }
    }
}

impl Classifier for ExportedClassifier {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn n_classes(&self) -> usize {
        self.inner().n_classes()
    }

    fn n_features(&self) -> Option<usize> {
        self.inner().n_features()
    }

    fn predict(&self, features: &[f64]) -> Result<ClassScores> {
        self.inner().predict(features)
    }
}

/// Decision tree node
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class weights (sample counts or fractions)
    Leaf { value: Vec<f64> },
}

/// Single decision tree, node 0 is the root
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf
    fn leaf(&self, features: &[f64]) -> Result<&[f64]> {
        let mut index = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features
                        .get(*feature)
                        .with_context(|| format!("tree splits on missing feature {}", feature))?;
                    index = if *x <= *threshold { *left } else { *right };
                }
                None => bail!("tree node {} out of range", index),
            }
        }
        bail!("tree contains a cycle")
    }
}

/// Random forest classifier
#[derive(Debug, Clone, Deserialize)]
pub struct ForestClassifier {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
}

impl ForestClassifier {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.trees.is_empty(), "forest has no trees");
        ensure!(self.n_classes > 0, "forest declares no classes");

        for (t, tree) in self.trees.iter().enumerate() {
            ensure!(!tree.nodes.is_empty(), "tree {} has no nodes", t);
            for (n, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        ensure!(
                            *feature < self.n_features,
                            "tree {} node {} splits on feature {} of {}",
                            t,
                            n,
                            feature,
                            self.n_features
                        );
                        ensure!(
                            *left < tree.nodes.len() && *right < tree.nodes.len(),
                            "tree {} node {} has a child out of range",
                            t,
                            n
                        );
                        ensure!(
                            threshold.is_finite(),
                            "tree {} node {} has a non-finite threshold",
                            t,
                            n
                        );
                    }
                    TreeNode::Leaf { value } => {
                        ensure!(
                            value.len() == self.n_classes,
                            "tree {} leaf {} has {} weights, expected {}",
                            t,
                            n,
                            value.len(),
                            self.n_classes
                        );
                        ensure!(
                            value.iter().all(|w| w.is_finite() && *w >= 0.0),
                            "tree {} leaf {} has invalid weights",
                            t,
                            n
                        );
                        ensure!(
                            value.iter().sum::<f64>() > 0.0,
                            "tree {} leaf {} carries no weight",
                            t,
                            n
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

impl Classifier for ForestClassifier {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn predict(&self, features: &[f64]) -> Result<ClassScores> {
        ensure!(
            features.len() == self.n_features,
            "forest expects {} features, got {}",
            self.n_features,
            features.len()
        );

        let mut probabilities = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let leaf = tree.leaf(features)?;
            let total: f64 = leaf.iter().sum();
            ensure!(total > 0.0, "tree reached a leaf with no weight");
            for (p, w) in probabilities.iter_mut().zip(leaf) {
                *p += w / total;
            }
        }

        let n_trees = self.trees.len() as f64;
        probabilities.iter_mut().for_each(|p| *p /= n_trees);

        ClassScores::from_probabilities(probabilities)
    }
}

/// Multinomial linear classifier
#[derive(Debug, Clone, Deserialize)]
pub struct LinearClassifier {
    /// One coefficient row per class
    pub coefficients: Vec<Vec<f64>>,
    /// One intercept per class
    pub intercepts: Vec<f64>,
}

impl LinearClassifier {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.coefficients.len() >= 2,
            "linear model needs at least two classes"
        );
        ensure!(
            self.coefficients.len() == self.intercepts.len(),
            "linear model has {} coefficient rows but {} intercepts",
            self.coefficients.len(),
            self.intercepts.len()
        );
        let width = self.coefficients[0].len();
        ensure!(width > 0, "linear model has no features");
        ensure!(
            self.coefficients.iter().all(|row| row.len() == width),
            "linear model coefficient rows have different lengths"
        );
        Ok(())
    }
}

impl Classifier for LinearClassifier {
    fn name(&self) -> &str {
        "linear"
    }

    fn n_classes(&self) -> usize {
        self.intercepts.len()
    }

    fn n_features(&self) -> Option<usize> {
        self.coefficients.first().map(Vec::len)
    }

    fn predict(&self, features: &[f64]) -> Result<ClassScores> {
        let expected = self.n_features().unwrap_or(0);
        ensure!(
            features.len() == expected,
            "linear model expects {} features, got {}",
            expected,
            features.len()
        );

        let logits: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();

        ClassScores::from_probabilities(softmax(&logits))
    }
}

/// Numerically stable softmax
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
