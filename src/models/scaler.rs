//! Per-feature affine scaling fitted at training time

use anyhow::{ensure, Result};
use serde::Deserialize;

/// Fitted feature scaler.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureScaler {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl FeatureScaler {
    /// Number of features the scaler was fitted on
    pub fn n_features(&self) -> usize {
        match self {
            FeatureScaler::Standard { mean, .. } => mean.len(),
            FeatureScaler::MinMax { min, .. } => min.len(),
        }
    }

    /// Check that the fitted statistics are usable
    pub fn validate(&self) -> Result<()> {
        let (offsets, scale) = match self {
            FeatureScaler::Standard { mean, scale } => (mean, scale),
            FeatureScaler::MinMax { min, scale } => (min, scale),
        };
        ensure!(!offsets.is_empty(), "scaler has no features");
        ensure!(
            offsets.len() == scale.len(),
            "scaler statistics have mismatched lengths ({} vs {})",
            offsets.len(),
            scale.len()
        );
        ensure!(
            offsets.iter().chain(scale.iter()).all(|v| v.is_finite()),
            "scaler statistics contain non-finite values"
        );
        Ok(())
    }

    /// Scale an encoded feature vector
    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
        ensure!(
            features.len() == self.n_features(),
            "scaler expects {} features, got {}",
            self.n_features(),
            features.len()
        );

        let scaled = match self {
            FeatureScaler::Standard { mean, scale } => features
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(&x, (&m, &s))| {
                    // Constant columns were fitted with zero variance
                    let s = if s == 0.0 { 1.0 } else { s };
                    (x - m) / s
                })
                .collect(),
            FeatureScaler::MinMax { min, scale } => features
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(&x, (&lo, &s))| x * s + lo)
                .collect(),
        };

        Ok(scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scaling() {
        let scaler: FeatureScaler =
            serde_json::from_str(r#"{"kind":"standard","mean":[10.0,1.7],"scale":[2.0,0.1]}"#)
                .unwrap();

        let scaled = scaler.transform(&[14.0, 1.6]).unwrap();
        assert!((scaled[0] - 2.0).abs() < 1e-12);
        assert!((scaled[1] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_scale_is_treated_as_unit() {
        let scaler = FeatureScaler::Standard {
            mean: vec![3.0],
            scale: vec![0.0],
        };
        assert_eq!(scaler.transform(&[5.0]).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_min_max_scaling() {
        let scaler: FeatureScaler =
            serde_json::from_str(r#"{"kind":"min_max","min":[-0.5],"scale":[0.25]}"#).unwrap();
        assert_eq!(scaler.transform(&[4.0]).unwrap(), vec![0.5]);
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        let scaler = FeatureScaler::Standard {
            mean: vec![0.0, 0.0],
            scale: vec![1.0, 1.0],
        };
        let err = scaler.transform(&[1.0]).unwrap_err();
        assert!(err.to_string().contains("expects 2 features"));
    }

    #[test]
    fn test_validate_rejects_mismatched_statistics() {
        let scaler = FeatureScaler::Standard {
            mean: vec![0.0, 0.0],
            scale: vec![1.0],
        };
        assert!(scaler.validate().is_err());
    }
}
