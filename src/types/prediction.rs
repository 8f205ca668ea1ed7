//! Prediction result data structures

use crate::recommendations::{recommendation_for, RiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of running one record through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Predicted class label
    pub class: String,
    /// Probability mass of the most likely class (0.0 - 1.0)
    pub confidence: f64,
    /// Probability of every class, keyed by class name
    pub probabilities: BTreeMap<String, f64>,
    /// Body mass index from the raw weight and height
    pub bmi: f64,
}

impl PredictionResult {
    /// Risk tier of the predicted class
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_class(&self.class)
    }

    /// Advice for the predicted class
    pub fn recommendation(&self) -> &'static str {
        recommendation_for(&self.class)
    }

    /// Convert to the wire response
    pub fn into_response(self) -> PredictionResponse {
        let risk_level = self.risk_level();
        let recommendation = self.recommendation().to_string();

        PredictionResponse {
            status: "success".to_string(),
            prediction: PredictionSummary {
                class: self.class,
                confidence: self.confidence,
                bmi: self.bmi,
            },
            probabilities: self.probabilities,
            recommendation,
            risk_level,
        }
    }
}

/// Body of a successful `/predict` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub status: String,
    pub prediction: PredictionSummary,
    pub probabilities: BTreeMap<String, f64>,
    pub recommendation: String,
    pub risk_level: RiskLevel,
}

/// Headline numbers of a prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub class: String,
    pub confidence: f64,
    pub bmi: f64,
}

/// Body mass index rounded to two decimals, `None` unless finite
pub fn bmi(weight: f64, height: f64) -> Option<f64> {
    let raw = weight / (height * height);
    raw.is_finite().then(|| round2(raw))
}

/// Round to two decimals, exact ties go to the even digit
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi() {
        assert_eq!(bmi(64.0, 1.62), Some(24.39));
        assert_eq!(bmi(80.0, 2.0), Some(20.0));
        assert_eq!(bmi(70.0, 0.0), None);
    }

    #[test]
    fn test_bmi_ties_round_to_even() {
        // 48.4 / 1.76^2 is 15.625
        assert_eq!(bmi(48.4, 1.76), Some(15.62));
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn test_prediction_response_serialization() {
        let mut probabilities = BTreeMap::new();
        probabilities.insert("Normal_Weight".to_string(), 0.8);
        probabilities.insert("Overweight_Level_I".to_string(), 0.2);

        let result = PredictionResult {
            class: "Normal_Weight".to_string(),
            confidence: 0.8,
            probabilities,
            bmi: 22.5,
        };

        let json = serde_json::to_value(result.into_response()).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["prediction"]["class"], "Normal_Weight");
        assert_eq!(json["prediction"]["confidence"], 0.8);
        assert_eq!(json["prediction"]["bmi"], 22.5);
        assert_eq!(json["probabilities"]["Overweight_Level_I"], 0.2);
        assert_eq!(json["risk_level"], "normal");
        assert!(json["recommendation"]
            .as_str()
            .unwrap()
            .contains("150 menit"));
    }

    #[test]
    fn test_unknown_class_falls_back() {
        let result = PredictionResult {
            class: "Unlisted".to_string(),
            confidence: 1.0,
            probabilities: BTreeMap::new(),
            bmi: 30.0,
        };
        let response = result.into_response();
        assert_eq!(response.risk_level, RiskLevel::Unknown);
        assert_eq!(
            response.recommendation,
            crate::recommendations::DEFAULT_RECOMMENDATION
        );
    }
}
