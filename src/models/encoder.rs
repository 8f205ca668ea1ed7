//! Categorical label encoding fitted at training time

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maps a fixed vocabulary of strings to integer codes.
///
/// The code of a value is its position in `classes`, matching the exported
/// state of the training-time encoder (classes sorted at fit time).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "EncoderClasses", into = "EncoderClasses")]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes: HashMap<String, usize>,
}

/// On-disk representation of a [`LabelEncoder`]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EncoderClasses {
    classes: Vec<String>,
}

impl TryFrom<EncoderClasses> for LabelEncoder {
    type Error = String;

    fn try_from(raw: EncoderClasses) -> Result<Self, Self::Error> {
        LabelEncoder::new(raw.classes)
    }
}

impl From<LabelEncoder> for EncoderClasses {
    fn from(encoder: LabelEncoder) -> Self {
        Self {
            classes: encoder.classes,
        }
    }
}

impl LabelEncoder {
    /// Build an encoder from its ordered vocabulary
    pub fn new(classes: Vec<String>) -> Result<Self, String> {
        if classes.is_empty() {
            return Err("encoder has no classes".to_string());
        }

        let mut codes = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), code).is_some() {
                return Err(format!("duplicate class '{}'", class));
            }
        }

        Ok(Self { classes, codes })
    }

    /// Integer code of a raw value, `None` if unseen during training
    pub fn transform(&self, value: &str) -> Option<usize> {
        self.codes.get(value).copied()
    }

    /// Label of an integer code
    pub fn inverse_transform(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mtrans() -> LabelEncoder {
        serde_json::from_str(
            r#"{"classes":["Automobile","Bike","Motorbike","Public_Transportation","Walking"]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_transform_and_inverse() {
        let encoder = mtrans();

        assert_eq!(encoder.transform("Automobile"), Some(0));
        assert_eq!(encoder.transform("Walking"), Some(4));
        assert_eq!(encoder.transform("Rocket"), None);
        assert_eq!(encoder.inverse_transform(3), Some("Public_Transportation"));
        assert_eq!(encoder.inverse_transform(5), None);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(mtrans().transform("walking"), None);
    }

    #[test]
    fn test_rejects_duplicate_classes() {
        let result: Result<LabelEncoder, _> = serde_json::from_str(r#"{"classes":["no","no"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_vocabulary() {
        let result: Result<LabelEncoder, _> = serde_json::from_str(r#"{"classes":[]}"#);
        assert!(result.is_err());
    }
}
