// ============================================================
// Layer 4 - Label Encoder
// ============================================================
// Bijection between a fixed ordered class list and codes 0..k-1.
// It is fitted from the configured class list, never from the
// labels seen in a corpus, so codes are stable across retraining.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes:   HashMap<String, usize>,
}

impl LabelEncoder {
    pub fn fit<S: AsRef<str>>(classes: &[S]) -> Result<Self> {
        if classes.is_empty() {
            return Err(PipelineError::invalid_input("label encoder needs at least one class"));
        }

        let classes = classes.iter().map(|c| c.as_ref().to_string()).collect::<Vec<_>>();
        let mut codes = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), code).is_some() {
                return Err(PipelineError::invalid_input(format!("duplicate class '{class}'")));
            }
        }
        Ok(Self { classes, codes })
    }

    pub fn encode(&self, label: &str) -> Result<usize> {
        self.codes.get(label).copied().ok_or_else(|| PipelineError::UnknownLabel {
            label:    label.to_string(),
            expected: self.classes.clone(),
        })
    }

    pub fn encode_all<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    pub fn decode(&self, code: usize) -> Result<&str> {
        self.classes.get(code).map(String::as_str).ok_or_else(|| {
            PipelineError::invalid_input(format!(
                "class code {code} out of range 0..{}",
                self.classes.len()
            ))
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }
}

impl TryFrom<Vec<String>> for LabelEncoder {
    type Error = PipelineError;

    fn try_from(classes: Vec<String>) -> Result<Self> {
        Self::fit(&classes)
    }
}

impl From<LabelEncoder> for Vec<String> {
    fn from(encoder: LabelEncoder) -> Self {
        encoder.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{INTENT_CLASSES, SENTIMENT_CLASSES};

    #[test]
    fn test_round_trip_every_class() {
        for classes in [SENTIMENT_CLASSES, INTENT_CLASSES] {
            let enc = LabelEncoder::fit(classes).unwrap();
            for (code, class) in classes.iter().enumerate() {
                assert_eq!(enc.encode(class).unwrap(), code);
                assert_eq!(enc.decode(enc.encode(class).unwrap()).unwrap(), *class);
            }
        }
    }

    #[test]
    fn test_unknown_label_is_surfaced() {
        let enc = LabelEncoder::fit(SENTIMENT_CLASSES).unwrap();
        match enc.encode("Angry") {
            Err(PipelineError::UnknownLabel { label, expected }) => {
                assert_eq!(label, "Angry");
                assert_eq!(expected.len(), 3);
            }
            other => panic!("expected UnknownLabel, got {other:?}"),
        }
        assert!(enc.encode("positive").is_err());
    }

    #[test]
    fn test_decode_out_of_range() {
        let enc = LabelEncoder::fit(SENTIMENT_CLASSES).unwrap();
        assert!(matches!(enc.decode(3), Err(PipelineError::InputValidation(_))));
    }

    #[test]
    fn test_rejects_empty_and_duplicate_classes() {
        assert!(LabelEncoder::fit::<&str>(&[]).is_err());
        assert!(LabelEncoder::fit(&["A", "B", "A"]).is_err());
    }

    #[test]
    fn test_serialises_as_class_list() {
        let enc  = LabelEncoder::fit(SENTIMENT_CLASSES).unwrap();
        let json = serde_json::to_string(&enc).unwrap();
        assert_eq!(json, r#"["Negative","Neutral","Positive"]"#);
        let back: LabelEncoder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, enc);
    }
}
