// ============================================================
// Layer 3 - Prediction
// ============================================================
// What a classifier returns for one input text: the arg-max
// label, its probability, and the full softmax distribution in
// class-code order.

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};
use crate::domain::feedback::{AxisAnalysis, ClassLabel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label:        String,
    pub confidence:   f32,
    pub distribution: Vec<(String, f32)>,
}

impl Prediction {
    /// Builds a prediction from one row of probabilities.
    /// Ties resolve to the lowest class code.
    pub fn from_probabilities(classes: &[String], probabilities: &[f32]) -> Result<Self> {
        if classes.is_empty() || classes.len() != probabilities.len() {
            return Err(PipelineError::numeric(format!(
                "expected {} class probabilities, got {}",
                classes.len(),
                probabilities.len()
            )));
        }
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(PipelineError::numeric("non-finite class probability"));
        }

        let mut best = 0usize;
        for (i, p) in probabilities.iter().enumerate() {
            if *p > probabilities[best] {
                best = i;
            }
        }

        Ok(Self {
            label:        classes[best].clone(),
            confidence:   probabilities[best],
            distribution: classes.iter().cloned().zip(probabilities.iter().copied()).collect(),
        })
    }

    pub fn probability(&self, label: &str) -> Option<f32> {
        self.distribution
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| *p)
    }

    pub fn total_probability(&self) -> f32 {
        self.distribution.iter().map(|(_, p)| p).sum()
    }

    /// Converts to a typed axis result, clamping float noise into [0, 1].
    pub fn to_analysis<L: ClassLabel>(&self) -> Result<AxisAnalysis<L>> {
        let label = self.label.parse::<L>()?;
        AxisAnalysis::new(label, f64::from(self.confidence).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feedback::Sentiment;

    fn classes() -> Vec<String> {
        vec!["Negative".into(), "Neutral".into(), "Positive".into()]
    }

    #[test]
    fn test_argmax_and_confidence() {
        let p = Prediction::from_probabilities(&classes(), &[0.1, 0.2, 0.7]).unwrap();
        assert_eq!(p.label, "Positive");
        assert_eq!(p.confidence, 0.7);
        assert_eq!(p.probability("Positive"), Some(0.7));
        assert!((p.total_probability() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_tie_picks_lowest_code() {
        let p = Prediction::from_probabilities(&classes(), &[0.4, 0.4, 0.2]).unwrap();
        assert_eq!(p.label, "Negative");
    }

    #[test]
    fn test_shape_mismatch_is_numeric_error() {
        let err = Prediction::from_probabilities(&classes(), &[0.5, 0.5]).unwrap_err();
        assert!(matches!(err, PipelineError::Numeric(_)));
    }

    #[test]
    fn test_typed_conversion() {
        let p = Prediction::from_probabilities(&classes(), &[0.8, 0.1, 0.1]).unwrap();
        let a = p.to_analysis::<Sentiment>().unwrap();
        assert_eq!(a.label, Sentiment::Negative);
        assert!((a.score - 0.8).abs() < 1e-6);
    }
}
