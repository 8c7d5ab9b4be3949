// ============================================================
// Layer 3 - Labelled Example
// ============================================================
// One supervised training text for one axis. Labels stay strings
// here; the label encoder decides whether they are valid.

use serde::{Deserialize, Serialize};

use crate::domain::axis::Axis;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelledExample {
    pub axis:  Axis,
    pub text:  String,
    pub label: String,
}

impl LabelledExample {
    pub fn new(axis: Axis, text: impl Into<String>, label: impl Into<String>) -> Self {
        Self { axis, text: text.into(), label: label.into() }
    }
}

/// All examples of one axis, texts and labels index-aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelledCorpus {
    pub texts:  Vec<String>,
    pub labels: Vec<String>,
}

impl LabelledCorpus {
    pub fn from_examples<'a>(axis: Axis, examples: impl IntoIterator<Item = &'a LabelledExample>) -> Self {
        let mut corpus = Self::default();
        for ex in examples.into_iter().filter(|e| e.axis == axis) {
            corpus.push(ex.text.clone(), ex.label.clone());
        }
        corpus
    }

    pub fn push(&mut self, text: String, label: String) {
        self.texts.push(text);
        self.labels.push(label);
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_examples_keeps_one_axis_in_order() {
        let examples = vec![
            LabelledExample::new(Axis::Sentiment, "great", "Positive"),
            LabelledExample::new(Axis::Intent, "add sync", "Feature Request"),
            LabelledExample::new(Axis::Sentiment, "awful", "Negative"),
        ];
        let corpus = LabelledCorpus::from_examples(Axis::Sentiment, &examples);
        assert_eq!(corpus.texts, vec!["great", "awful"]);
        assert_eq!(corpus.labels, vec!["Positive", "Negative"]);
    }
}
