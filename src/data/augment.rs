// ============================================================
// Layer 4 - Corpus Augmentation
// ============================================================
// Optional training-data preparation applied before
// normalisation. Augmenters only ever add examples; the
// originals keep their position at the front of the corpus.

use crate::domain::example::LabelledCorpus;

pub trait CorpusAugmenter: Send + Sync {
    fn augment(&self, corpus: LabelledCorpus) -> LabelledCorpus;

    fn name(&self) -> &'static str;
}

/// Leaves the corpus untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAugmentation;

impl CorpusAugmenter for NoAugmentation {
    fn augment(&self, corpus: LabelledCorpus) -> LabelledCorpus {
        corpus
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// For every multiple beyond the first, appends `text + "!"` and
/// `text + "."` for each original example.
///
/// A multiplier of 3 turns n examples into 5n.
#[derive(Debug, Clone, Copy)]
pub struct PunctuationVariants {
    pub multiplier: usize,
}

impl PunctuationVariants {
    pub fn new(multiplier: usize) -> Self {
        Self { multiplier }
    }
}

impl CorpusAugmenter for PunctuationVariants {
    fn augment(&self, corpus: LabelledCorpus) -> LabelledCorpus {
        let extra_rounds = self.multiplier.saturating_sub(1);
        if extra_rounds == 0 || corpus.is_empty() {
            return corpus;
        }

        let mut out = corpus.clone();
        for _ in 0..extra_rounds {
            for (text, label) in corpus.texts.iter().zip(&corpus.labels) {
                out.push(format!("{text}!"), label.clone());
                out.push(format!("{text}."), label.clone());
            }
        }

        tracing::debug!(
            "Punctuation augmentation x{}: {} → {} examples",
            self.multiplier,
            corpus.len(),
            out.len()
        );
        out
    }

    fn name(&self) -> &'static str {
        "punctuation-variants"
    }
}

/// Picks the augmenter for a configured multiplier.
pub fn augmenter_for(multiplier: usize) -> Box<dyn CorpusAugmenter> {
    if multiplier > 1 {
        Box::new(PunctuationVariants::new(multiplier))
    } else {
        Box::new(NoAugmentation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> LabelledCorpus {
        let mut c = LabelledCorpus::default();
        c.push("Great app".into(), "Positive".into());
        c.push("So slow".into(), "Negative".into());
        c
    }

    #[test]
    fn test_multiplier_three_gives_five_times() {
        let out = PunctuationVariants::new(3).augment(corpus());
        assert_eq!(out.len(), 10);
        assert_eq!(&out.texts[..4], ["Great app", "So slow", "Great app!", "Great app."]);
        assert_eq!(out.labels[3], "Positive");
        assert_eq!(out.labels[5], "Negative");
    }

    #[test]
    fn test_multiplier_one_is_identity() {
        assert_eq!(PunctuationVariants::new(1).augment(corpus()), corpus());
        assert_eq!(augmenter_for(0).augment(corpus()), corpus());
        assert_eq!(augmenter_for(1).name(), "none");
    }
}
