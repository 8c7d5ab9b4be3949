// ============================================================
// Layer 5 - Sequence Classifier Lifecycle
// ============================================================
// One classifier per axis, moving through three types:
//
//   UnboundClassifier   label encoder fitted from the axis's
//        │ bind         fixed class list, no vocabulary yet
//        ▼
//   BoundClassifier     shares a SequenceEncoder (normalizer +
//        │ train        frozen vocabulary), can train
//        ▼
//   TrainedClassifier   weights present (Trained or Reloaded),
//                       the only type with predict_*
//
// A classifier without a vocabulary has no train method, and one
// without weights has no predict method, so neither call can
// happen out of order. Loading builds a TrainedClassifier in one
// step: on any failure the caller gets an error and no object.

use std::fmt;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::{
    batcher::stack_ids,
    dataset::FeedbackSample,
    label_encoder::LabelEncoder,
    splitter::split_train_val,
    vocabulary::SequenceEncoder,
};
use crate::domain::axis::Axis;
use crate::domain::error::{PipelineError, Result};
use crate::domain::prediction::Prediction;
use crate::infra::artifact_store::{ArtifactStore, AxisArtifacts};
use crate::ml::model::{SequenceClassifierConfig, SequenceClassifierModel};
use crate::ml::trainer::{run_training, TrainingOptions, TrainingReport};
use crate::ml::{InferBackend, InferDevice};

// ─── ClassifierSettings ───────────────────────────────────────────────────────
/// Architecture knobs that do not depend on the vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSettings {
    pub embedding_dim:      usize,
    pub hidden_size:        usize,
    pub second_hidden_size: usize,
    pub dense_size:         usize,
    pub dropout:            f64,
    pub head_dropout:       f64,
}

impl ClassifierSettings {
    /// Sentiment: BiLSTM 64 → 32. Intent: LSTM 128 → 64.
    pub fn for_axis(axis: Axis) -> Self {
        let (hidden_size, second_hidden_size) = match axis {
            Axis::Sentiment => (64, 32),
            Axis::Intent    => (128, 64),
        };
        Self {
            embedding_dim: crate::config::EMBEDDING_DIM,
            hidden_size,
            second_hidden_size,
            dense_size:    64,
            dropout:       0.3,
            head_dropout:  0.2,
        }
    }

    pub fn model_config(&self, axis: Axis, vocab_size: usize, num_classes: usize) -> SequenceClassifierConfig {
        SequenceClassifierConfig::new(
            vocab_size,
            num_classes,
            axis.is_bidirectional(),
            self.hidden_size,
            self.second_hidden_size,
        )
        .with_embedding_dim(self.embedding_dim)
        .with_dense_size(self.dense_size)
        .with_dropout(self.dropout)
        .with_head_dropout(self.head_dropout)
    }
}

// ─── UnboundClassifier ────────────────────────────────────────────────────────
pub struct UnboundClassifier {
    axis:     Axis,
    settings: ClassifierSettings,
    labels:   LabelEncoder,
}

impl UnboundClassifier {
    pub fn new(axis: Axis, settings: ClassifierSettings) -> Result<Self> {
        let labels = LabelEncoder::fit(axis.classes())?;
        Ok(Self { axis, settings, labels })
    }

    pub fn bind(self, encoder: SequenceEncoder) -> BoundClassifier {
        BoundClassifier {
            axis:     self.axis,
            settings: self.settings,
            labels:   self.labels,
            encoder,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }
}

// ─── BoundClassifier ──────────────────────────────────────────────────────────
pub struct BoundClassifier {
    axis:     Axis,
    settings: ClassifierSettings,
    labels:   LabelEncoder,
    encoder:  SequenceEncoder,
}

impl BoundClassifier {
    /// Encodes the corpus through the shared encoder, holds out the
    /// validation fraction and trains a fresh model.
    pub fn train<S: AsRef<str>>(
        &self,
        texts:  &[S],
        labels: &[S],
        opts:   &TrainingOptions,
    ) -> Result<TrainedClassifier> {
        if texts.len() != labels.len() {
            return Err(PipelineError::invalid_input(format!(
                "{} texts but {} labels",
                texts.len(),
                labels.len()
            )));
        }
        opts.validate()?;

        let codes   = self.labels.encode_all(labels)?;
        let samples = texts
            .iter()
            .zip(codes)
            .map(|(text, label)| FeedbackSample {
                input_ids: self.encoder.encode_for_model(text.as_ref()).into_ids(),
                label,
            })
            .collect::<Vec<_>>();

        let (train, val) = split_train_val(samples, opts.validation_split, opts.seed);
        let config       = self.settings.model_config(
            self.axis,
            self.encoder.vocabulary().size(),
            self.labels.num_classes(),
        );

        let (model, report) = run_training(self.axis, &config, train, val, opts)?;

        Ok(TrainedClassifier {
            axis:    self.axis,
            encoder: self.encoder.clone(),
            labels:  self.labels.clone(),
            config,
            model,
            state:   ClassifierState::Trained,
            report:  Some(report),
            device:  InferDevice::default(),
        })
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn encoder(&self) -> &SequenceEncoder {
        &self.encoder
    }
}

// ─── TrainedClassifier ────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierState {
    Trained,
    Reloaded,
}

impl fmt::Display for ClassifierState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierState::Trained  => f.write_str("trained"),
            ClassifierState::Reloaded => f.write_str("reloaded"),
        }
    }
}

/// Read-only after construction: prediction takes `&self` and
/// touches no shared mutable state.
#[derive(Clone)]
pub struct TrainedClassifier {
    axis:    Axis,
    encoder: SequenceEncoder,
    labels:  LabelEncoder,
    config:  SequenceClassifierConfig,
    model:   SequenceClassifierModel<InferBackend>,
    state:   ClassifierState,
    report:  Option<TrainingReport>,
    device:  InferDevice,
}

impl TrainedClassifier {
    /// Restores a classifier from loaded artifacts. The encoder's
    /// vocabulary must be the one the weights were trained with.
    pub fn from_artifacts(encoder: SequenceEncoder, artifacts: AxisArtifacts) -> Result<Self> {
        let vocab_size = encoder.vocabulary().size();
        if artifacts.config.vocab_size != vocab_size {
            return Err(PipelineError::incompatible(format!(
                "{} classifier expects {} vocabulary rows, encoder has {vocab_size}",
                artifacts.axis, artifacts.config.vocab_size
            )));
        }
        if artifacts.config.num_classes != artifacts.labels.num_classes() {
            return Err(PipelineError::incompatible(format!(
                "{} classifier has {} outputs for {} classes",
                artifacts.axis,
                artifacts.config.num_classes,
                artifacts.labels.num_classes()
            )));
        }

        Ok(Self {
            axis:    artifacts.axis,
            encoder,
            labels:  artifacts.labels,
            config:  artifacts.config,
            model:   artifacts.model,
            state:   ClassifierState::Reloaded,
            report:  artifacts.report,
            device:  InferDevice::default(),
        })
    }

    /// Loads this axis plus the shared vocabulary from `store`.
    pub fn load(store: &ArtifactStore, axis: Axis) -> Result<Self> {
        let mut bundle = store.load_bundle(&[axis])?;
        let encoder    = SequenceEncoder::with_default_normalizer(bundle.vocabulary.clone());
        Self::from_artifacts(encoder, bundle.take(axis)?)
    }

    /// Writes the shared vocabulary and this axis's artifacts.
    pub fn save(&self, store: &ArtifactStore) -> Result<()> {
        store.save_bundle(self.encoder.vocabulary(), &[self.artifacts()])
    }

    pub fn artifacts(&self) -> AxisArtifacts {
        AxisArtifacts {
            axis:   self.axis,
            labels: self.labels.clone(),
            config: self.config.clone(),
            model:  self.model.clone(),
            report: self.report.clone(),
        }
    }

    pub fn predict_one(&self, text: &str) -> Result<Prediction> {
        self.predict_batch(&[text])?
            .pop()
            .ok_or_else(|| PipelineError::numeric("empty prediction batch"))
    }

    /// One prediction per input, in input order. Each row is
    /// computed independently of the others in the batch.
    pub fn predict_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Prediction>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(i) = texts.iter().position(|t| t.as_ref().trim().is_empty()) {
            return Err(PipelineError::invalid_input(format!("text #{i} is empty")));
        }

        let encoded = texts
            .iter()
            .map(|t| self.encoder.encode_for_model(t.as_ref()))
            .collect::<Vec<_>>();
        let rows    = encoded.iter().map(|e| e.ids()).collect::<Vec<_>>();
        let ids     = stack_ids::<InferBackend>(&rows, &self.device);

        let probs = self
            .model
            .probabilities(ids)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| PipelineError::numeric(format!("unreadable probabilities: {e:?}")))?;

        let num_classes = self.labels.num_classes();
        if probs.len() != texts.len() * num_classes {
            return Err(PipelineError::numeric(format!(
                "expected {} probabilities, model returned {}",
                texts.len() * num_classes,
                probs.len()
            )));
        }

        probs
            .chunks(num_classes)
            .map(|row| Prediction::from_probabilities(self.labels.classes(), row))
            .collect()
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn state(&self) -> ClassifierState {
        self.state
    }

    pub fn encoder(&self) -> &SequenceEncoder {
        &self.encoder
    }

    pub fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    pub fn report(&self) -> Option<&TrainingReport> {
        self.report.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::normalizer::normalize;
    use crate::data::vocabulary::Vocabulary;

    pub(crate) fn tiny_settings() -> ClassifierSettings {
        ClassifierSettings {
            embedding_dim:      8,
            hidden_size:        6,
            second_hidden_size: 4,
            dense_size:         6,
            dropout:            0.1,
            head_dropout:       0.1,
        }
    }

    pub(crate) fn tiny_options() -> TrainingOptions {
        TrainingOptions { epochs: 2, batch_size: 4, validation_split: 0.25, ..Default::default() }
    }

    pub(crate) fn sentiment_corpus() -> (Vec<&'static str>, Vec<&'static str>) {
        let rows = [
            ("great app love it", "Positive"),
            ("amazing fast reliable", "Positive"),
            ("excellent support team", "Positive"),
            ("app crashes constantly", "Negative"),
            ("terrible slow buggy", "Negative"),
            ("awful waste of money", "Negative"),
            ("it is okay", "Neutral"),
            ("average app does the job", "Neutral"),
        ];
        rows.iter().copied().unzip()
    }

    pub(crate) fn shared_encoder(texts: &[&str]) -> SequenceEncoder {
        let tokens = texts.iter().map(|t| normalize(t)).collect::<Vec<_>>();
        let vocab  = Vocabulary::fit(&tokens, 64, 12).unwrap();
        SequenceEncoder::with_default_normalizer(Arc::new(vocab))
    }

    pub(crate) fn trained_sentiment() -> TrainedClassifier {
        let (texts, labels) = sentiment_corpus();
        UnboundClassifier::new(Axis::Sentiment, tiny_settings())
            .unwrap()
            .bind(shared_encoder(&texts))
            .train(&texts, &labels, &tiny_options())
            .unwrap()
    }

    #[test]
    fn test_default_settings_per_axis() {
        let s = ClassifierSettings::for_axis(Axis::Sentiment);
        let i = ClassifierSettings::for_axis(Axis::Intent);
        assert_eq!((s.hidden_size, s.second_hidden_size), (64, 32));
        assert_eq!((i.hidden_size, i.second_hidden_size), (128, 64));
        assert!(s.model_config(Axis::Sentiment, 10, 3).bidirectional);
        assert!(!i.model_config(Axis::Intent, 10, 5).bidirectional);
    }

    #[test]
    fn test_train_then_predict_probability_invariants() {
        let clf = trained_sentiment();
        assert_eq!(clf.state(), ClassifierState::Trained);
        assert_eq!(clf.report().unwrap().epochs.len(), 2);

        for p in clf.predict_batch(&["great app", "app crashes constantly", "qwerty zxcv"]).unwrap() {
            assert!((p.total_probability() - 1.0).abs() < 1e-4);
            let max = p.distribution.iter().map(|(_, v)| *v).fold(f32::MIN, f32::max);
            assert_eq!(p.confidence, max);
            assert_eq!(p.probability(&p.label), Some(p.confidence));
            assert!((0.0..=1.0).contains(&p.confidence));
            assert_eq!(p.distribution.len(), 3);
        }
    }

    #[test]
    fn test_predict_one_matches_batch_and_is_order_independent() {
        let clf   = trained_sentiment();
        let texts = ["great app", "app crashes constantly", "it is okay"];

        let forward  = clf.predict_batch(&texts).unwrap();
        let reversed = clf.predict_batch(&[texts[2], texts[1], texts[0]]).unwrap();

        for (i, text) in texts.iter().enumerate() {
            let single = clf.predict_one(text).unwrap();
            assert_eq!(single.label, forward[i].label);
            assert!((single.confidence - forward[i].confidence).abs() < 1e-5);
            assert_eq!(reversed[2 - i].label, forward[i].label);
            assert!((reversed[2 - i].confidence - forward[i].confidence).abs() < 1e-5);
        }
    }

    #[test]
    fn test_empty_text_is_rejected() {
        let clf = trained_sentiment();
        assert!(matches!(clf.predict_one("   "), Err(PipelineError::InputValidation(_))));
        assert!(clf.predict_batch::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_training_label_is_surfaced() {
        let texts  = ["fine", "bad"];
        let labels = ["Positive", "Furious"];
        let result = UnboundClassifier::new(Axis::Sentiment, tiny_settings())
            .unwrap()
            .bind(shared_encoder(&texts))
            .train(&texts, &labels, &tiny_options());
        assert!(matches!(result, Err(PipelineError::UnknownLabel { .. })));
    }

    #[test]
    fn test_two_axes_share_one_vocabulary() {
        let (texts, labels) = sentiment_corpus();
        let encoder   = shared_encoder(&texts);
        let sentiment = UnboundClassifier::new(Axis::Sentiment, tiny_settings())
            .unwrap()
            .bind(encoder.clone());
        let intent    = UnboundClassifier::new(Axis::Intent, tiny_settings())
            .unwrap()
            .bind(encoder);

        assert!(sentiment.encoder().shares_vocabulary_with(intent.encoder()));
        assert_eq!(
            sentiment.encoder().encode_for_model("great app crashes"),
            intent.encoder().encode_for_model("great app crashes")
        );

        let trained = sentiment.train(&texts, &labels, &tiny_options()).unwrap();
        assert!(trained.encoder().shares_vocabulary_with(intent.encoder()));
    }
}
