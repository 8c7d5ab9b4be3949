// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load labelled corpus          (Layer 4 - data)
//   Step 2: Split per axis + augment      (Layer 4 - data)
//   Step 3: Fit ONE shared vocabulary     (Layer 4 - data)
//   Step 4: Train sentiment classifier    (Layer 5 - ml)
//   Step 5: Train intent classifier       (Layer 5 - ml)
//   Step 6: Save the artifact bundle      (Layer 6 - infra)
//   Step 7: Log metrics + save config     (Layer 6 - infra)
//   Step 8: Smoke-predict fixed samples
//
// Both classifiers are bound to the same `SequenceEncoder`, so
// the vocabulary written to the bundle is exactly the one both
// sets of weights were trained against.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::analysis_service::FeedbackAnalyzer;
use crate::config::{
    DEFAULT_ARTIFACT_DIR, DEFAULT_BATCH_SIZE, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE, DEFAULT_SEED,
    DEFAULT_VALIDATION_SPLIT, MAX_SEQUENCE_LENGTH, MAX_VOCAB_SIZE,
};
use crate::data::{
    augment::augmenter_for,
    corpus::{JsonlCorpusLoader, SeedCorpus},
    normalizer::TextNormalizer,
    vocabulary::{SequenceEncoder, Vocabulary},
};
use crate::domain::axis::Axis;
use crate::domain::example::LabelledCorpus;
use crate::domain::traits::CorpusSource;
use crate::infra::{artifact_store::ArtifactStore, metrics::MetricsLogger};
use crate::ml::classifier::{ClassifierSettings, TrainedClassifier, UnboundClassifier};
use crate::ml::trainer::{TrainingOptions, TrainingReport};

/// Fixed inputs predicted after every run as a sanity check.
pub const SMOKE_SAMPLES: [&str; 5] = [
    "The app crashes after login. Very frustrating!",
    "Love the new dark mode feature!",
    "The app is slow and laggy",
    "Please add calendar integration",
    "The pricing is too expensive",
];

// ─── Training Configuration ──────────────────────────────────────────────────
// Every knob of a training run. Saved next to the bundle as
// train_config.json so a bundle can be traced back to its run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Labelled JSONL corpus; None trains on the bundled seed corpus.
    pub corpus_path:             Option<PathBuf>,
    pub artifact_dir:            PathBuf,
    pub epochs:                  usize,
    pub batch_size:              usize,
    pub validation_split:        f64,
    pub learning_rate:           f64,
    pub seed:                    u64,
    /// 1 disables augmentation.
    pub augmentation_multiplier: usize,
    pub max_vocab_size:          usize,
    pub max_sequence_length:     usize,
    pub sentiment:               ClassifierSettings,
    pub intent:                  ClassifierSettings,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus_path:             None,
            artifact_dir:            PathBuf::from(DEFAULT_ARTIFACT_DIR),
            epochs:                  DEFAULT_EPOCHS,
            batch_size:              DEFAULT_BATCH_SIZE,
            validation_split:        DEFAULT_VALIDATION_SPLIT,
            learning_rate:           DEFAULT_LEARNING_RATE,
            seed:                    DEFAULT_SEED,
            augmentation_multiplier: 3,
            max_vocab_size:          MAX_VOCAB_SIZE,
            max_sequence_length:     MAX_SEQUENCE_LENGTH,
            sentiment:               ClassifierSettings::for_axis(Axis::Sentiment),
            intent:                  ClassifierSettings::for_axis(Axis::Intent),
        }
    }
}

impl TrainConfig {
    pub fn training_options(&self) -> TrainingOptions {
        TrainingOptions {
            epochs:           self.epochs,
            batch_size:       self.batch_size,
            validation_split: self.validation_split,
            learning_rate:    self.learning_rate,
            seed:             self.seed,
        }
    }

    fn settings(&self, axis: Axis) -> &ClassifierSettings {
        match axis {
            Axis::Sentiment => &self.sentiment,
            Axis::Intent    => &self.intent,
        }
    }
}

// ─── TrainSummary ─────────────────────────────────────────────────────────────
/// What a finished run reports back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct TrainSummary {
    pub artifact_dir:    PathBuf,
    pub vocabulary_size: usize,
    pub sentiment:       TrainingReport,
    pub intent:          TrainingReport,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainSummary> {
        let (summary, _) = self.execute_with_analyzer()?;
        Ok(summary)
    }

    /// Runs the pipeline and also hands back the freshly trained
    /// analyzer, so a caller can install it without reloading.
    pub fn execute_with_analyzer(&self) -> Result<(TrainSummary, FeedbackAnalyzer)> {
        let cfg  = &self.config;
        let opts = cfg.training_options();
        opts.validate().context("invalid training options")?;

        // ── Step 1: Load labelled corpus ──────────────────────────────────────
        let source: Box<dyn CorpusSource> = match &cfg.corpus_path {
            Some(path) => Box::new(JsonlCorpusLoader::new(path)),
            None       => Box::new(SeedCorpus),
        };
        let examples = source.load_all().context("failed to load the training corpus")?;

        // ── Step 2: Split per axis and augment ────────────────────────────────
        let augmenter = augmenter_for(cfg.augmentation_multiplier);
        let mut corpora: Vec<(Axis, LabelledCorpus)> = Vec::with_capacity(Axis::ALL.len());
        for axis in Axis::ALL {
            let corpus = LabelledCorpus::from_examples(axis, &examples);
            if corpus.is_empty() {
                bail!("the training corpus has no {axis} examples");
            }
            let corpus = augmenter.augment(corpus);
            tracing::info!(
                "{axis} corpus: {} examples after '{}' augmentation",
                corpus.len(),
                augmenter.name()
            );
            corpora.push((axis, corpus));
        }

        // ── Step 3: Fit one vocabulary over both axes ─────────────────────────
        let normalizer = Arc::new(TextNormalizer::new());
        let sequences  = corpora
            .iter()
            .flat_map(|(_, corpus)| normalizer.normalize_batch(&corpus.texts))
            .collect::<Vec<_>>();
        let vocabulary = Vocabulary::fit(&sequences, cfg.max_vocab_size, cfg.max_sequence_length)
            .context("failed to fit the vocabulary")?;
        tracing::info!("Vocabulary size: {}", vocabulary.size());
        let encoder = SequenceEncoder::new(normalizer, Arc::new(vocabulary));

        // ── Steps 4-5: Train both classifiers on the shared encoder ───────────
        let mut trained: Vec<TrainedClassifier> = Vec::with_capacity(corpora.len());
        for (axis, corpus) in &corpora {
            let classifier = UnboundClassifier::new(*axis, cfg.settings(*axis).clone())?
                .bind(encoder.clone())
                .train(&corpus.texts, &corpus.labels, &opts)
                .with_context(|| format!("{axis} training failed"))?;
            trained.push(classifier);
        }
        let intent    = trained.pop().context("intent classifier missing after training")?;
        let sentiment = trained.pop().context("sentiment classifier missing after training")?;

        // ── Step 6: Save the bundle ───────────────────────────────────────────
        let store = ArtifactStore::new(&cfg.artifact_dir);
        store
            .save_bundle(encoder.vocabulary(), &[sentiment.artifacts(), intent.artifacts()])
            .with_context(|| format!("failed to save artifacts to '{}'", cfg.artifact_dir.display()))?;

        // ── Step 7: Metrics CSV + run config ──────────────────────────────────
        let logger = MetricsLogger::new(&cfg.artifact_dir)?;
        for classifier in [&sentiment, &intent] {
            if let Some(report) = classifier.report() {
                logger.log_all(classifier.axis(), &report.epochs)?;
            }
        }
        store.save_train_config(cfg).context("failed to save train_config.json")?;

        let summary = TrainSummary {
            artifact_dir:    cfg.artifact_dir.clone(),
            vocabulary_size: encoder.vocabulary().size(),
            sentiment:       sentiment.report().cloned().context("sentiment report missing")?,
            intent:          intent.report().cloned().context("intent report missing")?,
        };

        // ── Step 8: Smoke predictions ─────────────────────────────────────────
        let analyzer = FeedbackAnalyzer::new(sentiment, intent)?;
        for outcome in analyzer.analyze_batch(&SMOKE_SAMPLES)? {
            tracing::info!(
                "Smoke test: '{}' → sentiment={} ({:.2}), intent={} ({:.2})",
                outcome.text,
                outcome.sentiment.label,
                outcome.sentiment.confidence,
                outcome.intent.label,
                outcome.intent.confidence,
            );
        }

        tracing::info!("Training complete. Artifacts saved to '{}'", cfg.artifact_dir.display());
        Ok((summary, analyzer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::classifier::tests::tiny_settings;

    fn tiny_config(artifact_dir: PathBuf) -> TrainConfig {
        TrainConfig {
            artifact_dir,
            epochs:                  1,
            batch_size:              16,
            augmentation_multiplier: 1,
            max_vocab_size:          300,
            max_sequence_length:     16,
            sentiment:               tiny_settings(),
            intent:                  tiny_settings(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_matches_pipeline_constants() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.epochs, 15);
        assert_eq!(cfg.batch_size, 32);
        assert_eq!(cfg.max_sequence_length, MAX_SEQUENCE_LENGTH);
        assert_eq!(cfg.artifact_dir, PathBuf::from("models"));
        assert!(cfg.training_options().validate().is_ok());
    }

    #[test]
    fn test_seed_corpus_run_writes_a_loadable_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path().to_path_buf());

        let (summary, analyzer) = TrainUseCase::new(cfg.clone()).execute_with_analyzer().unwrap();
        assert_eq!(summary.sentiment.epochs.len(), 1);
        assert_eq!(summary.intent.axis, Axis::Intent);
        assert!(summary.vocabulary_size <= 300);

        let store = ArtifactStore::new(dir.path());
        assert_eq!(store.available_axes(), vec![Axis::Sentiment, Axis::Intent]);
        assert!(dir.path().join("metrics.csv").exists());
        let saved = store.load_train_config::<TrainConfig>().unwrap();
        assert_eq!(saved.max_sequence_length, 16);
        assert_eq!(saved.sentiment.hidden_size, cfg.sentiment.hidden_size);

        let reloaded = FeedbackAnalyzer::load(&store).unwrap();
        for text in ["great app", "app crashes constantly"] {
            let before = analyzer.analyze(text).unwrap();
            let after  = reloaded.analyze(text).unwrap();
            assert_eq!(before.sentiment.label, after.sentiment.label);
            assert!((before.sentiment.confidence - after.sentiment.confidence).abs() < 1e-6);
            assert_eq!(before.intent.label, after.intent.label);
            assert!((before.intent.confidence - after.intent.confidence).abs() < 1e-6);
        }
    }

    #[test]
    fn test_missing_corpus_file_fails_before_training() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            corpus_path: Some(dir.path().join("nope.jsonl")),
            ..tiny_config(dir.path().join("models"))
        };
        assert!(TrainUseCase::new(cfg).execute().is_err());
        assert!(!ArtifactStore::new(dir.path().join("models")).has_bundle());
    }
}
