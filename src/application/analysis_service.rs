// ============================================================
// Layer 2 - Analysis Service
// ============================================================
// Owns the classifier pair used to analyze feedback.
//
//   FeedbackAnalyzer  sentiment + intent classifiers built from
//                     one bundle, sharing one vocabulary. Never
//                     mutated after construction.
//
//   AnalysisService   holds the current analyzer (if any) behind
//                     a lock. `init` loads at process start,
//                     `reload` builds a replacement off to the
//                     side and swaps it in whole. In-flight calls
//                     keep the Arc they started with.
//
// With no analyzer loaded every call fails with `NotReady`.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::data::vocabulary::SequenceEncoder;
use crate::domain::axis::Axis;
use crate::domain::error::{PipelineError, Result};
use crate::domain::feedback::FeedbackAnalysis;
use crate::domain::prediction::Prediction;
use crate::infra::artifact_store::ArtifactStore;
use crate::ml::classifier::TrainedClassifier;

// ─── AnalysisOutcome ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub text:      String,
    pub sentiment: Prediction,
    pub intent:    Prediction,
}

impl AnalysisOutcome {
    /// The typed label + score pair that gets stored on a record.
    pub fn to_analysis(&self) -> Result<FeedbackAnalysis> {
        Ok(FeedbackAnalysis {
            sentiment: self.sentiment.to_analysis()?,
            intent:    self.intent.to_analysis()?,
        })
    }
}

// ─── FeedbackAnalyzer ─────────────────────────────────────────────────────────
pub struct FeedbackAnalyzer {
    sentiment: TrainedClassifier,
    intent:    TrainedClassifier,
}

impl FeedbackAnalyzer {
    pub fn new(sentiment: TrainedClassifier, intent: TrainedClassifier) -> Result<Self> {
        if sentiment.axis() != Axis::Sentiment || intent.axis() != Axis::Intent {
            return Err(PipelineError::incompatible(format!(
                "analyzer needs a sentiment and an intent classifier, got {} and {}",
                sentiment.axis(),
                intent.axis()
            )));
        }
        if !sentiment.encoder().shares_vocabulary_with(intent.encoder()) {
            return Err(PipelineError::incompatible(
                "sentiment and intent classifiers use different vocabularies",
            ));
        }
        Ok(Self { sentiment, intent })
    }

    /// Loads both axes and the shared vocabulary in one pass.
    pub fn load(store: &ArtifactStore) -> Result<Self> {
        let mut bundle = store.load_bundle(&Axis::ALL)?;
        let encoder    = SequenceEncoder::with_default_normalizer(bundle.vocabulary.clone());

        let sentiment = TrainedClassifier::from_artifacts(encoder.clone(), bundle.take(Axis::Sentiment)?)?;
        let intent    = TrainedClassifier::from_artifacts(encoder, bundle.take(Axis::Intent)?)?;

        tracing::info!(
            "Loaded analyzer from '{}' (vocabulary: {} entries)",
            store.root().display(),
            bundle.vocabulary.size()
        );
        Self::new(sentiment, intent)
    }

    pub fn analyze(&self, text: &str) -> Result<AnalysisOutcome> {
        self.analyze_batch(&[text])?
            .pop()
            .ok_or_else(|| PipelineError::numeric("empty analysis batch"))
    }

    /// Both axes for every text, in input order.
    pub fn analyze_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<AnalysisOutcome>> {
        let sentiments = self.sentiment.predict_batch(texts)?;
        let intents    = self.intent.predict_batch(texts)?;

        Ok(texts
            .iter()
            .zip(sentiments.into_iter().zip(intents))
            .map(|(text, (sentiment, intent))| AnalysisOutcome {
                text: text.as_ref().to_string(),
                sentiment,
                intent,
            })
            .collect())
    }

    pub fn sentiment(&self) -> &TrainedClassifier {
        &self.sentiment
    }

    pub fn intent(&self) -> &TrainedClassifier {
        &self.intent
    }
}

// ─── AnalysisService ──────────────────────────────────────────────────────────
pub struct AnalysisService {
    store:   ArtifactStore,
    current: RwLock<Option<Arc<FeedbackAnalyzer>>>,
}

impl AnalysisService {
    /// A service with nothing loaded yet.
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            store:   ArtifactStore::new(artifact_dir),
            current: RwLock::new(None),
        }
    }

    /// Process-start construction. A missing or unreadable bundle is
    /// logged and leaves the service not ready rather than failing.
    pub fn init(artifact_dir: impl Into<PathBuf>) -> Self {
        let service = Self::new(artifact_dir);
        if let Err(e) = service.reload() {
            tracing::warn!("Analyzer not loaded from '{}': {e}", service.store.root().display());
        }
        service
    }

    /// Loads a fresh analyzer and swaps it in. On failure the
    /// previous analyzer (or none) stays in place.
    pub fn reload(&self) -> Result<()> {
        let analyzer = FeedbackAnalyzer::load(&self.store)?;
        self.install(analyzer);
        tracing::info!("Analyzer reloaded from '{}'", self.store.root().display());
        Ok(())
    }

    /// Swaps in an analyzer built elsewhere (e.g. right after training).
    pub fn install(&self, analyzer: FeedbackAnalyzer) {
        *self.current.write() = Some(Arc::new(analyzer));
    }

    pub fn is_ready(&self) -> bool {
        self.current.read().is_some()
    }

    pub fn analyzer(&self) -> Result<Arc<FeedbackAnalyzer>> {
        self.current
            .read()
            .clone()
            .ok_or_else(|| PipelineError::not_ready("models are not trained or loaded yet"))
    }

    pub fn analyze(&self, text: &str) -> Result<AnalysisOutcome> {
        self.analyzer()?.analyze(text)
    }

    pub fn artifact_store(&self) -> &ArtifactStore {
        &self.store
    }
}
