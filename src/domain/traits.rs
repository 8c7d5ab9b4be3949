// ============================================================
// Layer 3 - Core Traits
// ============================================================
// The seams to the outside world. Storage engines and corpus
// formats live behind these traits; the pipeline only sees the
// trait objects.

use chrono::Utc;

use crate::domain::error::Result;
use crate::domain::example::LabelledExample;
use crate::domain::feedback::{
    FeedbackAnalysis, FeedbackFilter, FeedbackRecord, InsertOutcome, NewFeedback,
};

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Anything that can produce labelled training examples.
///
/// Implementations:
///   - JsonlCorpusLoader → one JSON object per line on disk
///   - SeedCorpus        → the corpus bundled with the crate
pub trait CorpusSource {
    fn load_all(&self) -> Result<Vec<LabelledExample>>;
}

// ─── FeedbackStore ────────────────────────────────────────────────────────────
/// A keyed record store: insert, point lookup, filtered scan.
///
/// Writes replace whole records, so a reader sees either the old
/// or the new version of a record, never a mix. `snapshot` returns
/// records in insertion order; `scan` returns newest first.
pub trait FeedbackStore: Send + Sync {
    /// Stores an already-built record (imports, restores).
    fn insert_record(&self, record: FeedbackRecord) -> Result<InsertOutcome>;

    fn get(&self, id: &str) -> Result<Option<FeedbackRecord>>;

    fn scan(&self, filter: &FeedbackFilter) -> Result<Vec<FeedbackRecord>>;

    fn snapshot(&self) -> Result<Vec<FeedbackRecord>>;

    /// Returns false when no record has this id.
    fn update_analysis(&self, id: &str, analysis: FeedbackAnalysis) -> Result<bool>;

    /// Bulk reset. Returns how many records were removed.
    fn clear(&self) -> Result<usize>;

    /// Ingests new feedback with empty analysis fields.
    fn insert(&self, feedback: NewFeedback) -> Result<InsertOutcome> {
        feedback.validate()?;
        self.insert_record(FeedbackRecord::ingested(feedback, Utc::now()))
    }
}
