// ============================================================
// Layer 2 - Analyze Use Case
// ============================================================
// Ingestion and classification of feedback records:
//
//   submit / submit_batch   store new feedback, analysis empty
//   analyze_text            classify text without storing it
//   analyze_stored          classify one stored record by id
//   analyze_pending         classify every record still missing
//                           a sentiment
//   aggregator              analytics over a store snapshot
//
// Writes go through `FeedbackStore::update_analysis`, which
// replaces the whole record.

use std::sync::Arc;

use crate::analytics::aggregator::Aggregator;
use crate::application::analysis_service::{AnalysisOutcome, AnalysisService};
use crate::domain::error::{PipelineError, Result};
use crate::domain::feedback::{FeedbackRecord, IngestReport, InsertOutcome, NewFeedback};
use crate::domain::traits::FeedbackStore;

pub struct AnalyzeUseCase<S: FeedbackStore> {
    store:   Arc<S>,
    service: Arc<AnalysisService>,
}

impl<S: FeedbackStore> AnalyzeUseCase<S> {
    pub fn new(store: Arc<S>, service: Arc<AnalysisService>) -> Self {
        Self { store, service }
    }

    pub fn submit(&self, feedback: NewFeedback) -> Result<InsertOutcome> {
        let id      = feedback.id.clone();
        let outcome = self.store.insert(feedback)?;
        if outcome == InsertOutcome::DuplicateId {
            tracing::debug!("Rejected duplicate feedback id '{id}'");
        }
        Ok(outcome)
    }

    /// Validates the whole batch before inserting anything, then
    /// counts inserted and duplicate ids per item.
    pub fn submit_batch(&self, batch: Vec<NewFeedback>) -> Result<IngestReport> {
        batch.iter().try_for_each(NewFeedback::validate)?;

        let mut report = IngestReport::default();
        for feedback in batch {
            report.record(self.store.insert(feedback)?);
        }
        tracing::info!(
            "Ingested feedback batch: {} inserted, {} duplicate ids",
            report.inserted,
            report.duplicates
        );
        Ok(report)
    }

    pub fn analyze_text(&self, text: &str) -> Result<AnalysisOutcome> {
        self.service.analyze(text)
    }

    /// Classifies a stored record and writes the result back.
    pub fn analyze_stored(&self, id: &str) -> Result<FeedbackRecord> {
        let mut record = self
            .store
            .get(id)?
            .ok_or_else(|| PipelineError::invalid_input(format!("no feedback with id '{id}'")))?;

        let analysis = self.service.analyze(&record.text)?.to_analysis()?;
        if !self.store.update_analysis(id, analysis)? {
            return Err(PipelineError::invalid_input(format!("feedback '{id}' was removed during analysis")));
        }
        record.apply_analysis(analysis);
        Ok(record)
    }

    /// Returns how many records were classified.
    pub fn analyze_pending(&self) -> Result<usize> {
        let analyzer = self.service.analyzer()?;
        let pending  = self
            .store
            .snapshot()?
            .into_iter()
            .filter(|r| r.sentiment.is_none())
            .collect::<Vec<_>>();
        if pending.is_empty() {
            return Ok(0);
        }

        let texts    = pending.iter().map(|r| r.text.as_str()).collect::<Vec<_>>();
        let outcomes = analyzer.analyze_batch(&texts)?;

        let mut updated = 0usize;
        for (record, outcome) in pending.iter().zip(&outcomes) {
            if self.store.update_analysis(&record.id, outcome.to_analysis()?)? {
                updated += 1;
            }
        }
        tracing::info!("Analyzed {updated} pending feedback records");
        Ok(updated)
    }

    pub fn aggregator(&self) -> Result<Aggregator> {
        Aggregator::from_store(self.store.as_ref())
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::application::analysis_service::tests::tiny_analyzer;
    use crate::domain::feedback::Source;
    use crate::infra::memory_store::InMemoryFeedbackStore;

    fn feedback(id: &str, text: &str) -> NewFeedback {
        NewFeedback::new(id, text, Source::MobileApp, NaiveDate::from_ymd_opt(2026, 5, 2).unwrap()).unwrap()
    }

    fn ready_use_case() -> AnalyzeUseCase<InMemoryFeedbackStore> {
        let dir     = tempfile::tempdir().unwrap();
        let service = AnalysisService::new(dir.path());
        service.install(tiny_analyzer());
        AnalyzeUseCase::new(Arc::new(InMemoryFeedbackStore::new()), Arc::new(service))
    }

    #[test]
    fn test_submit_batch_counts_duplicates() {
        let uc     = ready_use_case();
        let report = uc
            .submit_batch(vec![
                feedback("1", "great app"),
                feedback("2", "app crashes on login"),
                feedback("1", "great app again"),
            ])
            .unwrap();

        assert_eq!(report, IngestReport { inserted: 2, duplicates: 1 });
        assert!(!uc.store().get("1").unwrap().unwrap().is_analyzed());
    }

    #[test]
    fn test_submit_batch_rejects_invalid_items_before_inserting() {
        let uc  = ready_use_case();
        let bad = NewFeedback { text: "   ".into(), ..feedback("2", "placeholder") };

        assert!(matches!(
            uc.submit_batch(vec![feedback("1", "great app"), bad]),
            Err(PipelineError::InputValidation(_))
        ));
        assert!(uc.store().is_empty());
    }

    #[test]
    fn test_analyze_pending_fills_every_record() {
        let uc = ready_use_case();
        uc.submit_batch(vec![
            feedback("1", "great app love it"),
            feedback("2", "app is slow and laggy"),
            feedback("3", "price went up again"),
        ])
        .unwrap();

        assert_eq!(uc.analyze_pending().unwrap(), 3);
        assert_eq!(uc.analyze_pending().unwrap(), 0);

        let summary = uc.aggregator().unwrap().summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.sentiment_distribution.total(), 3);
        assert!(summary.top_intent.is_some());
        assert!((0.0..=1.0).contains(&summary.avg_sentiment_score));
    }

    #[test]
    fn test_analyze_stored_writes_back() {
        let uc = ready_use_case();
        uc.submit(feedback("7", "app crashes constantly")).unwrap();

        let record = uc.analyze_stored("7").unwrap();
        assert!(record.is_analyzed());
        assert_eq!(uc.store().get("7").unwrap().unwrap(), record);

        assert!(matches!(uc.analyze_stored("missing"), Err(PipelineError::InputValidation(_))));
    }

    #[test]
    fn test_not_ready_service_surfaces_error() {
        let dir = tempfile::tempdir().unwrap();
        let uc  = AnalyzeUseCase::new(
            Arc::new(InMemoryFeedbackStore::new()),
            Arc::new(AnalysisService::new(dir.path())),
        );
        uc.submit(feedback("1", "great app")).unwrap();

        assert!(matches!(uc.analyze_text("great app"), Err(PipelineError::NotReady(_))));
        assert!(matches!(uc.analyze_pending(), Err(PipelineError::NotReady(_))));
    }
}
