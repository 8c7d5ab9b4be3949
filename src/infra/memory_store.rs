// ============================================================
// Layer 6 - In-Memory Feedback Store
// ============================================================
// Reference `FeedbackStore` behind a parking_lot RwLock.
//
// Records are replaced whole under the write lock, so a reader
// holding the read lock sees each record either before or after
// an update, never half of one. Readers get clones; a snapshot
// is a point-in-time copy and later inserts do not show up in it.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::error::Result;
use crate::domain::feedback::{
    FeedbackAnalysis, FeedbackFilter, FeedbackRecord, IngestReport, InsertOutcome,
};
use crate::domain::traits::FeedbackStore;

#[derive(Default)]
struct StoreInner {
    /// Insertion order.
    records: Vec<FeedbackRecord>,
    /// id → position in `records`.
    index:   HashMap<String, usize>,
}

#[derive(Default)]
pub struct InMemoryFeedbackStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from existing records; duplicate ids after the
    /// first are counted and dropped.
    pub fn from_records(records: impl IntoIterator<Item = FeedbackRecord>) -> (Self, IngestReport) {
        let store      = Self::new();
        let mut report = IngestReport::default();
        {
            let mut inner = store.inner.write();
            for record in records {
                report.record(insert_locked(&mut inner, record));
            }
        }
        (store, report)
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn insert_locked(inner: &mut StoreInner, record: FeedbackRecord) -> InsertOutcome {
    if inner.index.contains_key(&record.id) {
        return InsertOutcome::DuplicateId;
    }
    inner.index.insert(record.id.clone(), inner.records.len());
    inner.records.push(record);
    InsertOutcome::Inserted
}

impl FeedbackStore for InMemoryFeedbackStore {
    fn insert_record(&self, record: FeedbackRecord) -> Result<InsertOutcome> {
        let outcome = insert_locked(&mut self.inner.write(), record);
        Ok(outcome)
    }

    fn get(&self, id: &str) -> Result<Option<FeedbackRecord>> {
        let inner = self.inner.read();
        Ok(inner.index.get(id).map(|&i| inner.records[i].clone()))
    }

    /// Newest `created_at` first; equal timestamps put the later
    /// insertion first.
    fn scan(&self, filter: &FeedbackFilter) -> Result<Vec<FeedbackRecord>> {
        let mut hits = {
            let inner = self.inner.read();
            inner
                .records
                .iter()
                .rev()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect::<Vec<_>>()
        };
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filter.limit {
            hits.truncate(limit);
        }
        Ok(hits)
    }

    fn snapshot(&self) -> Result<Vec<FeedbackRecord>> {
        Ok(self.inner.read().records.clone())
    }

    fn update_analysis(&self, id: &str, analysis: FeedbackAnalysis) -> Result<bool> {
        let mut inner = self.inner.write();
        let Some(&i)  = inner.index.get(id) else {
            return Ok(false);
        };
        let mut updated = inner.records[i].clone();
        updated.apply_analysis(analysis);
        inner.records[i] = updated;
        Ok(true)
    }

    fn clear(&self) -> Result<usize> {
        let mut inner = self.inner.write();
        let removed   = inner.records.len();
        inner.records.clear();
        inner.index.clear();
        tracing::info!("Cleared {removed} feedback records");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::domain::feedback::{AxisAnalysis, Intent, NewFeedback, Sentiment, Source};

    fn record(id: &str, source: Source, minute: i64) -> FeedbackRecord {
        let feedback = NewFeedback::new(id, format!("text {id}"), source, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()).unwrap();
        let base     = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        FeedbackRecord::ingested(feedback, base + Duration::minutes(minute))
    }

    fn analysis(sentiment: Sentiment) -> FeedbackAnalysis {
        FeedbackAnalysis {
            sentiment: AxisAnalysis::new(sentiment, 0.9).unwrap(),
            intent:    AxisAnalysis::new(Intent::GeneralFeedback, 0.6).unwrap(),
        }
    }

    #[test]
    fn test_duplicate_id_is_rejected_not_fatal() {
        let store = InMemoryFeedbackStore::new();
        assert_eq!(store.insert_record(record("a", Source::Web, 0)).unwrap(), InsertOutcome::Inserted);
        assert_eq!(store.insert_record(record("a", Source::Web, 1)).unwrap(), InsertOutcome::DuplicateId);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_validates_new_feedback() {
        let store = InMemoryFeedbackStore::new();
        let bad   = NewFeedback {
            id:     "x".into(),
            text:   "".into(),
            source: Source::Support,
            date:   NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        };
        assert!(store.insert(bad).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_scan_orders_newest_first_with_ties_by_later_insert() {
        let store = InMemoryFeedbackStore::new();
        store.insert_record(record("old", Source::Web, 0)).unwrap();
        store.insert_record(record("tie1", Source::Support, 5)).unwrap();
        store.insert_record(record("tie2", Source::Web, 5)).unwrap();

        let ids = store
            .scan(&FeedbackFilter::all())
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["tie2", "tie1", "old"]);

        let web = store.scan(&FeedbackFilter::all().with_source(Source::Web).with_limit(1)).unwrap();
        assert_eq!(web.len(), 1);
        assert_eq!(web[0].id, "tie2");
    }

    #[test]
    fn test_update_analysis_and_filter_by_sentiment() {
        let store = InMemoryFeedbackStore::new();
        store.insert_record(record("a", Source::Web, 0)).unwrap();
        store.insert_record(record("b", Source::Web, 1)).unwrap();

        assert!(store.update_analysis("a", analysis(Sentiment::Negative)).unwrap());
        assert!(!store.update_analysis("missing", analysis(Sentiment::Negative)).unwrap());

        let negative = store.scan(&FeedbackFilter::all().with_sentiment(Sentiment::Negative)).unwrap();
        assert_eq!(negative.len(), 1);
        assert_eq!(negative[0].id, "a");
        assert!(store.get("a").unwrap().unwrap().is_analyzed());
        assert!(!store.get("b").unwrap().unwrap().is_analyzed());
    }

    #[test]
    fn test_snapshot_is_point_in_time_and_clear_resets() {
        let (store, report) = InMemoryFeedbackStore::from_records(vec![
            record("a", Source::Web, 0),
            record("b", Source::Web, 1),
            record("a", Source::Web, 2),
        ]);
        assert_eq!(report, IngestReport { inserted: 2, duplicates: 1 });

        let snapshot = store.snapshot().unwrap();
        store.insert_record(record("c", Source::Web, 3)).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, "a");

        assert_eq!(store.clear().unwrap(), 3);
        assert!(store.get("a").unwrap().is_none());
    }
}
