// ============================================================
// Analytics - Aggregator
// ============================================================
// All queries take the record list in insertion order, which is
// what `FeedbackStore::snapshot` returns. Insertion order is the
// tie-breaker everywhere a grouping has to pick a winner:
//
//   top intent      → among equal counts, the intent seen first
//   distributions   → groups listed in first-seen order
//   trend_by_date   → within one date, sentiments in first-seen order
//
// Records without a sentiment (not analyzed yet) count towards
// `total` and the source distribution only.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::domain::error::Result;
use crate::domain::feedback::{ClassLabel, FeedbackRecord, Intent, Sentiment};
use crate::domain::traits::FeedbackStore;

// ─── Distribution ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionField {
    Sentiment,
    Intent,
    Source,
}

/// Counts per distinct value, in first-encountered order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    entries: Vec<(String, usize)>,
}

impl Distribution {
    fn from_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut entries: Vec<(String, usize)> = Vec::new();
        let mut index:   HashMap<&str, usize> = HashMap::new();

        for value in values {
            match index.get(value) {
                Some(&i) => entries[i].1 += 1,
                None => {
                    index.insert(value, entries.len());
                    entries.push((value.to_string(), 1));
                }
            }
        }
        Self { entries }
    }

    /// Zero for values that never occurred.
    pub fn get(&self, value: &str) -> usize {
        self.entries
            .iter()
            .find(|(v, _)| v == value)
            .map_or(0, |(_, n)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(v, n)| (v.as_str(), *n))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// Count descending; equal counts keep first-encountered order.
    pub fn sorted_by_count(&self) -> Vec<(&str, usize)> {
        let mut sorted = self.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }

    pub fn to_map(&self) -> BTreeMap<String, usize> {
        self.entries.iter().cloned().collect()
    }
}

impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (value, count) in &self.entries {
            map.serialize_entry(value, count)?;
        }
        map.end()
    }
}

// ─── Summary / trend ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total: usize,

    /// Mean over analyzed records; 0.0 when none are analyzed.
    pub avg_sentiment_score: f64,

    /// None on a store with no analyzed records.
    #[serde(serialize_with = "top_intent_or_na")]
    pub top_intent: Option<Intent>,

    pub sentiment_distribution: Distribution,
    pub intent_distribution:    Distribution,
    pub source_distribution:    Distribution,
}

impl AnalyticsSummary {
    pub fn top_intent_label(&self) -> &'static str {
        self.top_intent.as_ref().map_or("N/A", |i| i.as_str())
    }
}

fn top_intent_or_na<S: Serializer>(
    top_intent: &Option<Intent>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(top_intent.as_ref().map_or("N/A", |i| i.as_str()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date:      NaiveDate,
    pub sentiment: Sentiment,
    pub count:     usize,
}

// ─── Aggregator ───────────────────────────────────────────────────────────────

pub struct Aggregator {
    records: Vec<FeedbackRecord>,
}

impl Aggregator {
    /// `records` must be in insertion order.
    pub fn new(records: Vec<FeedbackRecord>) -> Self {
        Self { records }
    }

    pub fn from_store(store: &dyn FeedbackStore) -> Result<Self> {
        let records = store.snapshot()?;
        tracing::debug!("Aggregating over a snapshot of {} records", records.len());
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[FeedbackRecord] {
        &self.records
    }

    pub fn summary(&self) -> AnalyticsSummary {
        let scores = self
            .records
            .iter()
            .filter_map(|r| r.sentiment.map(|s| s.score))
            .collect::<Vec<_>>();
        let avg_sentiment_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        let intent_distribution = self.distribution(DistributionField::Intent);

        // Strict `>` keeps the first-seen intent on ties.
        let mut top: Option<(&str, usize)> = None;
        for (value, count) in intent_distribution.iter() {
            if top.map_or(true, |(_, best)| count > best) {
                top = Some((value, count));
            }
        }
        let top_intent = top.and_then(|(value, _)| value.parse::<Intent>().ok());

        AnalyticsSummary {
            total: self.records.len(),
            avg_sentiment_score,
            top_intent,
            sentiment_distribution: self.distribution(DistributionField::Sentiment),
            source_distribution:    self.distribution(DistributionField::Source),
            intent_distribution,
        }
    }

    pub fn distribution(&self, field: DistributionField) -> Distribution {
        let values = self.records.iter().filter_map(|r| match field {
            DistributionField::Sentiment => r.sentiment_label().map(|s| s.as_str()),
            DistributionField::Intent    => r.intent_label().map(|i| i.as_str()),
            DistributionField::Source    => Some(r.source.as_str()),
        });
        Distribution::from_values(values)
    }

    /// Date ascending; within a date, sentiments in first-seen order.
    pub fn trend_by_date(&self) -> Vec<TrendPoint> {
        let mut points: Vec<TrendPoint>                        = Vec::new();
        let mut index:  HashMap<(NaiveDate, Sentiment), usize> = HashMap::new();

        for record in &self.records {
            let Some(sentiment) = record.sentiment_label() else {
                continue;
            };
            let key = (record.date, sentiment);
            match index.get(&key) {
                Some(&i) => points[i].count += 1,
                None => {
                    index.insert(key, points.len());
                    points.push(TrendPoint { date: record.date, sentiment, count: 1 });
                }
            }
        }

        points.sort_by_key(|p| p.date);
        points
    }

    /// Newest negative records first; equal `created_at` puts the
    /// later insertion first.
    pub fn negative(&self, limit: usize) -> Vec<FeedbackRecord> {
        let mut negative = self
            .records
            .iter()
            .rev()
            .filter(|r| r.sentiment_label() == Some(Sentiment::Negative))
            .cloned()
            .collect::<Vec<_>>();
        negative.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        negative.truncate(limit);
        negative
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;
    use crate::domain::feedback::{AxisAnalysis, FeedbackAnalysis, NewFeedback, Source};
    use crate::infra::memory_store::InMemoryFeedbackStore;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
    }

    fn record(
        id:        &str,
        day:       u32,
        minute:    i64,
        sentiment: Option<(Sentiment, f64)>,
        intent:    Intent,
    ) -> FeedbackRecord {
        let date     = NaiveDate::from_ymd_opt(2026, 4, day).unwrap();
        let feedback = NewFeedback::new(id, format!("feedback {id}"), Source::Web, date).unwrap();
        let mut rec  = FeedbackRecord::ingested(feedback, base_time() + Duration::minutes(minute));
        if let Some((label, score)) = sentiment {
            rec.apply_analysis(FeedbackAnalysis {
                sentiment: AxisAnalysis::new(label, score).unwrap(),
                intent:    AxisAnalysis::new(intent, 0.5).unwrap(),
            });
        }
        rec
    }

    fn scenario() -> Vec<FeedbackRecord> {
        vec![
            record("1", 1, 0, Some((Sentiment::Positive, 0.9)), Intent::FeatureRequest),
            record("2", 1, 1, Some((Sentiment::Positive, 0.7)), Intent::BugReport),
            record("3", 2, 2, Some((Sentiment::Negative, 0.8)), Intent::BugReport),
            record("4", 2, 3, None, Intent::GeneralFeedback),
        ]
    }

    #[test]
    fn test_sentiment_distribution_skips_unanalyzed() {
        let agg  = Aggregator::new(scenario());
        let dist = agg.distribution(DistributionField::Sentiment);

        assert_eq!(dist.to_map(), BTreeMap::from([("Positive".to_string(), 2), ("Negative".to_string(), 1)]));
        assert_eq!(dist.get("Neutral"), 0);
        assert_eq!(agg.summary().total, 4);
        assert_eq!(agg.distribution(DistributionField::Source).get("Web"), 4);
    }

    #[test]
    fn test_summary_average_and_top_intent() {
        let summary = Aggregator::new(scenario()).summary();
        assert!((summary.avg_sentiment_score - 0.8).abs() < 1e-9);
        assert_eq!(summary.top_intent, Some(Intent::BugReport));
        assert_eq!(summary.intent_distribution.sorted_by_count()[0], ("Bug Report", 2));
    }

    #[test]
    fn test_top_intent_tie_goes_to_first_seen() {
        let records = vec![
            record("a", 1, 0, Some((Sentiment::Neutral, 0.5)), Intent::PricingIssue),
            record("b", 1, 1, Some((Sentiment::Neutral, 0.5)), Intent::PerformanceIssue),
            record("c", 1, 2, Some((Sentiment::Neutral, 0.5)), Intent::PerformanceIssue),
            record("d", 1, 3, Some((Sentiment::Neutral, 0.5)), Intent::PricingIssue),
        ];
        assert_eq!(Aggregator::new(records).summary().top_intent, Some(Intent::PricingIssue));
    }

    #[test]
    fn test_empty_store_summary() {
        let store   = InMemoryFeedbackStore::new();
        let summary = Aggregator::from_store(&store).unwrap().summary();

        assert_eq!(summary.total, 0);
        assert_eq!(summary.avg_sentiment_score, 0.0);
        assert_eq!(summary.top_intent, None);
        assert_eq!(summary.top_intent_label(), "N/A");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["top_intent"], "N/A");
    }

    #[test]
    fn test_trend_orders_by_date_then_first_seen_sentiment() {
        let records = vec![
            record("1", 3, 0, Some((Sentiment::Negative, 0.6)), Intent::BugReport),
            record("2", 1, 1, Some((Sentiment::Neutral, 0.6)), Intent::BugReport),
            record("3", 1, 2, Some((Sentiment::Positive, 0.6)), Intent::BugReport),
            record("4", 1, 3, Some((Sentiment::Neutral, 0.6)), Intent::BugReport),
            record("5", 2, 4, None, Intent::BugReport),
        ];
        let trend = Aggregator::new(records).trend_by_date();
        let flat  = trend
            .iter()
            .map(|p| (p.date.to_string(), p.sentiment, p.count))
            .collect::<Vec<_>>();

        assert_eq!(flat, vec![
            ("2026-04-01".to_string(), Sentiment::Neutral, 2),
            ("2026-04-01".to_string(), Sentiment::Positive, 1),
            ("2026-04-03".to_string(), Sentiment::Negative, 1),
        ]);
    }

    #[test]
    fn test_negative_newest_first_with_limit() {
        let records = vec![
            record("old", 1, 0, Some((Sentiment::Negative, 0.9)), Intent::BugReport),
            record("pos", 1, 5, Some((Sentiment::Positive, 0.9)), Intent::BugReport),
            record("tie-a", 1, 9, Some((Sentiment::Negative, 0.9)), Intent::BugReport),
            record("tie-b", 1, 9, Some((Sentiment::Negative, 0.9)), Intent::BugReport),
        ];
        let agg = Aggregator::new(records);

        let ids = agg.negative(10).into_iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids, vec!["tie-b", "tie-a", "old"]);
        assert_eq!(agg.negative(1).len(), 1);
        assert!(agg.negative(0).is_empty());
    }

    #[test]
    fn test_distribution_serializes_in_first_seen_order() {
        let dist = Aggregator::new(scenario()).distribution(DistributionField::Intent);
        let json = serde_json::to_string(&dist).unwrap();
        assert_eq!(json, r#"{"Feature Request":1,"Bug Report":2}"#);
    }
}
