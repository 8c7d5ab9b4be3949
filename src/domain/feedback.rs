// ============================================================
// Layer 3 - Feedback Domain Types
// ============================================================
// A feedback record is created on ingestion with no analysis,
// then the classification step fills in one `AxisAnalysis` per
// axis. A label and its score travel together, so a record can
// never carry a label without a score.
//
// On the wire (JSON files, external stores) a record is flat:
//   { "id", "text", "source", "date",
//     "sentiment", "sentiment_score", "intent", "intent_score",
//     "created_at" }
// and `FeedbackRow` is the checked conversion between the two.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::axis::Axis;
use crate::domain::error::{PipelineError, Result};

// ─── Class labels ─────────────────────────────────────────────────────────────

/// A closed label set belonging to one classification axis.
pub trait ClassLabel: Copy + Eq + fmt::Debug + FromStr<Err = PipelineError> {
    const AXIS: Axis;

    fn as_str(&self) -> &'static str;
}

fn unknown_label(label: &str, axis: Axis) -> PipelineError {
    PipelineError::UnknownLabel {
        label:    label.to_string(),
        expected: axis.classes().iter().map(|c| c.to_string()).collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Negative, Sentiment::Neutral, Sentiment::Positive];
}

impl ClassLabel for Sentiment {
    const AXIS: Axis = Axis::Sentiment;

    fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Negative => "Negative",
            Sentiment::Neutral  => "Neutral",
            Sentiment::Positive => "Positive",
        }
    }
}

impl FromStr for Sentiment {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Sentiment::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| unknown_label(s, Axis::Sentiment))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    #[serde(rename = "Bug Report")]
    BugReport,
    #[serde(rename = "Feature Request")]
    FeatureRequest,
    #[serde(rename = "Performance Issue")]
    PerformanceIssue,
    #[serde(rename = "Pricing Issue")]
    PricingIssue,
    #[serde(rename = "General Feedback")]
    GeneralFeedback,
}

impl Intent {
    pub const ALL: [Intent; 5] = [
        Intent::BugReport,
        Intent::FeatureRequest,
        Intent::PerformanceIssue,
        Intent::PricingIssue,
        Intent::GeneralFeedback,
    ];
}

impl ClassLabel for Intent {
    const AXIS: Axis = Axis::Intent;

    fn as_str(&self) -> &'static str {
        match self {
            Intent::BugReport        => "Bug Report",
            Intent::FeatureRequest   => "Feature Request",
            Intent::PerformanceIssue => "Performance Issue",
            Intent::PricingIssue     => "Pricing Issue",
            Intent::GeneralFeedback  => "General Feedback",
        }
    }
}

impl FromStr for Intent {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Intent::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| unknown_label(s, Axis::Intent))
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    )*};
}

display_as_str!(Sentiment, Intent, Source);

// ─── Source ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "Mobile App")]
    MobileApp,
    Web,
    Support,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::MobileApp, Source::Web, Source::Support];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::MobileApp => "Mobile App",
            Source::Web       => "Web",
            Source::Support   => "Support",
        }
    }
}

impl FromStr for Source {
    type Err = PipelineError;

    /// Accepts "Mobile App", "MobileApp", "mobile_app", "mobile-app".
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "mobileapp" => Ok(Source::MobileApp),
            "web"       => Ok(Source::Web),
            "support"   => Ok(Source::Support),
            _ => Err(PipelineError::invalid_input(format!("unknown feedback source '{s}'"))),
        }
    }
}

// ─── Analysis ─────────────────────────────────────────────────────────────────

/// One axis' classification result: the arg-max label and its probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisAnalysis<L> {
    pub label: L,
    pub score: f64,
}

impl<L> AxisAnalysis<L> {
    pub fn new(label: L, score: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&score) {
            return Err(PipelineError::invalid_input(format!(
                "score {score} is outside [0, 1]"
            )));
        }
        Ok(Self { label, score })
    }
}

/// Both axes for one piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackAnalysis {
    pub sentiment: AxisAnalysis<Sentiment>,
    pub intent:    AxisAnalysis<Intent>,
}

// ─── Ingestion input ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFeedback {
    pub id:     String,
    pub text:   String,
    pub source: Source,
    pub date:   NaiveDate,
}

impl NewFeedback {
    pub fn new(
        id:     impl Into<String>,
        text:   impl Into<String>,
        source: Source,
        date:   NaiveDate,
    ) -> Result<Self> {
        let feedback = Self { id: id.into(), text: text.into(), source, date };
        feedback.validate()?;
        Ok(feedback)
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(PipelineError::invalid_input("feedback id must not be empty"));
        }
        if self.text.trim().is_empty() {
            return Err(PipelineError::invalid_input(format!(
                "feedback '{}' has empty text",
                self.id
            )));
        }
        Ok(())
    }
}

// ─── Stored record ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FeedbackRow", into = "FeedbackRow")]
pub struct FeedbackRecord {
    pub id:         String,
    pub text:       String,
    pub source:     Source,
    pub date:       NaiveDate,
    pub sentiment:  Option<AxisAnalysis<Sentiment>>,
    pub intent:     Option<AxisAnalysis<Intent>>,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    /// A freshly ingested record: analysis fields empty.
    pub fn ingested(feedback: NewFeedback, created_at: DateTime<Utc>) -> Self {
        Self {
            id:         feedback.id,
            text:       feedback.text,
            source:     feedback.source,
            date:       feedback.date,
            sentiment:  None,
            intent:     None,
            created_at,
        }
    }

    /// Sets both axes. Re-applying overwrites the previous result.
    pub fn apply_analysis(&mut self, analysis: FeedbackAnalysis) {
        self.sentiment = Some(analysis.sentiment);
        self.intent    = Some(analysis.intent);
    }

    pub fn is_analyzed(&self) -> bool {
        self.sentiment.is_some() && self.intent.is_some()
    }

    pub fn sentiment_label(&self) -> Option<Sentiment> {
        self.sentiment.map(|a| a.label)
    }

    pub fn intent_label(&self) -> Option<Intent> {
        self.intent.map(|a| a.label)
    }
}

/// Flat, nullable representation used at storage and file boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRow {
    pub id:     String,
    pub text:   String,
    pub source: Source,
    pub date:   NaiveDate,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub intent: Option<Intent>,
    #[serde(default)]
    pub intent_score: Option<f64>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn pair<L>(id: &str, axis: Axis, label: Option<L>, score: Option<f64>) -> Result<Option<AxisAnalysis<L>>> {
    match (label, score) {
        (Some(label), Some(score)) => AxisAnalysis::new(label, score).map(Some),
        (None, None) => Ok(None),
        _ => Err(PipelineError::invalid_input(format!(
            "record '{id}': {axis} label and score must be set together"
        ))),
    }
}

impl TryFrom<FeedbackRow> for FeedbackRecord {
    type Error = PipelineError;

    fn try_from(row: FeedbackRow) -> Result<Self> {
        if row.text.trim().is_empty() {
            return Err(PipelineError::invalid_input(format!("record '{}' has empty text", row.id)));
        }
        let sentiment = pair(&row.id, Axis::Sentiment, row.sentiment, row.sentiment_score)?;
        let intent    = pair(&row.id, Axis::Intent, row.intent, row.intent_score)?;
        Ok(Self {
            id:         row.id,
            text:       row.text,
            source:     row.source,
            date:       row.date,
            sentiment,
            intent,
            created_at: row.created_at,
        })
    }
}

impl From<FeedbackRecord> for FeedbackRow {
    fn from(r: FeedbackRecord) -> Self {
        Self {
            id:              r.id,
            text:            r.text,
            source:          r.source,
            date:            r.date,
            sentiment:       r.sentiment.map(|a| a.label),
            sentiment_score: r.sentiment.map(|a| a.score),
            intent:          r.intent.map(|a| a.label),
            intent_score:    r.intent.map(|a| a.score),
            created_at:      r.created_at,
        }
    }
}

// ─── Store outcomes and filters ───────────────────────────────────────────────

/// Result of inserting one record. A duplicate id is a rejection,
/// not an error, so bulk callers can count per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    DuplicateId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub inserted:   usize,
    pub duplicates: usize,
}

impl IngestReport {
    pub fn record(&mut self, outcome: InsertOutcome) {
        match outcome {
            InsertOutcome::Inserted    => self.inserted += 1,
            InsertOutcome::DuplicateId => self.duplicates += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackFilter {
    pub source:    Option<Source>,
    pub sentiment: Option<Sentiment>,
    pub limit:     Option<usize>,
}

impl FeedbackFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &FeedbackRecord) -> bool {
        self.source.map_or(true, |s| record.source == s)
            && self
                .sentiment
                .map_or(true, |s| record.sentiment_label() == Some(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{INTENT_CLASSES, SENTIMENT_CLASSES};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    #[test]
    fn test_label_enums_follow_class_lists() {
        let sentiments: Vec<&str> = Sentiment::ALL.iter().map(|s| s.as_str()).collect();
        let intents: Vec<&str>    = Intent::ALL.iter().map(|i| i.as_str()).collect();
        assert_eq!(sentiments, SENTIMENT_CLASSES);
        assert_eq!(intents, INTENT_CLASSES);
    }

    #[test]
    fn test_unknown_intent_is_rejected() {
        let err = "Refund".parse::<Intent>().unwrap_err();
        assert!(matches!(err, PipelineError::UnknownLabel { .. }));
    }

    #[test]
    fn test_source_parsing_variants() {
        assert_eq!("Mobile App".parse::<Source>().unwrap(), Source::MobileApp);
        assert_eq!("mobile_app".parse::<Source>().unwrap(), Source::MobileApp);
        assert_eq!("WEB".parse::<Source>().unwrap(), Source::Web);
        assert!("Email".parse::<Source>().is_err());
    }

    #[test]
    fn test_new_feedback_rejects_blank_text() {
        let err = NewFeedback::new("F1", "   ", Source::Web, date()).unwrap_err();
        assert!(matches!(err, PipelineError::InputValidation(_)));
    }

    #[test]
    fn test_score_out_of_range_is_rejected() {
        assert!(AxisAnalysis::new(Sentiment::Positive, 1.2).is_err());
        assert!(AxisAnalysis::new(Sentiment::Positive, 0.9).is_ok());
    }

    #[test]
    fn test_row_with_label_but_no_score_fails() {
        let json = r#"{"id":"F1","text":"slow","source":"Web","date":"2026-01-02",
                       "sentiment":"Negative"}"#;
        assert!(serde_json::from_str::<FeedbackRecord>(json).is_err());
    }

    #[test]
    fn test_row_json_shape() {
        let json = r#"{"id":"F1","text":"App crashes","source":"Mobile App","date":"2026-01-02",
                       "sentiment":"Negative","sentiment_score":0.9,
                       "intent":"Bug Report","intent_score":0.8,
                       "created_at":"2026-01-02T10:00:00Z"}"#;
        let record: FeedbackRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.sentiment_label(), Some(Sentiment::Negative));
        assert_eq!(record.intent_label(), Some(Intent::BugReport));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["intent"], "Bug Report");
        assert_eq!(back["source"], "Mobile App");
    }

    #[test]
    fn test_apply_analysis_is_idempotent() {
        let feedback = NewFeedback::new("F1", "love it", Source::Web, date()).unwrap();
        let mut record = FeedbackRecord::ingested(feedback, Utc::now());
        assert!(!record.is_analyzed());

        let analysis = FeedbackAnalysis {
            sentiment: AxisAnalysis::new(Sentiment::Positive, 0.8).unwrap(),
            intent:    AxisAnalysis::new(Intent::GeneralFeedback, 0.7).unwrap(),
        };
        record.apply_analysis(analysis);
        let once = record.clone();
        record.apply_analysis(analysis);
        assert_eq!(record, once);
        assert!(record.is_analyzed());
    }
}
