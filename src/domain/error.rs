// ============================================================
// Layer 3 - Pipeline Errors
// ============================================================
// One error type for the whole core. The application and CLI
// layers wrap it in anyhow; everything below them returns
// `domain::error::Result`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// An operation ran before the fit/train/load step it depends on.
    #[error("not ready: {0}")]
    NotReady(String),

    /// A label outside the fixed class set reached a label encoder.
    #[error("unknown label '{label}' (expected one of: {})", expected.join(", "))]
    UnknownLabel { label: String, expected: Vec<String> },

    /// A required bundle component is absent on disk.
    #[error("artifact missing: '{}'", path.display())]
    ArtifactMissing { path: PathBuf },

    /// Components exist but were not produced together
    /// (vocabulary fingerprint, class list or format version differ).
    #[error("artifact incompatible: {0}")]
    ArtifactIncompatible(String),

    #[error("invalid input: {0}")]
    InputValidation(String),

    /// Malformed shapes, non-finite losses, unreadable tensor data.
    #[error("numeric failure: {0}")]
    Numeric(String),

    #[error("weight record error: {0}")]
    Recorder(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InputValidation(msg.into())
    }

    pub fn numeric(msg: impl Into<String>) -> Self {
        Self::Numeric(msg.into())
    }

    pub fn incompatible(msg: impl Into<String>) -> Self {
        Self::ArtifactIncompatible(msg.into())
    }

    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self::ArtifactMissing { path: path.into() }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_label_lists_expected_classes() {
        let err = PipelineError::UnknownLabel {
            label:    "Angry".to_string(),
            expected: vec!["Negative".to_string(), "Positive".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unknown label 'Angry' (expected one of: Negative, Positive)"
        );
    }

    #[test]
    fn test_missing_artifact_shows_path() {
        let err = PipelineError::missing("models/vocabulary.json");
        assert!(err.to_string().contains("models/vocabulary.json"));
    }
}
