// ============================================================
// Layer 4 - Corpus Loaders
// ============================================================
// Reads labelled training examples. One JSON object per line:
//
//   {"text": "App crashes on login", "axis": "intent", "label": "Bug Report"}
//
// Blank lines are skipped. A label outside the axis's class list
// fails the whole load with `UnknownLabel`: a bad label is an
// upstream data defect, not something to train around.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::error::{PipelineError, Result};
use crate::domain::example::LabelledExample;
use crate::domain::traits::CorpusSource;

const SEED_CORPUS: &str = include_str!("../../data/seed_corpus.jsonl");

// ─── JsonlCorpusLoader ────────────────────────────────────────────────────────
pub struct JsonlCorpusLoader {
    path: PathBuf,
}

impl JsonlCorpusLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CorpusSource for JsonlCorpusLoader {
    fn load_all(&self) -> Result<Vec<LabelledExample>> {
        if !self.path.exists() {
            return Err(PipelineError::missing(&self.path));
        }
        let content  = fs::read_to_string(&self.path)?;
        let examples = parse_jsonl(&content, &self.path.display().to_string())?;
        tracing::info!("Loaded {} labelled examples from '{}'", examples.len(), self.path.display());
        Ok(examples)
    }
}

// ─── SeedCorpus ───────────────────────────────────────────────────────────────
/// The labelled corpus compiled into the binary, so training works
/// without any input files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedCorpus;

impl CorpusSource for SeedCorpus {
    fn load_all(&self) -> Result<Vec<LabelledExample>> {
        let examples = parse_jsonl(SEED_CORPUS, "seed corpus")?;
        tracing::info!("Loaded {} labelled examples from the seed corpus", examples.len());
        Ok(examples)
    }
}

// ─── Parsing ──────────────────────────────────────────────────────────────────
pub fn parse_jsonl(content: &str, origin: &str) -> Result<Vec<LabelledExample>> {
    let mut examples = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let example: LabelledExample = serde_json::from_str(line).map_err(|e| {
            PipelineError::invalid_input(format!("{origin}, line {}: {e}", i + 1))
        })?;

        if example.text.trim().is_empty() {
            return Err(PipelineError::invalid_input(format!(
                "{origin}, line {}: empty text",
                i + 1
            )));
        }
        if !example.axis.classes().contains(&example.label.as_str()) {
            return Err(PipelineError::UnknownLabel {
                label:    example.label,
                expected: example.axis.classes().iter().map(|c| c.to_string()).collect(),
            });
        }

        examples.push(example);
    }

    Ok(examples)
}
