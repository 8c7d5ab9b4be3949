// ============================================================
// Pipeline Constants
// ============================================================
// Defaults shared by training, inference and the CLI. Anything
// a training run may override lives in `TrainConfig`; these are
// the values it starts from.

/// Every encoded sequence has exactly this many indices.
pub const MAX_SEQUENCE_LENGTH: usize = 100;

/// Size of the index space, including the padding and OOV slots.
pub const MAX_VOCAB_SIZE: usize = 10_000;

pub const EMBEDDING_DIM: usize = 128;

pub const SENTIMENT_CLASSES: &[&str] = &["Negative", "Neutral", "Positive"];

pub const INTENT_CLASSES: &[&str] = &[
    "Bug Report",
    "Feature Request",
    "Performance Issue",
    "Pricing Issue",
    "General Feedback",
];

pub const DEFAULT_ARTIFACT_DIR: &str = "models";

pub const DEFAULT_SEED: u64 = 42;

pub const DEFAULT_EPOCHS: usize = 15;

pub const DEFAULT_BATCH_SIZE: usize = 32;

pub const DEFAULT_VALIDATION_SPLIT: f64 = 0.2;

pub const DEFAULT_LEARNING_RATE: f64 = 1e-3;
