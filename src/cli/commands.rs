// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Three subcommands:
//
//   train    train both classifiers and write the bundle
//   predict  classify one or more texts with a saved bundle
//   report   analytics over a JSON file of feedback records
//
// Every path flag also reads an environment variable, so a
// deployment can point all commands at one artifact directory.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use feedback_intel::application::train_use_case::TrainConfig;
use feedback_intel::config::{
    DEFAULT_ARTIFACT_DIR, DEFAULT_BATCH_SIZE, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE, DEFAULT_SEED,
    DEFAULT_VALIDATION_SPLIT, EMBEDDING_DIM, MAX_SEQUENCE_LENGTH, MAX_VOCAB_SIZE,
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the sentiment and intent classifiers
    Train(TrainArgs),

    /// Predict sentiment and intent for the given texts
    Predict(PredictArgs),

    /// Summaries, trends and negative feedback for a set of records
    Report(ReportArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Labelled JSONL corpus ({"text", "axis", "label"} per line).
    /// Defaults to the bundled seed corpus.
    #[arg(long, env = "FEEDBACK_INTEL_CORPUS")]
    pub corpus: Option<PathBuf>,

    /// Where the artifact bundle, metrics.csv and train_config.json go
    #[arg(long, env = "FEEDBACK_INTEL_ARTIFACT_DIR", default_value = DEFAULT_ARTIFACT_DIR)]
    pub artifact_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_EPOCHS)]
    pub epochs: usize,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Fraction of each axis's corpus held out for validation
    #[arg(long, default_value_t = DEFAULT_VALIDATION_SPLIT)]
    pub validation_split: f64,

    #[arg(long, default_value_t = DEFAULT_LEARNING_RATE)]
    pub lr: f64,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Corpus multiplier for punctuation variants; 1 disables it
    #[arg(long, default_value_t = 3)]
    pub augment: usize,

    /// Index space size, including the padding and OOV slots
    #[arg(long, default_value_t = MAX_VOCAB_SIZE)]
    pub max_vocab_size: usize,

    /// Every text is padded or truncated to this many tokens
    #[arg(long, default_value_t = MAX_SEQUENCE_LENGTH)]
    pub max_seq_len: usize,

    #[arg(long, default_value_t = EMBEDDING_DIM)]
    pub embedding_dim: usize,

    /// Dropout after the recurrent layers (both axes)
    #[arg(long, default_value_t = 0.3)]
    pub dropout: f64,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        let mut cfg = TrainConfig {
            corpus_path:             a.corpus,
            artifact_dir:            a.artifact_dir,
            epochs:                  a.epochs,
            batch_size:              a.batch_size,
            validation_split:        a.validation_split,
            learning_rate:           a.lr,
            seed:                    a.seed,
            augmentation_multiplier: a.augment,
            max_vocab_size:          a.max_vocab_size,
            max_sequence_length:     a.max_seq_len,
            ..TrainConfig::default()
        };
        for settings in [&mut cfg.sentiment, &mut cfg.intent] {
            settings.embedding_dim = a.embedding_dim;
            settings.dropout       = a.dropout;
        }
        cfg
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Text to classify; repeat for a batch
    #[arg(long = "text", required = true)]
    pub texts: Vec<String>,

    #[arg(long, env = "FEEDBACK_INTEL_ARTIFACT_DIR", default_value = DEFAULT_ARTIFACT_DIR)]
    pub artifact_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// JSON array of feedback records
    #[arg(long)]
    pub records: PathBuf,

    /// Classify records that have no sentiment yet before reporting
    #[arg(long)]
    pub analyze: bool,

    /// Maximum number of negative records listed
    #[arg(long, default_value_t = 10)]
    pub negative_limit: usize,

    #[arg(long, env = "FEEDBACK_INTEL_ARTIFACT_DIR", default_value = DEFAULT_ARTIFACT_DIR)]
    pub artifact_dir: PathBuf,
}
