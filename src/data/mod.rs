// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything between raw feedback text and tensor batches.
//
//   labelled JSONL / seed corpus
//       │
//       ▼
//   corpus          → LabelledExample values, labels checked
//       │
//       ▼
//   augment         → optional punctuation variants
//       │
//       ▼
//   normalizer      → clean, tokenize, drop stopwords, lemmatize
//       │
//       ▼
//   vocabulary      → fixed-length index sequences (shared by both axes)
//       │
//       ▼
//   label_encoder   → class codes
//       │
//       ▼
//   dataset/batcher → burn Dataset and Batcher
//
// Inference reuses normalizer + vocabulary through `SequenceEncoder`.

pub mod augment;

pub mod batcher;

/// Labelled corpus loaders (JSONL file, bundled seed corpus)
pub mod corpus;

pub mod dataset;

pub mod label_encoder;

pub mod lemmatizer;

/// Deterministic text → token pipeline
pub mod normalizer;

/// Seeded train/validation split
pub mod splitter;

pub mod vocabulary;
