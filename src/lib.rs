#![recursion_limit = "256"]

// ============================================================
// feedback-intel
// ============================================================
// Sentiment (3 classes) and intent (5 classes) classification of
// customer feedback, plus analytics over classified records.
//
//   application  use cases: train, analyze, reloadable service
//   domain       plain types, traits and the error taxonomy
//   data         normalisation, vocabulary, corpus, batching
//   ml           burn model, training loop, classifier lifecycle
//   infra        artifact bundle, in-memory store, metrics CSV
//   analytics    summary / distribution / trend / negative
//
// The binary in main.rs adds the CLI on top.

pub mod analytics;
pub mod application;
pub mod config;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;
