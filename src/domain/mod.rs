// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types and traits: no burn, no file I/O.
//
//   axis        the two classification tasks and their class lists
//   example     one labelled training text
//   feedback    records, labels, sources, analysis results
//   prediction  classifier output
//   traits      storage and corpus seams
//   error       the pipeline error taxonomy

pub mod axis;

pub mod error;

pub mod example;

pub mod feedback;

pub mod prediction;

pub mod traits;
