// ============================================================
// Layer 5 - ML / Model Layer (burn)
// ============================================================
// All burn model code lives here. The data layer only touches
// burn through its Dataset and Batcher traits.
//
//   model.rs      embedding + stacked (Bi)LSTM classifier
//
//   trainer.rs    seeded train/validation loop with Adam,
//                 returns the inference-backend model and a
//                 per-epoch report
//
//   classifier.rs the classifier lifecycle:
//                 UnboundClassifier → BoundClassifier (vocabulary
//                 attached) → TrainedClassifier (trained or
//                 reloaded, the only state that can predict)
//
// Training runs on Autodiff<NdArray>; inference runs on plain
// NdArray, where dropout is inactive.

use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};

pub type InferBackend = NdArray;
pub type TrainBackend = Autodiff<InferBackend>;
pub type InferDevice  = NdArrayDevice;

/// Sentiment and intent classifier lifecycle
pub mod classifier;

/// Embedding + LSTM sequence classifier architecture
pub mod model;

/// Training loop with validation and per-epoch metrics
pub mod trainer;
