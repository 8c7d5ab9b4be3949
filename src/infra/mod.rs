// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Persistence and bookkeeping used by more than one layer:
//
//   artifact_store.rs - the on-disk bundle: one vocabulary shared
//                       by both axes, plus per-axis label list,
//                       model config and weights (burn record).
//                       Saves are staged and renamed into place.
//
//   memory_store.rs   - in-memory FeedbackStore (parking_lot
//                       RwLock, whole-record replacement)
//
//   metrics.rs        - per-epoch training metrics as CSV

/// Versioned artifact bundle persistence
pub mod artifact_store;

/// In-memory feedback record store
pub mod memory_store;

/// Training metrics CSV logger
pub mod metrics;
