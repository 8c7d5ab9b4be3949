// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Coordinates the other layers to reach one goal (train the
// classifiers, analyze feedback). No model math here and no
// printing; only workflow.
//
//   train_use_case    corpus → vocabulary → two classifiers → bundle
//   analysis_service  the loaded classifier pair, reloadable
//   analyze_use_case  ingestion, classification, analytics

/// The training workflow
pub mod train_use_case;

/// Loaded analyzer lifecycle (init / reload / install)
pub mod analysis_service;

/// Feedback ingestion and classification workflow
pub mod analyze_use_case;
