// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File access shared by the use cases:
//
//   config_store.rs — model_config.json, feature_config.json
//                     and metadata.json in one directory
//
// Reference: Rust Book §9 (Error Handling with anyhow)

/// Assembly document persistence
pub mod config_store;
