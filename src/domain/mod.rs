// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain records describing a run. No Burn types here.
//
//   error.rs    — AssemblyError
//   features.rs — word / dense feature configuration
//   metadata.rs — vocabulary sizes of inputs and targets

pub mod error;
pub mod features;
pub mod metadata;
