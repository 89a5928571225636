// ============================================================
// joint-intent-slot
// ============================================================
// Assembles joint intent-classification / slot-filling models
// from a model config, a feature config and dataset metadata.
//
//   Layer 1  cli/          — argument parsing and printing
//   Layer 2  application/  — init and assemble workflows
//   Layer 3  domain/       — errors, features, metadata
//   Layer 4  data/         — samples, padding, batching
//   Layer 5  ml/           — Burn modules and the assembler
//   Layer 6  infra/        — JSON document store

#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;

pub use domain::error::AssemblyError;
pub use ml::{
    assembler::{assemble, AssemblyPlan},
    model::{JointModel, JointModelConfig},
};
