// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn module code lives here. The domain layer holds the
// plain serde records; this layer turns them into modules.
//
//   embedding.rs      — shared word embedding
//   representation/   — BiLSTM + attention, or joint CNN
//   decoder.rs        — doc / word MLP heads, dense feature fold-in
//   output/           — classification, word tagging, CRF
//   model.rs          — JointModel and its config
//   assembler.rs      — config + features + metadata → JointModel
//   ops.rs            — masked pooling and softmax helpers
//
// Reference: Burn Book §3 (Building Blocks)
//            Liu & Lane (2016) Attention-Based RNN Models for
//            Joint Intent Detection and Slot Filling

/// Model assembly from configuration documents
pub mod assembler;

pub mod decoder;
pub mod embedding;

/// JointModel: forward, loss, predict
pub mod model;

pub mod ops;
pub mod output;
pub mod representation;
