// ============================================================
// Layer 4 — Data Layer
// ============================================================
// Everything between labelled samples and model-ready tensors:
//
//   JointSample   → one utterance (tokens, intent, slots, dense)
//       │
//       ▼
//   JointBatcher  → pads a Vec of samples into a JointBatch
//       │
//       ▼
//   JointInput / JointTargets → what JointModel reads
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Padded batches, masks and the Burn Batcher implementation
pub mod batch;

/// Random samples for smoke-testing an assembled model
pub mod synthetic;
