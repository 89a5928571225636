// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only. No model math and no printing:
// the CLI prints what these use cases return.
//
//   init_use_case.rs     — write starter assembly documents
//   assemble_use_case.rs — load documents, assemble, smoke-test
//
// Reference: Clean Architecture pattern

// Starter documents for a new model directory
pub mod init_use_case;

// Assembly and wiring report
pub mod assemble_use_case;
