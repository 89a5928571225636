// ============================================================
// Layer 2 — AssembleUseCase
// ============================================================
// Builds a model from the documents in a directory and reports
// how it was wired:
//
//   Step 1: Load the three documents         (Layer 6 - infra)
//   Step 2: Plan the assembly                (Layer 5 - ml)
//   Step 3: Allocate the modules             (Layer 5 - ml)
//   Step 4: Optionally run one random batch  (Layer 4 - data)
//           through forward, loss, backward and predict
//
// The smoke batch runs on the NdArray CPU backend wrapped in
// Autodiff, so a gradient reaching the embedding shows the loss
// is connected to the shared layers.

use anyhow::Result;
use burn::{
    backend::{Autodiff, NdArray},
    data::dataloader::batcher::Batcher,
    prelude::*,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use crate::data::{
    batch::JointBatcher,
    synthetic::{synthetic_samples, SyntheticShape},
};
use crate::infra::config_store::ConfigStore;
use crate::ml::{
    assembler::AssemblyPlan,
    model::{JointModel, JointPrediction, ModelSummary},
};

type SmokeBackend = Autodiff<NdArray>;

// ─── Assemble Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct AssembleConfig {
    pub dir:           String,
    /// Number of random samples in the smoke batch; 0 skips it
    pub smoke_batch:   usize,
    pub smoke_seq_len: usize,
    pub seed:          u64,
}

/// Outcome of one random batch.
#[derive(Debug, Clone, Serialize)]
pub struct SmokeReport {
    pub total_loss:     f32,
    pub doc_loss:       f32,
    pub word_loss:      f32,
    pub embedding_grad: bool,
    pub prediction:     JointPrediction,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssembleReport {
    pub summary: ModelSummary,
    pub smoke:   Option<SmokeReport>,
}

// ─── AssembleUseCase ─────────────────────────────────────────────────────────
pub struct AssembleUseCase {
    config: AssembleConfig,
}

impl AssembleUseCase {
    pub fn new(config: AssembleConfig) -> Self {
        Self { config }
    }

    /// Load, plan and allocate the model in `config.dir`.
    ///
    /// Fails when a document is missing or malformed, or when the
    /// plan rejects it; nothing is allocated in that case.
    pub fn execute(&self) -> Result<AssembleReport> {
        let cfg = &self.config;

        // ── Step 1: Load documents ───────────────────────────────────────────
        let docs = ConfigStore::new(&cfg.dir).load()?;

        // ── Step 2: Plan ─────────────────────────────────────────────────────
        let plan = docs.model.plan(&docs.features, &docs.metadata)?;

        // ── Step 3: Allocate ─────────────────────────────────────────────────
        let device = Default::default();
        let model: JointModel<SmokeBackend> = plan.init(&device);
        let summary = model.summary();
        tracing::info!("Assembled model with {} parameters", summary.num_params);

        // ── Step 4: Smoke batch ──────────────────────────────────────────────
        let smoke = (cfg.smoke_batch > 0).then(|| self.smoke(&model, &plan, device));

        Ok(AssembleReport { summary, smoke })
    }

    /// Forward, loss, backward and predict on one seeded random batch.
    fn smoke(
        &self,
        model:  &JointModel<SmokeBackend>,
        plan:   &AssemblyPlan,
        device: <SmokeBackend as Backend>::Device,
    ) -> SmokeReport {
        let shape = SyntheticShape {
            word_vocab:  plan.embedding.vocab_size,
            doc_labels:  plan.decoder_dims.out_dim_doc,
            word_labels: plan.decoder_dims.out_dim_word,
            max_seq_len: self.config.smoke_seq_len,
            dense_dim:   plan.dense_feat_dim,
        };
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let samples = synthetic_samples(&mut rng, &shape, self.config.smoke_batch);
        let token_pad = plan.embedding.pad_token_idx.unwrap_or(0) as u32;
        let slot_pad = plan.word_labels.pad_token_idx.unwrap_or(0);
        let batch = JointBatcher::<SmokeBackend>::new(device)
            .with_padding(token_pad, slot_pad)
            .batch(samples);

        let (loss, output) = model.forward_loss(&batch);
        let prediction = model.predict(&output, &batch.input.seq_lens);

        let total_loss: f32 = loss.total.clone().into_scalar().elem();
        let doc_loss: f32 = loss.doc.into_scalar().elem();
        let word_loss: f32 = loss.word.into_scalar().elem();

        let grads = loss.total.backward();
        let embedding_grad = model.embedding.embedding.weight.val().grad(&grads).is_some();

        tracing::info!(
            "Smoke batch of {}: loss {:.4} (doc {:.4}, word {:.4})",
            self.config.smoke_batch,
            total_loss,
            doc_loss,
            word_loss
        );

        SmokeReport { total_loss, doc_loss, word_loss, embedding_grad, prediction }
    }
}
