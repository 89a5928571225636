// ============================================================
// Layer 5 — Joint Intent-Slot Model
// ============================================================
// Document classification and word tagging on top of one shared
// embedding and one shared representation:
//
//   tokens ─► WordEmbedding ─► Representation ─┬─ doc  ─┐
//                                              └─ word ─┤
//                          dense (optional) ────────────┤
//                                                       ▼
//                                          IntentSlotDecoder
//                                            │            │
//                                       doc_logits   word_logits
//                                            ▼            ▼
//                                       IntentSlotOutputLayer
//                                        (losses / predictions)
//
// `forward` stops at the logits. Losses and predictions go
// through the output layer, so a CRF output's parameters are
// never read by `forward`. `find_unused_parameters` records that
// for any distributed gradient synchroniser driving the model.

use burn::prelude::*;
use serde::Serialize;

use crate::data::batch::{JointBatch, JointInput, JointTargets};
use crate::ml::{
    decoder::{IntentSlotDecoder, IntentSlotDecoderConfig},
    embedding::WordEmbedding,
    output::{IntentSlotOutputConfig, IntentSlotOutputLayer, JointLoss},
    representation::{Representation, RepresentationConfig},
};

/// Declarative recipe for a joint model.
#[derive(Config, Debug)]
pub struct JointModelConfig {
    #[config(default = "RepresentationConfig::default()")]
    pub representation: RepresentationConfig,
    #[config(default = "IntentSlotOutputConfig::new()")]
    pub output_layer: IntentSlotOutputConfig,
    #[config(default = "IntentSlotDecoderConfig::new()")]
    pub decoder: IntentSlotDecoderConfig,
    #[config(default = 0.2)]
    pub default_doc_loss_weight: f64,
    #[config(default = 0.5)]
    pub default_word_loss_weight: f64,
}

#[derive(Module, Debug)]
pub struct JointModel<B: Backend> {
    pub embedding:                WordEmbedding<B>,
    pub representation:           Representation<B>,
    pub decoder:                  IntentSlotDecoder<B>,
    pub output_layer:             IntentSlotOutputLayer<B>,
    /// False when some parameters are never reached by `forward`
    pub find_unused_parameters:   bool,
    pub default_doc_loss_weight:  f64,
    pub default_word_loss_weight: f64,
}

/// Raw scores for both tasks.
#[derive(Debug, Clone)]
pub struct JointOutput<B: Backend> {
    /// [batch, doc_labels]
    pub doc_logits:  Tensor<B, 2>,
    /// [batch, seq, word_labels]
    pub word_logits: Tensor<B, 3>,
}

/// Decoded predictions; slot rows are trimmed to each sequence's length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JointPrediction {
    pub intents: Vec<usize>,
    pub slots:   Vec<Vec<usize>>,
}

/// Wiring report of an assembled model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub representation:         &'static str,
    pub word_output:            &'static str,
    pub embed_dim:              usize,
    pub doc_representation_dim: usize,
    pub word_representation_dim: usize,
    pub in_dim_doc:             usize,
    pub in_dim_word:            usize,
    pub out_dim_doc:            usize,
    pub out_dim_word:           usize,
    pub num_decoder_modules:    usize,
    pub find_unused_parameters: bool,
    pub doc_loss_weight:        f64,
    pub word_loss_weight:       f64,
    pub num_params:             usize,
}

impl<B: Backend> JointModel<B> {
    /// Package the four sub-modules.
    ///
    /// `find_unused_parameters` follows the word-output variant: it is
    /// false exactly when that variant's parameters sit outside `forward`.
    pub fn new(
        embedding:      WordEmbedding<B>,
        representation: Representation<B>,
        decoder:        IntentSlotDecoder<B>,
        output_layer:   IntentSlotOutputLayer<B>,
        loss_weights:   (f64, f64),
    ) -> Self {
        let find_unused_parameters = !output_layer.word_output.excluded_from_forward_graph();
        Self {
            embedding,
            representation,
            decoder,
            output_layer,
            find_unused_parameters,
            default_doc_loss_weight: loss_weights.0,
            default_word_loss_weight: loss_weights.1,
        }
    }

    pub fn forward(&self, input: &JointInput<B>) -> JointOutput<B> {
        let embedded = self.embedding.forward(input.tokens.clone());
        let (doc, word) = self.representation.forward(embedded, input.mask.clone());
        let (doc_logits, word_logits) = self.decoder.forward(doc, word, input.dense.clone());
        JointOutput { doc_logits, word_logits }
    }

    /// Weighted joint loss using the model's default task weights.
    pub fn loss(&self, output: &JointOutput<B>, targets: &JointTargets<B>, mask: &Tensor<B, 2>) -> JointLoss<B> {
        self.output_layer.loss(
            output.doc_logits.clone(),
            output.word_logits.clone(),
            targets.doc_labels.clone(),
            targets.word_labels.clone(),
            mask.clone(),
            self.default_doc_loss_weight,
            self.default_word_loss_weight,
        )
    }

    pub fn predict(&self, output: &JointOutput<B>, seq_lens: &[usize]) -> JointPrediction {
        let (intents, slots) = self.output_layer.predict(
            output.doc_logits.clone(),
            output.word_logits.clone(),
            seq_lens,
        );
        JointPrediction { intents, slots }
    }

    /// Forward pass followed by the joint loss on one batch.
    pub fn forward_loss(&self, batch: &JointBatch<B>) -> (JointLoss<B>, JointOutput<B>) {
        let output = self.forward(&batch.input);
        let loss = self.loss(&output, &batch.targets, &batch.input.mask);
        (loss, output)
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            representation:          self.representation.name(),
            word_output:             self.output_layer.word_output.name(),
            embed_dim:               self.embedding.embedding_dim(),
            doc_representation_dim:  self.representation.doc_representation_dim(),
            word_representation_dim: self.representation.word_representation_dim(),
            in_dim_doc:              self.decoder.in_dim_doc,
            in_dim_word:             self.decoder.in_dim_word,
            out_dim_doc:             self.decoder.out_dim_doc,
            out_dim_word:            self.decoder.out_dim_word,
            num_decoder_modules:     self.decoder.num_decoder_modules,
            find_unused_parameters:  self.find_unused_parameters,
            doc_loss_weight:         self.default_doc_loss_weight,
            word_loss_weight:        self.default_word_loss_weight,
            num_params:              self.num_params(),
        }
    }
}
