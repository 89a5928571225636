// ============================================================
// Layer 5 — Intent/Slot Output Layer
// ============================================================
// Turns decoder scores plus gold labels into losses, and decoder
// scores alone into predictions, for both tasks:
//
//   doc_output  — softmax classification over intents
//   word_output — one of
//                   word_tagging : independent softmax per token
//                   crf          : linear-chain CRF over the sequence
//
// The word-output variant also reports whether its parameters
// sit outside the forward graph (true only for the CRF). The
// assembler reads that capability to set the model's
// `find_unused_parameters` hint.

pub mod classification;
pub mod crf;
pub mod word_tagging;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::error::AssemblyError;
use crate::domain::metadata::FieldMeta;

pub use classification::{ClassificationOutputConfig, ClassificationOutputLayer};
pub use crf::{CrfOutputConfig, CrfOutputLayer};
pub use word_tagging::{WordTaggingOutputConfig, WordTaggingOutputLayer};

/// Which word-level output to build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordOutputConfig {
    WordTagging(WordTaggingOutputConfig),
    Crf(CrfOutputConfig),
}

impl Default for WordOutputConfig {
    fn default() -> Self {
        Self::WordTagging(WordTaggingOutputConfig::new())
    }
}

impl WordOutputConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::WordTagging(_) => "word_tagging",
            Self::Crf(_) => "crf",
        }
    }

    /// True when the variant owns parameters that the model's forward
    /// pass never reads.
    pub fn excluded_from_forward_graph(&self) -> bool {
        matches!(self, Self::Crf(_))
    }
}

#[derive(Config, Debug)]
pub struct IntentSlotOutputConfig {
    #[config(default = "ClassificationOutputConfig::new()")]
    pub doc_output: ClassificationOutputConfig,
    #[config(default = "WordOutputConfig::default()")]
    pub word_output: WordOutputConfig,
}

impl IntentSlotOutputConfig {
    /// Validate both heads against the label vocabularies and the decoder's word width.
    pub fn resolve(
        &self,
        doc_labels:   &FieldMeta,
        word_labels:  &FieldMeta,
        out_dim_word: usize,
    ) -> Result<(), AssemblyError> {
        self.doc_output.validate()?;
        match &self.word_output {
            WordOutputConfig::WordTagging(cfg) => cfg.validate()?,
            WordOutputConfig::Crf(cfg) => cfg.validate()?,
        }
        if doc_labels.vocab_size == 0 {
            return Err(AssemblyError::missing_metadata("doc label vocabulary is empty"));
        }
        if word_labels.vocab_size != out_dim_word {
            return Err(AssemblyError::dimension_mismatch(
                "output_layer",
                format!(
                    "{} expects {} tags, decoder emits {}",
                    self.word_output.name(),
                    word_labels.vocab_size,
                    out_dim_word
                ),
            ));
        }
        Ok(())
    }

    pub fn init<B: Backend>(
        &self,
        doc_labels:  &FieldMeta,
        word_labels: &FieldMeta,
        device:      &B::Device,
    ) -> IntentSlotOutputLayer<B> {
        let word_output = match &self.word_output {
            WordOutputConfig::WordTagging(cfg) => WordOutput::WordTagging(cfg.init(word_labels)),
            WordOutputConfig::Crf(cfg) => WordOutput::Crf(cfg.init(word_labels, device)),
        };
        IntentSlotOutputLayer {
            doc_output: self.doc_output.init(doc_labels),
            word_output,
        }
    }
}

#[derive(Module, Debug)]
pub enum WordOutput<B: Backend> {
    WordTagging(WordTaggingOutputLayer),
    Crf(CrfOutputLayer<B>),
}

impl<B: Backend> WordOutput<B> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::WordTagging(_) => "word_tagging",
            Self::Crf(_) => "crf",
        }
    }

    pub fn excluded_from_forward_graph(&self) -> bool {
        match self {
            Self::WordTagging(_) => false,
            Self::Crf(crf) => crf.excluded_from_forward_graph(),
        }
    }

    pub fn loss(&self, logits: Tensor<B, 3>, labels: Tensor<B, 2, Int>, mask: Tensor<B, 2>) -> Tensor<B, 1> {
        match self {
            Self::WordTagging(layer) => layer.loss(logits, labels, mask),
            Self::Crf(layer) => layer.loss(logits, labels, mask),
        }
    }

    pub fn predict(&self, logits: Tensor<B, 3>, seq_lens: &[usize]) -> Vec<Vec<usize>> {
        match self {
            Self::WordTagging(layer) => layer.predict(logits, seq_lens),
            Self::Crf(layer) => layer.decode(logits, seq_lens),
        }
    }
}

/// Weighted losses of one batch. Every tensor has shape [1].
#[derive(Debug, Clone)]
pub struct JointLoss<B: Backend> {
    pub total: Tensor<B, 1>,
    pub doc:   Tensor<B, 1>,
    pub word:  Tensor<B, 1>,
}

#[derive(Module, Debug)]
pub struct IntentSlotOutputLayer<B: Backend> {
    pub doc_output:  ClassificationOutputLayer,
    pub word_output: WordOutput<B>,
}

impl<B: Backend> IntentSlotOutputLayer<B> {
    /// total = doc_weight * doc_loss + word_weight * word_loss
    #[allow(clippy::too_many_arguments)]
    pub fn loss(
        &self,
        doc_logits:  Tensor<B, 2>,
        word_logits: Tensor<B, 3>,
        doc_labels:  Tensor<B, 1, Int>,
        word_labels: Tensor<B, 2, Int>,
        mask:        Tensor<B, 2>,
        doc_weight:  f64,
        word_weight: f64,
    ) -> JointLoss<B> {
        let doc = self.doc_output.loss(doc_logits, doc_labels);
        let word = self.word_output.loss(word_logits, word_labels, mask);
        let total = doc.clone().mul_scalar(doc_weight) + word.clone().mul_scalar(word_weight);
        JointLoss { total, doc, word }
    }

    pub fn predict(
        &self,
        doc_logits:  Tensor<B, 2>,
        word_logits: Tensor<B, 3>,
        seq_lens:    &[usize],
    ) -> (Vec<usize>, Vec<Vec<usize>>) {
        (
            self.doc_output.predict(doc_logits),
            self.word_output.predict(word_logits, seq_lens),
        )
    }
}

/// Pull a [rows, cols] Int tensor back to the host as nested usize rows.
pub(crate) fn int_rows<B: Backend>(tensor: Tensor<B, 2, Int>) -> Vec<Vec<usize>> {
    let [rows, cols] = tensor.dims();
    let flat = tensor
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .expect("i64 data converts to Vec<i64>");
    if cols == 0 {
        return vec![Vec::new(); rows];
    }
    flat.chunks(cols)
        .map(|row| row.iter().map(|&v| v.max(0) as usize).collect())
        .collect()
}
