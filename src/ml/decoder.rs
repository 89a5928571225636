// ============================================================
// Layer 5 — Intent/Slot Decoder
// ============================================================
// Two MLP heads over the shared representation:
//
//   doc  [batch, in_dim_doc]        → doc_logits  [batch, out_dim_doc]
//   word [batch, seq, in_dim_word]  → word_logits [batch, seq, out_dim_word]
//
// Dense features: when `num_decoder_modules` is non-zero the
// dense vector is appended to the doc input and, repeated over
// the sequence, to every word input. The assembler sets the
// hint to 1 exactly when the run declares a dense group, and
// folds the dense width into both in_dim values.
//
// With `use_doc_probs_in_word`, the softmaxed intent scores are
// appended to every word input as well.

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::{relu, softmax},
};

use crate::domain::error::AssemblyError;

const MODULE: &str = "decoder";

/// Widths the assembler derives for the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderDims {
    pub in_dim_doc:   usize,
    pub in_dim_word:  usize,
    pub out_dim_doc:  usize,
    pub out_dim_word: usize,
}

#[derive(Config, Debug)]
pub struct IntentSlotDecoderConfig {
    #[config(default = false)]
    pub use_doc_probs_in_word: bool,
    #[config(default = "Vec::new()")]
    pub hidden_dims: Vec<usize>,
}

impl IntentSlotDecoderConfig {
    /// Reject widths no linear layer can be built from.
    pub fn resolve(&self, dims: &DecoderDims) -> Result<(), AssemblyError> {
        let named = [
            ("in_dim_doc", dims.in_dim_doc),
            ("in_dim_word", dims.in_dim_word),
            ("out_dim_doc", dims.out_dim_doc),
            ("out_dim_word", dims.out_dim_word),
        ];
        if let Some((name, _)) = named.iter().find(|(_, width)| *width == 0) {
            return Err(AssemblyError::dimension_mismatch(MODULE, format!("{name} = 0")));
        }
        if self.hidden_dims.contains(&0) {
            return Err(AssemblyError::configuration(MODULE, "hidden_dims must all be > 0"));
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, dims: DecoderDims, device: &B::Device) -> IntentSlotDecoder<B> {
        let word_in = if self.use_doc_probs_in_word {
            dims.in_dim_word + dims.out_dim_doc
        } else {
            dims.in_dim_word
        };

        IntentSlotDecoder {
            doc_mlp: self.mlp(dims.in_dim_doc, dims.out_dim_doc, device),
            word_mlp: self.mlp(word_in, dims.out_dim_word, device),
            use_doc_probs_in_word: self.use_doc_probs_in_word,
            num_decoder_modules: 0,
            dense_dim: 0,
            in_dim_doc: dims.in_dim_doc,
            in_dim_word: dims.in_dim_word,
            out_dim_doc: dims.out_dim_doc,
            out_dim_word: dims.out_dim_word,
        }
    }

    fn mlp<B: Backend>(&self, input: usize, output: usize, device: &B::Device) -> Vec<Linear<B>> {
        let mut widths = Vec::with_capacity(self.hidden_dims.len() + 2);
        widths.push(input);
        widths.extend_from_slice(&self.hidden_dims);
        widths.push(output);
        widths
            .windows(2)
            .map(|pair| LinearConfig::new(pair[0], pair[1]).init(device))
            .collect()
    }
}

#[derive(Module, Debug)]
pub struct IntentSlotDecoder<B: Backend> {
    pub doc_mlp:               Vec<Linear<B>>,
    pub word_mlp:              Vec<Linear<B>>,
    pub use_doc_probs_in_word: bool,
    /// Number of auxiliary input groups folded into the task inputs
    pub num_decoder_modules:   usize,
    pub dense_dim:             usize,
    pub in_dim_doc:            usize,
    pub in_dim_word:           usize,
    pub out_dim_doc:           usize,
    pub out_dim_word:          usize,
}

fn run_mlp<B: Backend, const D: usize>(layers: &[Linear<B>], mut x: Tensor<B, D>) -> Tensor<B, D> {
    let last = layers.len().saturating_sub(1);
    for (i, layer) in layers.iter().enumerate() {
        x = layer.forward(x);
        if i < last {
            x = relu(x);
        }
    }
    x
}

impl<B: Backend> IntentSlotDecoder<B> {
    /// Fold one dense group of `dense_dim` floats into both inputs.
    ///
    /// `in_dim_doc` / `in_dim_word` must already include `dense_dim`.
    pub fn with_dense_group(mut self, dense_dim: usize) -> Self {
        self.num_decoder_modules = 1;
        self.dense_dim = dense_dim;
        self
    }

    pub fn forward(
        &self,
        doc:   Tensor<B, 2>,
        word:  Tensor<B, 3>,
        dense: Option<Tensor<B, 2>>,
    ) -> (Tensor<B, 2>, Tensor<B, 3>) {
        let [batch, seq, _] = word.dims();

        let (doc, word) = if self.num_decoder_modules > 0 {
            // Rows without dense features read as zeros
            let dense = dense
                .unwrap_or_else(|| Tensor::zeros([batch, self.dense_dim], &doc.device()));
            let per_word = dense.clone().unsqueeze_dim::<3>(1).repeat_dim(1, seq);
            (Tensor::cat(vec![doc, dense], 1), Tensor::cat(vec![word, per_word], 2))
        } else {
            (doc, word)
        };

        let doc_logits = run_mlp(&self.doc_mlp, doc);

        let word = if self.use_doc_probs_in_word {
            let probs = softmax(doc_logits.clone(), 1)
                .unsqueeze_dim::<3>(1)
                .repeat_dim(1, seq);
            Tensor::cat(vec![word, probs], 2)
        } else {
            word
        };
        let word_logits = run_mlp(&self.word_mlp, word);

        (doc_logits, word_logits)
    }
}
