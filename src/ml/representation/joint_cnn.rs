// ============================================================
// Layer 5 — Joint CNN Representation
// ============================================================
// One 1-D convolution per kernel size over the embedded tokens.
// Each convolution keeps the sequence length (pad k/2, then
// truncate back to seq), so every word keeps its own feature
// column:
//
//   embedded [batch, seq, embed]  → zero padding, swap
//                                 →        [batch, embed, seq]
//   conv_k   → relu               →        [batch, kernel_num, seq]
//   cat over kernels              →        [batch, kernel_num * K, seq]
//   swap back                     → word   [batch, seq, kernel_num * K]
//   masked max over seq           → doc    [batch, kernel_num * K]
//
// Reference: Kim (2014) Convolutional Neural Networks for
//            Sentence Classification

use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        Dropout, DropoutConfig, PaddingConfig1d,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::domain::error::AssemblyError;
use crate::ml::ops::masked_max_pool;

const COMPONENT: &str = "representation";

#[derive(Config, Debug)]
pub struct JointCnnConfig {
    #[config(default = 100)]
    pub kernel_num: usize,
    #[config(default = "vec![3, 4]")]
    pub kernel_sizes: Vec<usize>,
    #[config(default = 0.4)]
    pub dropout: f64,
}

impl JointCnnConfig {
    pub fn validate(&self) -> Result<(), AssemblyError> {
        if self.kernel_num == 0 {
            return Err(AssemblyError::configuration(COMPONENT, "kernel_num must be > 0"));
        }
        if self.kernel_sizes.is_empty() {
            return Err(AssemblyError::configuration(COMPONENT, "kernel_sizes is empty"));
        }
        if self.kernel_sizes.contains(&0) {
            return Err(AssemblyError::configuration(COMPONENT, "kernel sizes must be > 0"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(AssemblyError::configuration(
                COMPONENT,
                format!("dropout must be in [0, 1), got {}", self.dropout),
            ));
        }
        Ok(())
    }

    fn output_dim(&self) -> usize {
        self.kernel_num * self.kernel_sizes.len()
    }

    pub fn doc_representation_dim(&self) -> usize {
        self.output_dim()
    }

    pub fn word_representation_dim(&self) -> usize {
        self.output_dim()
    }

    pub fn init<B: Backend>(&self, embed_dim: usize, device: &B::Device) -> JointCnnRepresentation<B> {
        let convs = self
            .kernel_sizes
            .iter()
            .map(|&k| {
                Conv1dConfig::new(embed_dim, self.kernel_num, k)
                    .with_padding(PaddingConfig1d::Explicit(k / 2))
                    .init(device)
            })
            .collect();

        JointCnnRepresentation {
            convs,
            dropout: DropoutConfig::new(self.dropout).init(),
            output_dim: self.output_dim(),
        }
    }
}

#[derive(Module, Debug)]
pub struct JointCnnRepresentation<B: Backend> {
    pub convs:      Vec<Conv1d<B>>,
    pub dropout:    Dropout,
    pub output_dim: usize,
}

impl<B: Backend> JointCnnRepresentation<B> {
    pub fn forward(&self, embedded: Tensor<B, 3>, mask: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 3>) {
        let [batch, seq, _] = embedded.dims();
        // Padded positions read as zeros, like the conv's own edge padding
        let x = (self.dropout.forward(embedded) * mask.clone().unsqueeze_dim::<3>(2)).swap_dims(1, 2);

        let features: Vec<Tensor<B, 3>> = self
            .convs
            .iter()
            .map(|conv| {
                let out = conv.forward(x.clone());
                let [_, channels, _] = out.dims();
                // Even kernels produce seq + 1 positions; keep the first seq
                relu(out.slice([0..batch, 0..channels, 0..seq]))
            })
            .collect();

        let word = Tensor::cat(features, 1).swap_dims(1, 2);
        let doc = masked_max_pool(word.clone(), mask);

        (self.dropout.forward(doc), self.dropout.forward(word))
    }
}
