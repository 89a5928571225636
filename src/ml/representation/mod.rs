// ============================================================
// Layer 5 — Shared Representation
// ============================================================
// The representation maps embedded tokens to one vector per
// document and one vector per word. Two variants exist:
//
//   bi_lstm_doc_slot_attention — stacked BiLSTM, attention
//                                pooling, optional slot attention
//   joint_cnn                  — parallel 1-D convolutions
//
// The config is a closed enum, so selecting a variant is an
// exhaustive match. An unknown tag in a config document fails
// during deserialization and never reaches this code.

pub mod bilstm_doc_slot_attention;
pub mod joint_cnn;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::error::AssemblyError;

pub use bilstm_doc_slot_attention::{
    BiLstmDocSlotAttention, BiLstmDocSlotAttentionConfig, PoolingConfig, SlotAttentionType,
};
pub use joint_cnn::{JointCnnConfig, JointCnnRepresentation};

/// Which representation to build, with its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepresentationConfig {
    BiLstmDocSlotAttention(BiLstmDocSlotAttentionConfig),
    JointCnn(JointCnnConfig),
}

impl Default for RepresentationConfig {
    fn default() -> Self {
        Self::BiLstmDocSlotAttention(BiLstmDocSlotAttentionConfig::new())
    }
}

/// Output widths of a representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepresentationDims {
    pub doc:  usize,
    pub word: usize,
}

impl RepresentationConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BiLstmDocSlotAttention(_) => "bi_lstm_doc_slot_attention",
            Self::JointCnn(_) => "joint_cnn",
        }
    }

    /// Validate against the embedding width and report the output widths.
    pub fn resolve(&self, embed_dim: usize) -> Result<RepresentationDims, AssemblyError> {
        if embed_dim == 0 {
            return Err(AssemblyError::dimension_mismatch(
                "representation",
                "embed_dim = 0",
            ));
        }
        match self {
            Self::BiLstmDocSlotAttention(cfg) => {
                cfg.validate()?;
                Ok(RepresentationDims {
                    doc:  cfg.doc_representation_dim(),
                    word: cfg.word_representation_dim(),
                })
            }
            Self::JointCnn(cfg) => {
                cfg.validate()?;
                Ok(RepresentationDims {
                    doc:  cfg.doc_representation_dim(),
                    word: cfg.word_representation_dim(),
                })
            }
        }
    }

    pub fn init<B: Backend>(&self, embed_dim: usize, device: &B::Device) -> Representation<B> {
        match self {
            Self::BiLstmDocSlotAttention(cfg) => {
                Representation::BiLstmDocSlotAttention(cfg.init(embed_dim, device))
            }
            Self::JointCnn(cfg) => Representation::JointCnn(cfg.init(embed_dim, device)),
        }
    }
}

#[derive(Module, Debug)]
pub enum Representation<B: Backend> {
    BiLstmDocSlotAttention(BiLstmDocSlotAttention<B>),
    JointCnn(JointCnnRepresentation<B>),
}

impl<B: Backend> Representation<B> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BiLstmDocSlotAttention(_) => "bi_lstm_doc_slot_attention",
            Self::JointCnn(_) => "joint_cnn",
        }
    }

    pub fn doc_representation_dim(&self) -> usize {
        match self {
            Self::BiLstmDocSlotAttention(rep) => rep.doc_dim,
            Self::JointCnn(rep) => rep.output_dim,
        }
    }

    pub fn word_representation_dim(&self) -> usize {
        match self {
            Self::BiLstmDocSlotAttention(rep) => rep.word_dim,
            Self::JointCnn(rep) => rep.output_dim,
        }
    }

    /// embedded: [batch, seq, embed] → (doc [batch, doc_dim], word [batch, seq, word_dim])
    pub fn forward(&self, embedded: Tensor<B, 3>, mask: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 3>) {
        match self {
            Self::BiLstmDocSlotAttention(rep) => rep.forward(embedded, mask),
            Self::JointCnn(rep) => rep.forward(embedded, mask),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_resolved_widths_match_built_module() {
        let device = Default::default();
        let configs = [
            RepresentationConfig::default(),
            RepresentationConfig::JointCnn(JointCnnConfig::new().with_kernel_num(5)),
        ];
        for cfg in configs {
            let dims = cfg.resolve(10).unwrap();
            let rep: Representation<TestBackend> = cfg.init(10, &device);
            assert_eq!(rep.doc_representation_dim(), dims.doc);
            assert_eq!(rep.word_representation_dim(), dims.word);
        }
    }

    #[test]
    fn test_zero_embedding_width_is_rejected() {
        let err = RepresentationConfig::default().resolve(0).unwrap_err();
        assert!(matches!(err, AssemblyError::DimensionMismatch { module: "representation", .. }));
    }

    #[test]
    fn test_unknown_variant_tag_fails_to_parse() {
        let json = r#"{ "transformer": { "layers": 2 } }"#;
        let err = serde_json::from_str::<RepresentationConfig>(json).unwrap_err();
        assert!(err.to_string().contains("unknown variant"));
    }
}
