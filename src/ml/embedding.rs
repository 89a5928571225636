// ============================================================
// Layer 5 — Word Embedding
// ============================================================
// Shared token embedding feeding both tasks.
//
//   tokens [batch, seq] → embedded [batch, seq, embed_dim]
//
// The row count comes from metadata.features["word_feat"],
// the width from the feature config. When the vocabulary
// declares a padding id, that row starts at zero.

use burn::{
    module::Param,
    nn::{Embedding, EmbeddingConfig},
    prelude::*,
};

use crate::domain::{
    error::AssemblyError,
    features::{FeatureConfig, WORD_FEAT},
    metadata::CommonMetadata,
};

#[derive(Config, Debug)]
pub struct WordEmbeddingConfig {
    pub vocab_size:    usize,
    pub embed_dim:     usize,
    /// Row zeroed at init
    pub pad_token_idx: Option<usize>,
}

impl WordEmbeddingConfig {
    /// Resolve the embedding shape from the run's features and metadata.
    pub fn from_features(
        features: &FeatureConfig,
        metadata: &CommonMetadata,
    ) -> Result<Self, AssemblyError> {
        let vocab = metadata.feature(WORD_FEAT)?;
        if features.word_feat.embed_dim == 0 {
            return Err(AssemblyError::configuration(WORD_FEAT, "embed_dim must be > 0"));
        }
        Ok(Self::new(vocab.vocab_size, features.word_feat.embed_dim).with_pad_token_idx(vocab.pad_token_idx))
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> WordEmbedding<B> {
        let mut embedding = EmbeddingConfig::new(self.vocab_size, self.embed_dim).init(device);
        if let Some(pad) = self.pad_token_idx {
            let weight = embedding.weight.val().slice_assign(
                [pad..pad + 1, 0..self.embed_dim],
                Tensor::zeros([1, self.embed_dim], device),
            );
            embedding.weight = Param::from_tensor(weight);
        }
        WordEmbedding { embedding, embed_dim: self.embed_dim }
    }
}

#[derive(Module, Debug)]
pub struct WordEmbedding<B: Backend> {
    pub embedding: Embedding<B>,
    pub embed_dim: usize,
}

impl<B: Backend> WordEmbedding<B> {
    /// Output width seen by the representation layer.
    pub fn embedding_dim(&self) -> usize {
        self.embed_dim
    }

    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        self.embedding.forward(tokens)
    }
}
