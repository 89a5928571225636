// ============================================================
// Layer 3 — Feature Configuration
// ============================================================
// Describes which input features a run feeds the model:
//
//   word_feat  — token ids, always present, embedded by the
//                shared word embedding
//   dense_feat — an optional group of auxiliary floats per
//                example, concatenated into both task inputs
//                right before decoding
//
// Only a single dense group exists. The assembler reads its
// width and nothing else.
//
// Reference: Rust Book §5 (Structs), §6 (Option)

use serde::{Deserialize, Serialize};

use crate::domain::error::AssemblyError;

/// Name under which the word feature's vocabulary appears in metadata.
pub const WORD_FEAT: &str = "word_feat";

/// Name of the dense feature group.
pub const DENSE_FEAT: &str = "dense_feat";

/// Word embedding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordFeatConfig {
    /// Width of each embedded token vector
    pub embed_dim: usize,
}

impl Default for WordFeatConfig {
    fn default() -> Self {
        Self { embed_dim: 100 }
    }
}

/// An auxiliary dense numeric input of fixed width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseFeatConfig {
    pub dim: usize,
}

/// All input features of a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default)]
    pub word_feat: WordFeatConfig,

    #[serde(default)]
    pub dense_feat: Option<DenseFeatConfig>,
}

impl FeatureConfig {
    /// Attach a dense feature group of the given width.
    pub fn with_dense(mut self, dim: usize) -> Self {
        self.dense_feat = Some(DenseFeatConfig { dim });
        self
    }

    /// Width of the dense feature group, 0 when none is declared.
    ///
    /// A declared group of width 0 is rejected rather than
    /// silently treated as absent.
    pub fn dense_feat_dim(&self) -> Result<usize, AssemblyError> {
        match &self.dense_feat {
            None => Ok(0),
            Some(dense) if dense.dim == 0 => Err(AssemblyError::configuration(
                DENSE_FEAT,
                "dense feature group declared with dim = 0",
            )),
            Some(dense) => Ok(dense.dim),
        }
    }

    pub fn validate(&self) -> Result<(), AssemblyError> {
        if self.word_feat.embed_dim == 0 {
            return Err(AssemblyError::configuration(WORD_FEAT, "embed_dim must be > 0"));
        }
        self.dense_feat_dim().map(|_| ())
    }
}
