// ============================================================
// Layer 2 — InitUseCase
// ============================================================
// Writes a starter set of assembly documents:
//
//   Step 1: Pick the representation and word-output variants
//   Step 2: Describe the input features (optional dense group)
//   Step 3: Describe the vocabularies
//   Step 4: Save all three documents   (Layer 6 - infra)
//
// The documents are plain defaults meant to be edited by hand.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::{
    features::FeatureConfig,
    metadata::{CommonMetadata, FieldMeta},
};
use crate::infra::config_store::{AssemblyDocuments, ConfigStore};
use crate::ml::{
    model::JointModelConfig,
    output::{CrfOutputConfig, IntentSlotOutputConfig, WordOutputConfig},
    representation::{JointCnnConfig, RepresentationConfig},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepresentationKind {
    BiLstm,
    Cnn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordOutputKind {
    WordTagging,
    Crf,
}

// ─── Init Configuration ──────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitConfig {
    pub dir:            String,
    pub representation: RepresentationKind,
    pub word_output:    WordOutputKind,
    pub embed_dim:      usize,
    pub dense_dim:      usize,
    pub vocab_size:     usize,
    pub doc_labels:     usize,
    pub word_labels:    usize,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            dir:            "model".to_string(),
            representation: RepresentationKind::BiLstm,
            word_output:    WordOutputKind::WordTagging,
            embed_dim:      100,
            dense_dim:      0,
            vocab_size:     1000,
            doc_labels:     7,
            word_labels:    12,
        }
    }
}

impl InitConfig {
    /// The three documents this configuration describes.
    pub fn documents(&self) -> AssemblyDocuments {
        let representation = match self.representation {
            RepresentationKind::BiLstm => RepresentationConfig::default(),
            RepresentationKind::Cnn => RepresentationConfig::JointCnn(JointCnnConfig::new()),
        };
        let word_output = match self.word_output {
            WordOutputKind::WordTagging => WordOutputConfig::default(),
            WordOutputKind::Crf => WordOutputConfig::Crf(CrfOutputConfig::new()),
        };

        let mut features = FeatureConfig::default();
        features.word_feat.embed_dim = self.embed_dim;
        if self.dense_dim > 0 {
            features = features.with_dense(self.dense_dim);
        }

        AssemblyDocuments {
            model: JointModelConfig::new()
                .with_representation(representation)
                .with_output_layer(IntentSlotOutputConfig::new().with_word_output(word_output)),
            features,
            metadata: CommonMetadata::new(
                FieldMeta::new(self.vocab_size),
                FieldMeta::new(self.doc_labels),
                FieldMeta::new(self.word_labels),
            ),
        }
    }
}

// ─── InitUseCase ─────────────────────────────────────────────────────────────
pub struct InitUseCase {
    config: InitConfig,
}

impl InitUseCase {
    pub fn new(config: InitConfig) -> Self {
        Self { config }
    }

    /// Write the three documents into `config.dir`, creating it if needed.
    pub fn execute(&self) -> Result<()> {
        tracing::info!(
            "Writing {:?} / {:?} documents to '{}'",
            self.config.representation,
            self.config.word_output,
            self.config.dir
        );
        ConfigStore::new(&self.config.dir).save(&self.config.documents())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_follow_choices() {
        let config = InitConfig {
            representation: RepresentationKind::Cnn,
            word_output: WordOutputKind::Crf,
            dense_dim: 4,
            ..InitConfig::default()
        };
        let docs = config.documents();
        assert_eq!(docs.model.representation.name(), "joint_cnn");
        assert_eq!(docs.model.output_layer.word_output.name(), "crf");
        assert_eq!(docs.features.dense_feat_dim().unwrap(), 4);
        assert_eq!(docs.metadata.targets().unwrap().0.vocab_size, 7);
    }

    #[test]
    fn test_execute_writes_loadable_documents() {
        let dir = tempfile::tempdir().unwrap();
        let config = InitConfig {
            dir: dir.path().join("run").to_string_lossy().into_owned(),
            ..InitConfig::default()
        };
        InitUseCase::new(config.clone()).execute().unwrap();

        let loaded = ConfigStore::new(&config.dir).load().unwrap();
        assert_eq!(loaded.features.dense_feat_dim().unwrap(), 0);
        assert_eq!(loaded.metadata, config.documents().metadata);
    }
}
