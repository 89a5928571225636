// ============================================================
// Layer 3 — Dataset Metadata
// ============================================================
// Vocabulary information produced by whatever stage built the
// dataset. The model only reads it:
//
//   features["word_feat"] — token vocabulary (embedding rows)
//   target[0]             — document (intent) labels
//   target[1]             — word (slot) labels
//
// Reference: Rust Book §8 (HashMap)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::AssemblyError;
use crate::domain::features::WORD_FEAT;

/// Vocabulary description of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Number of distinct ids the field can take
    pub vocab_size: usize,

    /// Optional human-readable entries, indexed by id
    #[serde(default)]
    pub vocab: Option<Vec<String>>,

    /// Padding id, if the field reserves one
    #[serde(default)]
    pub pad_token_idx: Option<usize>,
}

impl FieldMeta {
    pub fn new(vocab_size: usize) -> Self {
        Self { vocab_size, vocab: None, pad_token_idx: None }
    }

    /// Build from a list of labels; the size follows the list.
    pub fn from_labels<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        let vocab: Vec<String> = labels.into_iter().map(Into::into).collect();
        Self { vocab_size: vocab.len(), vocab: Some(vocab), pad_token_idx: None }
    }

    /// Reject an empty vocabulary or a padding id outside it.
    fn check(&self, path: &str) -> Result<(), AssemblyError> {
        if self.vocab_size == 0 {
            return Err(AssemblyError::missing_metadata(format!("{path}.vocab_size is 0")));
        }
        match self.pad_token_idx {
            Some(pad) if pad >= self.vocab_size => Err(AssemblyError::missing_metadata(format!(
                "{path}.pad_token_idx {pad} is outside a vocabulary of {}",
                self.vocab_size
            ))),
            _ => Ok(()),
        }
    }

    /// Label string for an id, when the vocabulary is known.
    pub fn label(&self, id: usize) -> Option<&str> {
        self.vocab.as_ref()?.get(id).map(String::as_str)
    }
}

/// Metadata shared by every model in a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommonMetadata {
    #[serde(default)]
    pub features: HashMap<String, FieldMeta>,

    #[serde(default)]
    pub target: Vec<FieldMeta>,
}

impl CommonMetadata {
    /// Metadata for a word vocabulary plus the (doc, word) label pair.
    pub fn new(word_vocab: FieldMeta, doc_labels: FieldMeta, word_labels: FieldMeta) -> Self {
        let mut features = HashMap::new();
        features.insert(WORD_FEAT.to_string(), word_vocab);
        Self { features, target: vec![doc_labels, word_labels] }
    }

    /// Look up a feature vocabulary that must be present and non-empty.
    /// A declared padding id must fall inside the vocabulary.
    pub fn feature(&self, name: &str) -> Result<&FieldMeta, AssemblyError> {
        let meta = self
            .features
            .get(name)
            .ok_or_else(|| AssemblyError::missing_metadata(format!("features.{name}")))?;
        meta.check(&format!("features.{name}"))?;
        Ok(meta)
    }

    /// The (document label, word label) pair.
    pub fn targets(&self) -> Result<(&FieldMeta, &FieldMeta), AssemblyError> {
        let [doc, word] = self.target.as_slice() else {
            return Err(AssemblyError::missing_metadata(format!(
                "target must hold (doc_label, word_label), found {} entries",
                self.target.len()
            )));
        };
        for (i, meta) in [doc, word].into_iter().enumerate() {
            meta.check(&format!("target[{i}]"))?;
        }
        Ok((doc, word))
    }
}
