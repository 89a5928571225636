// ============================================================
// Layer 6 — Config Store
// ============================================================
// Reads and writes the three documents a model is assembled from.
//
// Directory layout:
//   <dir>/
//     model_config.json    ← JointModelConfig
//     feature_config.json  ← FeatureConfig
//     metadata.json        ← CommonMetadata
//
// Parsing is split from file access. The `parse_*` functions turn
// JSON text into records and report failures as AssemblyError, so
// an unknown variant tag reads as a Configuration error. The store
// adds the file path on top with anyhow context.
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::{error::AssemblyError, features::FeatureConfig, metadata::CommonMetadata};
use crate::ml::model::JointModelConfig;

pub const MODEL_CONFIG_FILE: &str = "model_config.json";
pub const FEATURE_CONFIG_FILE: &str = "feature_config.json";
pub const METADATA_FILE: &str = "metadata.json";

pub fn parse_model_config(json: &str) -> Result<JointModelConfig, AssemblyError> {
    serde_json::from_str(json).map_err(|e| AssemblyError::configuration("model_config", e.to_string()))
}

pub fn parse_features(json: &str) -> Result<FeatureConfig, AssemblyError> {
    serde_json::from_str(json).map_err(|e| AssemblyError::configuration("feature_config", e.to_string()))
}

pub fn parse_metadata(json: &str) -> Result<CommonMetadata, AssemblyError> {
    serde_json::from_str(json).map_err(|e| AssemblyError::missing_metadata(format!("unreadable metadata: {e}")))
}

/// The three documents of one assembly run.
#[derive(Debug, Clone)]
pub struct AssemblyDocuments {
    pub model:    JointModelConfig,
    pub features: FeatureConfig,
    pub metadata: CommonMetadata,
}

/// Reads and writes assembly documents in one directory.
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Open a store rooted at `dir`; nothing touches the disk yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, docs: &AssemblyDocuments) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create config directory '{}'", self.dir.display()))?;
        self.write_json(MODEL_CONFIG_FILE, &docs.model)?;
        self.write_json(FEATURE_CONFIG_FILE, &docs.features)?;
        self.write_json(METADATA_FILE, &docs.metadata)?;
        tracing::info!("Wrote assembly documents to '{}'", self.dir.display());
        Ok(())
    }

    pub fn load(&self) -> Result<AssemblyDocuments> {
        Ok(AssemblyDocuments {
            model:    self.load_model_config()?,
            features: self.load_features()?,
            metadata: self.load_metadata()?,
        })
    }

    pub fn load_model_config(&self) -> Result<JointModelConfig> {
        let json = self.read(MODEL_CONFIG_FILE)?;
        parse_model_config(&json).with_context(|| self.context(MODEL_CONFIG_FILE))
    }

    pub fn load_features(&self) -> Result<FeatureConfig> {
        let json = self.read(FEATURE_CONFIG_FILE)?;
        parse_features(&json).with_context(|| self.context(FEATURE_CONFIG_FILE))
    }

    pub fn load_metadata(&self) -> Result<CommonMetadata> {
        let json = self.read(METADATA_FILE)?;
        parse_metadata(&json).with_context(|| self.context(METADATA_FILE))
    }

    fn read(&self, name: &str) -> Result<String> {
        let path = self.dir.join(name);
        fs::read_to_string(&path).with_context(|| {
            format!("Cannot read '{}'. Run 'init' to write default documents.", path.display())
        })
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn context(&self, name: &str) -> String {
        format!("Invalid document '{}'", self.dir.join(name).display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metadata::FieldMeta;
    use crate::ml::output::{CrfOutputConfig, IntentSlotOutputConfig, WordOutputConfig};

    fn documents() -> AssemblyDocuments {
        AssemblyDocuments {
            model: JointModelConfig::new().with_output_layer(
                IntentSlotOutputConfig::new().with_word_output(WordOutputConfig::Crf(CrfOutputConfig::new())),
            ),
            features: FeatureConfig::default().with_dense(3),
            metadata: CommonMetadata::new(
                FieldMeta::new(40),
                FieldMeta::from_labels(["play_music", "get_weather"]),
                FieldMeta::new(5),
            ),
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("run"));
        store.save(&documents()).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.model.output_layer.word_output.name(), "crf");
        assert_eq!(loaded.features, documents().features);
        assert_eq!(loaded.metadata, documents().metadata);
        assert_eq!(loaded.metadata.target[0].label(1), Some("get_weather"));
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigStore::new(dir.path()).load_features().unwrap_err();
        assert!(err.to_string().contains(FEATURE_CONFIG_FILE));
    }

    #[test]
    fn test_unknown_word_output_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        store.save(&documents()).unwrap();

        let json = fs::read_to_string(dir.path().join(MODEL_CONFIG_FILE)).unwrap();
        fs::write(dir.path().join(MODEL_CONFIG_FILE), json.replace("\"crf\"", "\"semi_markov\"")).unwrap();

        let err = store.load_model_config().unwrap_err();
        let cause = err.downcast_ref::<AssemblyError>().unwrap();
        assert!(matches!(cause, AssemblyError::Configuration { component: "model_config", .. }));
    }

    #[test]
    fn test_malformed_metadata_is_missing_metadata() {
        let err = parse_metadata(r#"{ "target": 3 }"#).unwrap_err();
        assert!(matches!(err, AssemblyError::MissingMetadata(_)));
    }

    #[test]
    fn test_feature_defaults_fill_in() {
        let features = parse_features("{}").unwrap();
        assert_eq!(features, FeatureConfig::default());
    }
}
