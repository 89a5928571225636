// ============================================================
// Layer 5 — Model Assembler
// ============================================================
// Builds a JointModel from three documents:
//
//   JointModelConfig  — which representation / output variants
//   FeatureConfig     — embedding width, optional dense group
//   CommonMetadata    — vocabulary sizes of the input and both targets
//
// Two phases:
//
//   plan  — validate everything and resolve every width. Pure,
//           allocates no tensors, and is the only place an
//           AssemblyError can come from.
//   init  — allocate the Burn modules from a valid plan.
//
// Width wiring:
//
//   in_dim_doc   = representation doc width  + dense_feat_dim
//   in_dim_word  = representation word width + dense_feat_dim
//   out_dim_doc  = |doc labels|
//   out_dim_word = |word labels|

use burn::prelude::*;

use crate::domain::{
    error::AssemblyError,
    features::FeatureConfig,
    metadata::{CommonMetadata, FieldMeta},
};
use crate::ml::{
    decoder::DecoderDims,
    embedding::WordEmbeddingConfig,
    model::{JointModel, JointModelConfig},
    representation::RepresentationDims,
};

/// Everything `init` needs, already validated.
#[derive(Debug, Clone)]
pub struct AssemblyPlan {
    pub config:                 JointModelConfig,
    pub embedding:              WordEmbeddingConfig,
    pub representation_dims:    RepresentationDims,
    pub dense_feat_dim:         usize,
    pub decoder_dims:           DecoderDims,
    pub num_decoder_modules:    usize,
    pub doc_labels:             FieldMeta,
    pub word_labels:            FieldMeta,
    pub find_unused_parameters: bool,
}

impl JointModelConfig {
    /// Validate the configuration against features and metadata.
    pub fn plan(
        &self,
        features: &FeatureConfig,
        metadata: &CommonMetadata,
    ) -> Result<AssemblyPlan, AssemblyError> {
        features.validate()?;

        // ── Embedding ──
        let embedding = WordEmbeddingConfig::from_features(features, metadata)?;

        // ── Representation ──
        let representation_dims = self.representation.resolve(embedding.embed_dim)?;

        // ── Decoder ──
        let dense_feat_dim = features.dense_feat_dim()?;
        let (doc_labels, word_labels) = metadata.targets()?;
        let decoder_dims = DecoderDims {
            in_dim_doc:   representation_dims.doc + dense_feat_dim,
            in_dim_word:  representation_dims.word + dense_feat_dim,
            out_dim_doc:  doc_labels.vocab_size,
            out_dim_word: word_labels.vocab_size,
        };
        self.decoder.resolve(&decoder_dims)?;
        let num_decoder_modules = usize::from(dense_feat_dim > 0);

        // ── Output layer ──
        self.output_layer
            .resolve(doc_labels, word_labels, decoder_dims.out_dim_word)?;

        for (name, weight) in [
            ("default_doc_loss_weight", self.default_doc_loss_weight),
            ("default_word_loss_weight", self.default_word_loss_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AssemblyError::configuration(
                    "model",
                    format!("{name} must be a finite value >= 0, got {weight}"),
                ));
            }
        }

        let plan = AssemblyPlan {
            config: self.clone(),
            embedding,
            representation_dims,
            dense_feat_dim,
            decoder_dims,
            num_decoder_modules,
            doc_labels: doc_labels.clone(),
            word_labels: word_labels.clone(),
            find_unused_parameters: !self.output_layer.word_output.excluded_from_forward_graph(),
        };

        tracing::info!(
            "Planned {} + {}: decoder ({}, {}, {}, {}), dense={}, find_unused_parameters={}",
            self.representation.name(),
            self.output_layer.word_output.name(),
            decoder_dims.in_dim_doc,
            decoder_dims.in_dim_word,
            decoder_dims.out_dim_doc,
            decoder_dims.out_dim_word,
            dense_feat_dim,
            plan.find_unused_parameters,
        );
        Ok(plan)
    }

    /// Plan, then allocate on `device`.
    pub fn assemble<B: Backend>(
        &self,
        features: &FeatureConfig,
        metadata: &CommonMetadata,
        device:   &B::Device,
    ) -> Result<JointModel<B>, AssemblyError> {
        Ok(self.plan(features, metadata)?.init(device))
    }
}

impl AssemblyPlan {
    pub fn init<B: Backend>(&self, device: &B::Device) -> JointModel<B> {
        let embedding = self.embedding.init(device);
        tracing::debug!(
            "embedding: vocab={} dim={}",
            self.embedding.vocab_size,
            self.embedding.embed_dim
        );

        let representation = self.config.representation.init(self.embedding.embed_dim, device);
        tracing::debug!(
            "representation {}: doc={} word={}",
            representation.name(),
            self.representation_dims.doc,
            self.representation_dims.word
        );

        let mut decoder = self.config.decoder.init(self.decoder_dims, device);
        if self.num_decoder_modules > 0 {
            decoder = decoder.with_dense_group(self.dense_feat_dim);
        }
        tracing::debug!("decoder: {:?}, hint={}", self.decoder_dims, decoder.num_decoder_modules);

        let output_layer = self
            .config
            .output_layer
            .init(&self.doc_labels, &self.word_labels, device);
        tracing::debug!("output layer: word_output={}", output_layer.word_output.name());

        JointModel::new(
            embedding,
            representation,
            decoder,
            output_layer,
            (self.config.default_doc_loss_weight, self.config.default_word_loss_weight),
        )
    }
}

/// Free-function form of `JointModelConfig::assemble`.
pub fn assemble<B: Backend>(
    config:   &JointModelConfig,
    features: &FeatureConfig,
    metadata: &CommonMetadata,
    device:   &B::Device,
) -> Result<JointModel<B>, AssemblyError> {
    config.assemble(features, metadata, device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::data::batch::{JointInput, JointTargets};
    use crate::ml::{
        output::{CrfOutputConfig, IntentSlotOutputConfig, WordOutputConfig},
        representation::{
            BiLstmDocSlotAttentionConfig, JointCnnConfig, RepresentationConfig, SlotAttentionType,
        },
    };

    type TestBackend = NdArray;

    fn metadata(vocab: usize, doc: usize, word: usize) -> CommonMetadata {
        CommonMetadata::new(FieldMeta::new(vocab), FieldMeta::new(doc), FieldMeta::new(word))
    }

    fn small_bilstm() -> RepresentationConfig {
        RepresentationConfig::BiLstmDocSlotAttention(BiLstmDocSlotAttentionConfig::new().with_lstm_dim(4))
    }

    fn crf_output() -> IntentSlotOutputConfig {
        IntentSlotOutputConfig::new().with_word_output(WordOutputConfig::Crf(CrfOutputConfig::new()))
    }

    #[test]
    fn test_reference_widths_without_dense() {
        // BiLSTM with 128 units per direction: 256 wide for doc and word
        let cfg = JointModelConfig::new().with_representation(RepresentationConfig::BiLstmDocSlotAttention(
            BiLstmDocSlotAttentionConfig::new().with_lstm_dim(128),
        ));
        let plan = cfg.plan(&FeatureConfig::default(), &metadata(30, 7, 12)).unwrap();

        assert_eq!(
            plan.decoder_dims,
            DecoderDims { in_dim_doc: 256, in_dim_word: 256, out_dim_doc: 7, out_dim_word: 12 }
        );
        assert_eq!(plan.dense_feat_dim, 0);
        assert_eq!(plan.num_decoder_modules, 0);
        assert!(plan.find_unused_parameters);
    }

    #[test]
    fn test_dense_width_is_added_to_both_inputs() {
        let cfg = JointModelConfig::new().with_representation(small_bilstm());
        let features = FeatureConfig::default().with_dense(5);
        let plan = cfg.plan(&features, &metadata(30, 3, 4)).unwrap();

        assert_eq!(plan.dense_feat_dim, 5);
        assert_eq!(plan.decoder_dims.in_dim_doc, plan.representation_dims.doc + 5);
        assert_eq!(plan.decoder_dims.in_dim_word, plan.representation_dims.word + 5);
        assert_eq!(plan.num_decoder_modules, 1);

        let model: JointModel<TestBackend> = plan.init(&Default::default());
        assert_eq!(model.decoder.num_decoder_modules, 1);
        assert_eq!(model.decoder.dense_dim, 5);
    }

    #[test]
    fn test_output_widths_follow_label_vocabularies() {
        let cfg = JointModelConfig::new().with_representation(RepresentationConfig::JointCnn(
            JointCnnConfig::new().with_kernel_num(6),
        ));
        let model: JointModel<TestBackend> = cfg
            .assemble(&FeatureConfig::default(), &metadata(20, 9, 11), &Default::default())
            .unwrap();
        let summary = model.summary();
        assert_eq!(summary.out_dim_doc, 9);
        assert_eq!(summary.out_dim_word, 11);
        assert_eq!(summary.in_dim_doc, 12);
        assert_eq!(summary.representation, "joint_cnn");
    }

    #[test]
    fn test_crf_clears_find_unused_parameters() {
        let device = Default::default();
        let meta = metadata(20, 3, 4);

        let tagging: JointModel<TestBackend> = JointModelConfig::new()
            .with_representation(small_bilstm())
            .assemble(&FeatureConfig::default(), &meta, &device)
            .unwrap();
        assert!(tagging.find_unused_parameters);

        let crf: JointModel<TestBackend> = JointModelConfig::new()
            .with_representation(small_bilstm())
            .with_output_layer(crf_output())
            .assemble(&FeatureConfig::default(), &meta, &device)
            .unwrap();
        assert!(!crf.find_unused_parameters);
        assert_eq!(crf.summary().word_output, "crf");
    }

    #[test]
    fn test_unknown_variant_in_document_is_configuration_error() {
        let json = r#"{
            "representation": { "transformer": { "layers": 2 } },
            "output_layer": { "doc_output": { "label_smoothing": 0.0 }, "word_output": { "word_tagging": { "label_smoothing": 0.0 } } },
            "decoder": { "use_doc_probs_in_word": false, "hidden_dims": [] },
            "default_doc_loss_weight": 0.2,
            "default_word_loss_weight": 0.5
        }"#;
        let err = crate::infra::config_store::parse_model_config(json).unwrap_err();
        assert!(matches!(err, AssemblyError::Configuration { .. }));
    }

    #[test]
    fn test_missing_metadata_is_reported_before_allocation() {
        let mut meta = metadata(20, 3, 4);
        meta.target.pop();
        let err = JointModelConfig::new()
            .assemble::<TestBackend>(&FeatureConfig::default(), &meta, &Default::default())
            .unwrap_err();
        assert!(matches!(err, AssemblyError::MissingMetadata(_)));

        let mut meta = metadata(20, 3, 4);
        meta.features.clear();
        let err = JointModelConfig::new().plan(&FeatureConfig::default(), &meta).unwrap_err();
        assert!(matches!(err, AssemblyError::MissingMetadata(_)));
    }

    #[test]
    fn test_invalid_sub_configs_are_rejected() {
        let meta = metadata(20, 3, 4);

        let zero_dense = FeatureConfig::default().with_dense(0);
        let err = JointModelConfig::new().plan(&zero_dense, &meta).unwrap_err();
        assert!(matches!(err, AssemblyError::Configuration { .. }));

        let err = JointModelConfig::new()
            .with_default_word_loss_weight(-1.0)
            .plan(&FeatureConfig::default(), &meta)
            .unwrap_err();
        assert!(matches!(err, AssemblyError::Configuration { component: "model", .. }));

        let empty_kernels = RepresentationConfig::JointCnn(JointCnnConfig::new().with_kernel_sizes(vec![]));
        let err = JointModelConfig::new()
            .with_representation(empty_kernels)
            .plan(&FeatureConfig::default(), &meta)
            .unwrap_err();
        assert!(matches!(err, AssemblyError::Configuration { .. }));
    }

    #[test]
    fn test_forward_loss_predict_end_to_end() {
        let device = Default::default();
        let cfg = JointModelConfig::new()
            .with_representation(RepresentationConfig::BiLstmDocSlotAttention(
                BiLstmDocSlotAttentionConfig::new()
                    .with_lstm_dim(4)
                    .with_slot_attention(Some(SlotAttentionType::Multiply)),
            ))
            .with_output_layer(crf_output());
        let features = FeatureConfig::default().with_dense(2);
        let model: JointModel<TestBackend> = cfg.assemble(&features, &metadata(20, 3, 4), &device).unwrap();

        let tokens = Tensor::<TestBackend, 1, Int>::from_ints([1, 2, 3, 4, 5, 6, 0, 0].as_slice(), &device)
            .reshape([2, 4]);
        let input = JointInput::new(tokens, vec![4, 2])
            .with_dense(Tensor::<TestBackend, 2>::ones([2, 2], &device));
        let output = model.forward(&input);
        assert_eq!(output.doc_logits.dims(), [2, 3]);
        assert_eq!(output.word_logits.dims(), [2, 4, 4]);

        let targets = JointTargets {
            doc_labels:  Tensor::<TestBackend, 1, Int>::from_ints([0, 2].as_slice(), &device),
            word_labels: Tensor::<TestBackend, 2, Int>::zeros([2, 4], &device),
        };
        let loss = model.loss(&output, &targets, &input.mask);
        let total: f32 = loss.total.into_scalar().elem();
        assert!(total.is_finite());

        let prediction = model.predict(&output, &input.seq_lens);
        assert_eq!(prediction.intents.len(), 2);
        assert_eq!(prediction.slots[0].len(), 4);
        assert_eq!(prediction.slots[1].len(), 2);
    }

    #[test]
    fn test_plan_and_free_function_agree() {
        let cfg = JointModelConfig::new().with_representation(small_bilstm());
        let meta = metadata(20, 3, 4);
        let plan = cfg.plan(&FeatureConfig::default(), &meta).unwrap();
        let model: JointModel<TestBackend> =
            assemble(&cfg, &FeatureConfig::default(), &meta, &Default::default()).unwrap();
        let summary = model.summary();

        assert_eq!(summary.in_dim_doc, plan.decoder_dims.in_dim_doc);
        assert_eq!(summary.in_dim_word, plan.decoder_dims.in_dim_word);
        assert_eq!(summary.doc_loss_weight, 0.2);
        assert_eq!(summary.word_loss_weight, 0.5);
        assert!(summary.num_params > 0);
    }
}
