// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `init` and `assemble`, and all
// their flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::{
    assemble_use_case::AssembleConfig,
    init_use_case::{InitConfig, RepresentationKind, WordOutputKind},
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write default model, feature and metadata documents
    Init(InitArgs),

    /// Assemble a model from a document directory and report its wiring
    Assemble(AssembleArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum RepresentationArg {
    /// Stacked BiLSTM with attention pooling
    Bilstm,
    /// Parallel 1-D convolutions
    Cnn,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[value(rename_all = "snake_case")]
pub enum WordOutputArg {
    /// Independent softmax per token
    WordTagging,
    /// Linear-chain CRF
    Crf,
}

impl From<RepresentationArg> for RepresentationKind {
    fn from(a: RepresentationArg) -> Self {
        match a {
            RepresentationArg::Bilstm => RepresentationKind::BiLstm,
            RepresentationArg::Cnn => RepresentationKind::Cnn,
        }
    }
}

impl From<WordOutputArg> for WordOutputKind {
    fn from(a: WordOutputArg) -> Self {
        match a {
            WordOutputArg::WordTagging => WordOutputKind::WordTagging,
            WordOutputArg::Crf => WordOutputKind::Crf,
        }
    }
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory the three JSON documents are written to
    #[arg(long, default_value = "model")]
    pub dir: String,

    #[arg(long, value_enum, default_value_t = RepresentationArg::Bilstm)]
    pub representation: RepresentationArg,

    #[arg(long, value_enum, default_value_t = WordOutputArg::WordTagging)]
    pub word_output: WordOutputArg,

    /// Width of each embedded token
    #[arg(long, default_value_t = 100)]
    pub embed_dim: usize,

    /// Width of the dense feature group; 0 declares none
    #[arg(long, default_value_t = 0)]
    pub dense_dim: usize,

    /// Size of the token vocabulary
    #[arg(long, default_value_t = 1000)]
    pub vocab: usize,

    /// Number of intent labels
    #[arg(long, default_value_t = 7)]
    pub doc_labels: usize,

    /// Number of slot labels
    #[arg(long, default_value_t = 12)]
    pub word_labels: usize,
}

impl From<InitArgs> for InitConfig {
    fn from(a: InitArgs) -> Self {
        InitConfig {
            dir:            a.dir,
            representation: a.representation.into(),
            word_output:    a.word_output.into(),
            embed_dim:      a.embed_dim,
            dense_dim:      a.dense_dim,
            vocab_size:     a.vocab,
            doc_labels:     a.doc_labels,
            word_labels:    a.word_labels,
        }
    }
}

#[derive(Args, Debug)]
pub struct AssembleArgs {
    /// Directory holding model_config.json, feature_config.json and metadata.json
    #[arg(long, default_value = "model")]
    pub dir: String,

    /// Run one random batch of this many samples through the model
    #[arg(long, default_value_t = 0)]
    pub smoke_batch: usize,

    /// Longest sequence in the random batch
    #[arg(long, default_value_t = 8)]
    pub smoke_seq_len: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl From<AssembleArgs> for AssembleConfig {
    fn from(a: AssembleArgs) -> Self {
        AssembleConfig {
            dir:           a.dir,
            smoke_batch:   a.smoke_batch,
            smoke_seq_len: a.smoke_seq_len,
            seed:          a.seed,
        }
    }
}
