// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with `clap` and prints results. Everything
// else is delegated to Layer 2 (application).
//
//   1. `init`     — write starter documents to a directory
//   2. `assemble` — build the model they describe and print
//                   its wiring as JSON
//
// Reference: Rust Book §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{AssembleArgs, Commands, InitArgs};

#[derive(Parser, Debug)]
#[command(
    name = "joint-intent-slot",
    version = "0.1.0",
    about = "Assemble joint intent-classification / slot-filling models from JSON configs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init(args)     => run_init(args),
            Commands::Assemble(args) => run_assemble(args),
        }
    }
}

/// Write starter documents and report where they went.
fn run_init(args: InitArgs) -> Result<()> {
    use crate::application::init_use_case::InitUseCase;

    let dir = args.dir.clone();
    InitUseCase::new(args.into()).execute()?;
    println!("Wrote model_config.json, feature_config.json and metadata.json to '{dir}'");
    Ok(())
}

/// Assemble from a directory and print the report as pretty JSON.
fn run_assemble(args: AssembleArgs) -> Result<()> {
    use crate::application::assemble_use_case::AssembleUseCase;

    tracing::info!("Assembling model from '{}'", args.dir);
    let report = AssembleUseCase::new(args.into()).execute()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_init_flags() {
        let cli = Cli::try_parse_from([
            "joint-intent-slot", "init", "--dir", "out", "--word-output", "crf", "--representation", "cnn",
            "--dense-dim", "4",
        ])
        .unwrap();
        match cli.command {
            Commands::Init(args) => {
                assert_eq!(args.dir, "out");
                assert_eq!(args.dense_dim, 4);
                assert!(matches!(args.word_output, commands::WordOutputArg::Crf));
                assert!(matches!(args.representation, commands::RepresentationArg::Cnn));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_assemble_defaults() {
        let cli = Cli::try_parse_from(["joint-intent-slot", "assemble"]).unwrap();
        match cli.command {
            Commands::Assemble(args) => {
                assert_eq!(args.dir, "model");
                assert_eq!(args.smoke_batch, 0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_unknown_word_output_is_rejected() {
        let result = Cli::try_parse_from(["joint-intent-slot", "init", "--word-output", "semi_markov"]);
        assert!(result.is_err());
    }
}
