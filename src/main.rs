use anyhow::Result;
use clap::Parser;
use joint_intent_slot::cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("joint_intent_slot=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
