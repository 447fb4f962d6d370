use std::io::{self, Write};

use anyhow::Context;
use clap::Parser;
use tinytorch::tutorial::{self, TutorialConfig};
use tracing_subscriber::EnvFilter;

/// Walk through basic tensor operations, then train a two-layer network on a single sample.
#[derive(Parser, Debug)]
#[command(name = "tinytorch", version, about)]
struct Cli {
    /// Number of training epochs
    #[arg(long, default_value_t = 10)]
    epochs: usize,

    /// Step size of the SGD optimizer
    #[arg(long, default_value_t = 0.01)]
    learning_rate: f32,

    /// Seed for the random generator; without it every run differs
    #[arg(long)]
    seed: Option<u64>,
}

impl From<Cli> for TutorialConfig {
    fn from(cli: Cli) -> Self {
        Self {
            epochs: cli.epochs,
            learning_rate: cli.learning_rate,
            seed: cli.seed,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tinytorch=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = TutorialConfig::from(Cli::parse());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    tutorial::run(&config, &mut out).context("tutorial failed")?;
    out.flush()?;
    Ok(())
}
