// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and routes each mode to its
// use case:
//
//   train — train a rationalizer, write checkpoints and records
//   test  — data loader smoke test
//   purge — delete the checkpoints of a run

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, RunArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "rationale3p",
    version = "0.1.0",
    about = "Train a three-player rationalized text classifier: tagger, classifier and anti-classifier."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Test(args)  => run_test(args),
            Commands::Purge(args) => run_purge(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on dataset '{}'", args.run.data_name);
    let use_case = TrainUseCase::new(args.into());
    use_case.execute()?;

    println!("Model successfully trained.");
    Ok(())
}

fn run_test(args: RunArgs) -> Result<()> {
    use crate::application::data_check_use_case::DataCheckUseCase;

    let report = DataCheckUseCase::new(args.into()).execute(4)?;
    for (split, size) in &report.split_sizes {
        println!("{split}: {size} examples");
    }
    println!("vocabulary: {} words, {} labels", report.vocab_size, report.num_labels);
    for line in &report.sample {
        println!("  {line}");
    }
    println!("Data loader is tested.");
    Ok(())
}

fn run_purge(args: RunArgs) -> Result<()> {
    use crate::application::purge_use_case::PurgeUseCase;

    let removed = PurgeUseCase::new(args.into()).execute()?;
    println!("{removed} checkpoints purged.");
    Ok(())
}
