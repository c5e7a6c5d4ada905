// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
//
//   1. `prepare`: lays out the dataset splits
//   2. `train`: prepares if needed, then trains
//   3. `predict`: captions a split with the latest checkpoint
//
// Reference: Rust Book §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, PrepareArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "flickr-caption",
    version = "0.1.0",
    about = "Train a CNN + LSTM image captioning model on Flickr8k."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the use case of the chosen subcommand.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args) => run_prepare(args),
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;

    let dir = PrepareUseCase::new(args.into()).execute()?;
    println!("Dataset ready in '{}'", dir.display());
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on data in: {}", args.data_dir);
    TrainUseCase::new(args.into()).execute()?;

    println!("Training complete. Checkpoint saved.");
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let captions = PredictUseCase::new(args.into())?.execute()?;
    for caption in &captions {
        println!("Caption: {caption}");
    }
    Ok(())
}
