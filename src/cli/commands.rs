// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `prepare`, `train` and
// `predict`, and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    predict_use_case::PredictConfig,
    prepare_use_case::PrepareConfig,
    train_use_case::TrainConfig,
};
use crate::domain::caption::Split;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split the extracted Flickr8k archive into train/val/test
    Prepare(PrepareArgs),

    /// Train the captioning model
    Train(TrainArgs),

    /// Caption a dataset split with the latest checkpoint
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Root directory; the archive is expected under <data-dir>/flickr8k
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Seed of the image split shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl From<PrepareArgs> for PrepareConfig {
    fn from(a: PrepareArgs) -> Self {
        PrepareConfig { data_dir: a.data_dir, seed: a.seed }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Root directory; the archive is expected under <data-dir>/flickr8k
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Directory for checkpoints, vocabulary and metrics.csv
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Size of the word embeddings fed to the LSTM
    #[arg(long, default_value_t = 256)]
    pub embed_dim: usize,

    /// LSTM hidden state size
    #[arg(long, default_value_t = 512)]
    pub hidden_dim: usize,

    /// Dropout probability before the output projection
    #[arg(long, default_value_t = 0.3)]
    pub dropout: f64,

    /// Captions are cut to this many tokens; also caps generated captions
    #[arg(long, default_value_t = 30)]
    pub max_len: usize,

    /// Side length images are resized to before batching
    #[arg(long, default_value_t = 299)]
    pub image_size: usize,

    /// DataLoader worker threads
    #[arg(long, default_value_t = 4)]
    pub num_workers: usize,

    /// Seed for the split shuffle, batch order and weight init
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:       a.data_dir,
            checkpoint_dir: a.checkpoint_dir,
            epochs:         a.epochs,
            batch_size:     a.batch_size,
            lr:             a.lr,
            embed_dim:      a.embed_dim,
            hidden_dim:     a.hidden_dim,
            dropout:        a.dropout,
            max_len:        a.max_len,
            image_size:     a.image_size,
            num_workers:    a.num_workers,
            seed:           a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Same data directory as used during training
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Which split to caption: train, val or test
    #[arg(long, default_value = "test")]
    pub split: Split,

    /// One caption is generated per batch
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Write the captions to this JSON file
    #[arg(long)]
    pub output: Option<String>,
}

impl From<PredictArgs> for PredictConfig {
    fn from(a: PredictArgs) -> Self {
        PredictConfig {
            data_dir:       a.data_dir,
            checkpoint_dir: a.checkpoint_dir,
            split:          a.split,
            batch_size:     a.batch_size,
            output:         a.output,
        }
    }
}
