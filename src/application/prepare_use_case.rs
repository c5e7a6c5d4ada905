// ============================================================
// Layer 2: PrepareUseCase
// ============================================================
// Builds the train/val/test layout from the extracted archive
// without training, so the (slow) image resize can run once
// ahead of any experiment.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::preparer::DatasetPreparer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareConfig {
    pub data_dir: String,
    pub seed:     u64,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self { data_dir: "data".to_string(), seed: 42 }
    }
}

pub struct PrepareUseCase {
    config: PrepareConfig,
}

impl PrepareUseCase {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    /// Returns the directory holding the prepared dataset.
    pub fn execute(&self) -> Result<PathBuf> {
        let cfg = &self.config;
        tracing::info!("Preparing dataset under '{}' (seed {})", cfg.data_dir, cfg.seed);
        DatasetPreparer::new(&cfg.data_dir, cfg.seed).prepare()
    }
}
