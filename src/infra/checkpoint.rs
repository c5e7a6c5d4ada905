// ============================================================
// Layer 6: Checkpoint Manager
// ============================================================
// Saves and restores everything needed to caption images
// after training, using Burn's CompactRecorder for weights.
//
// Layout of the checkpoint directory:
//   checkpoints/
//     model_epoch_1.mpk.gz   ← weights after epoch 1
//     model_epoch_2.mpk.gz   ← weights after epoch 2
//     ...
//     latest_epoch.json      ← number of the last saved epoch
//     train_config.json      ← hyperparameters (model shape)
//     vocabulary.json        ← index → word table
//     metrics.csv            ← written by CsvMetricSink
//
// The config and vocabulary are required to rebuild a model
// with the same shape before its weights can be loaded.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::data::vocabulary::Vocabulary;
use crate::ml::model::CaptionNet;

const LATEST_EPOCH_FILE: &str = "latest_epoch.json";
const CONFIG_FILE:       &str = "train_config.json";
const VOCABULARY_FILE:   &str = "vocabulary.json";

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Write `{dir}/model_epoch_{epoch}.mpk.gz` and point latest_epoch.json at it.
    pub fn save_model<B: Backend>(&self, model: &CaptionNet<B>, epoch: usize) -> Result<()> {
        // The recorder appends the extension
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join(LATEST_EPOCH_FILE);
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write {LATEST_EPOCH_FILE}"))?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the weights of the latest epoch into `model`.
    /// `model` must have the architecture the checkpoint was saved with.
    pub fn load_model<B: Backend>(
        &self,
        model:  CaptionNet<B>,
        device: &B::Device,
    ) -> Result<CaptionNet<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, cfg)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(CONFIG_FILE)
    }

    pub fn save_vocabulary(&self, vocab: &Vocabulary) -> Result<()> {
        self.write_json(VOCABULARY_FILE, vocab)
    }

    pub fn load_vocabulary(&self) -> Result<Vocabulary> {
        let vocab: Vocabulary = self.read_json(VOCABULARY_FILE)?;
        tracing::info!("Loaded vocabulary: {} words", vocab.len());
        Ok(vocab)
    }

    /// Number of the last saved epoch. Errors if training hasn't run yet.
    pub fn latest_epoch(&self) -> Result<usize> {
        self.read_json(LATEST_EPOCH_FILE)
    }

    fn write_json<T: serde::Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!("Cannot read '{}'. Have you run 'train' first?", path.display())
            })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::data::vocabulary::build_vocabulary;
    use crate::ml::model::CaptionModelConfig;

    type TestBackend = NdArray;

    #[test]
    fn test_model_round_trip_uses_latest_epoch() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        let config = CaptionModelConfig::new(6).with_embed_dim(4).with_hidden_dim(4);

        let first: CaptionNet<TestBackend>  = config.init(&device);
        let second: CaptionNet<TestBackend> = config.init(&device);
        ckpt.save_model(&first, 1).unwrap();
        ckpt.save_model(&second, 2).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 2);

        let fresh: CaptionNet<TestBackend> = config.init(&device);
        let loaded = ckpt.load_model(fresh, &device).unwrap();

        let expected = second.output.weight.val().into_data();
        loaded.output.weight.val().into_data().assert_eq(&expected, true);
    }

    #[test]
    fn test_load_without_training_fails() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();

        let err = ckpt.latest_epoch().unwrap_err();
        assert!(format!("{err:#}").contains("train"));
        assert!(ckpt.load_config().is_err());
    }

    #[test]
    fn test_config_and_vocabulary_persist() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("nested")).unwrap();

        let cfg = TrainConfig { epochs: 3, hidden_dim: 32, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();
        let loaded = ckpt.load_config().unwrap();
        assert_eq!(loaded.epochs, 3);
        assert_eq!(loaded.hidden_dim, 32);

        let vocab = build_vocabulary(&["<s>", "a", "a", "dog", "</s>"]);
        ckpt.save_vocabulary(&vocab).unwrap();
        let loaded = ckpt.load_vocabulary().unwrap();
        assert_eq!(loaded.index_to_word(), vocab.index_to_word());
        assert_eq!(loaded.index("dog"), vocab.index("dog"));
    }
}
