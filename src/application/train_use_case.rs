// ============================================================
// Layer 2: TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Prepare the split layout     (Layer 4 - data)
//   Step 2: Load + normalise captions    (Layer 4 - data)
//   Step 3: Build the vocabulary         (Layer 4 - data)
//   Step 4: Save config + vocabulary     (Layer 6 - infra)
//   Step 5: Build train/val datasets     (Layer 4 - data)
//   Step 6: Open the metrics CSV         (Layer 6 - infra)
//   Step 7: Run training loop            (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{
    corpus::load_corpus,
    dataset::CaptionDataset,
    preparer::{DatasetPreparer, PREPARED_IMAGE_SIZE},
    vocabulary::build_vocabulary,
};
use crate::domain::caption::Split;
use crate::infra::{checkpoint::CheckpointManager, metrics::CsvMetricSink};
use crate::ml::model::CaptionModelConfig;
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved next to the checkpoints so `predict` can rebuild the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:       String,
    pub checkpoint_dir: String,
    pub epochs:         usize,
    pub batch_size:     usize,
    pub lr:             f64,
    pub embed_dim:      usize,
    pub hidden_dim:     usize,
    pub dropout:        f64,
    pub max_len:        usize,
    pub image_size:     usize,
    pub num_workers:    usize,
    pub seed:           u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:       "data".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            epochs:         10,
            batch_size:     32,
            lr:             1e-3,
            embed_dim:      256,
            hidden_dim:     512,
            dropout:        0.3,
            max_len:        30,
            image_size:     PREPARED_IMAGE_SIZE as usize,
            num_workers:    4,
            seed:           42,
        }
    }
}

impl TrainConfig {
    /// Model hyperparameters for a vocabulary of `vocab_size` words
    pub fn model_config(&self, vocab_size: usize) -> CaptionModelConfig {
        CaptionModelConfig::new(vocab_size)
            .with_embed_dim(self.embed_dim)
            .with_hidden_dim(self.hidden_dim)
            .with_dropout(self.dropout)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Split layout ──────────────────────────────────────────────
        // No-op when the split directories and caption files already exist
        let dataset_dir = DatasetPreparer::new(&cfg.data_dir, cfg.seed).prepare()?;

        // ── Step 2: Captions ──────────────────────────────────────────────────
        let corpus = load_corpus(&dataset_dir)?;

        // ── Step 3: Vocabulary from the train split only ──────────────────────
        let vocab = build_vocabulary(&corpus.train_tokens);
        tracing::info!("Vocabulary size: {}", vocab.len());

        // ── Step 4: Everything predict needs to rebuild the model ─────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_config(cfg)?;
        ckpt_manager.save_vocabulary(&vocab)?;

        // ── Step 5: Burn datasets ─────────────────────────────────────────────
        let build = |split: Split| {
            CaptionDataset::new(
                &dataset_dir, split, corpus.split(split), &vocab, cfg.image_size, cfg.max_len,
            )
        };
        let train_dataset = build(Split::Train)?;
        let val_dataset   = build(Split::Val)?;
        tracing::info!(
            "Datasets: {} train, {} validation samples",
            train_dataset.sample_count(),
            val_dataset.sample_count(),
        );

        // ── Step 6: Metric sink ───────────────────────────────────────────────
        let mut metric_sink = CsvMetricSink::new(Path::new(&cfg.checkpoint_dir))?;

        // ── Step 7: Training loop (Layer 5) ───────────────────────────────────
        run_training(cfg, train_dataset, val_dataset, &vocab, &ckpt_manager, &mut metric_sink)?;

        tracing::info!("Metrics written to '{}'", metric_sink.csv_path().display());
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_config_follows_train_config() {
        let cfg = TrainConfig { embed_dim: 64, hidden_dim: 128, dropout: 0.1, ..TrainConfig::default() };
        let model_cfg = cfg.model_config(500);

        assert_eq!(model_cfg.vocab_size, 500);
        assert_eq!(model_cfg.embed_dim, 64);
        assert_eq!(model_cfg.hidden_dim, 128);
        assert_eq!(model_cfg.dropout, 0.1);
    }

    #[test]
    fn test_config_json_round_trip() {
        let cfg  = TrainConfig { seed: 7, max_len: 12, ..TrainConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: TrainConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(back.seed, 7);
        assert_eq!(back.max_len, 12);
        assert_eq!(back.image_size, 299);
    }

    #[test]
    fn test_missing_dataset_fails_before_training() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            data_dir:       dir.path().join("data").to_string_lossy().into_owned(),
            checkpoint_dir: dir.path().join("ckpt").to_string_lossy().into_owned(),
            ..TrainConfig::default()
        };

        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(format!("{err:#}").contains("adityajn105/flickr8k"));
    }

    #[test]
    fn test_corrupt_image_aborts_before_training() {
        let dir     = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("data").join("flickr8k");
        for split in Split::ALL {
            let split_dir = dataset.join(split.as_str());
            std::fs::create_dir_all(&split_dir).unwrap();
            image::RgbImage::new(4, 4).save(split_dir.join("good.jpg")).unwrap();
            std::fs::write(
                dataset.join(split.captions_file()),
                r#"{"good": ["A dog."], "broken": ["A cat."]}"#,
            ).unwrap();
        }
        std::fs::write(dataset.join("train").join("broken.jpg"), b"truncated").unwrap();

        let cfg = TrainConfig {
            data_dir:       dir.path().join("data").to_string_lossy().into_owned(),
            checkpoint_dir: dir.path().join("ckpt").to_string_lossy().into_owned(),
            ..TrainConfig::default()
        };

        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(format!("{err:#}").contains("broken.jpg"));
        assert!(!dir.path().join("ckpt").join("latest_epoch.json").exists());
    }
}
