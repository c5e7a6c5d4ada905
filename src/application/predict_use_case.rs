// ============================================================
// Layer 2: PredictUseCase
// ============================================================
// Captions one split of the prepared dataset with the latest
// checkpoint:
//
//   Step 1: Restore config, vocabulary and weights (Layer 5/6)
//   Step 2: Load + normalise the split's captions  (Layer 4)
//   Step 3: Build the dataset with the saved vocab (Layer 4)
//   Step 4: Caption the first image of each batch  (Layer 5)
//   Step 5: Optionally write the captions as JSON

use std::{fs, path::Path};

use anyhow::{Context, Result};

use crate::data::{corpus::load_split, dataset::CaptionDataset, preparer::DatasetPreparer};
use crate::domain::caption::Split;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;

#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub data_dir:       String,
    pub checkpoint_dir: String,
    pub split:          Split,
    pub batch_size:     usize,
    pub output:         Option<String>,
}

pub struct PredictUseCase {
    config:     PredictConfig,
    inferencer: Inferencer,
}

impl PredictUseCase {
    pub fn new(config: PredictConfig) -> Result<Self> {
        let ckpt       = CheckpointManager::new(&config.checkpoint_dir)?;
        let inferencer = Inferencer::from_checkpoint(&ckpt)?;
        Ok(Self { config, inferencer })
    }

    /// Generated captions, one per batch of the chosen split.
    pub fn execute(&self) -> Result<Vec<String>> {
        let cfg       = &self.config;
        let train_cfg = self.inferencer.config();

        let dataset_dir = DatasetPreparer::new(&cfg.data_dir, train_cfg.seed).dataset_dir();
        let (captions, _) = load_split(&dataset_dir.join(cfg.split.captions_file()))?;

        let dataset = CaptionDataset::new(
            &dataset_dir,
            cfg.split,
            &captions,
            self.inferencer.vocab(),
            train_cfg.image_size,
            train_cfg.max_len,
        )?;

        let generated = self.inferencer.caption_dataset(dataset, cfg.batch_size);
        tracing::info!("Generated {} captions for the {} split", generated.len(), cfg.split);

        if let Some(output) = &cfg.output {
            write_captions(Path::new(output), &generated)?;
        }
        Ok(generated)
    }
}

/// Write `captions` as a pretty JSON array.
fn write_captions(path: &Path, captions: &[String]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }
    fs::write(path, serde_json::to_string_pretty(captions)?)
        .with_context(|| format!("Cannot write captions to '{}'", path.display()))?;
    tracing::info!("Captions written to '{}'", path.display());
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_captions_as_json_array() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("captions.json");

        write_captions(&path, &["a dog runs.".to_string(), "two cats".to_string()]).unwrap();

        let back: Vec<String> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec!["a dog runs.", "two cats"]);
    }

    #[test]
    fn test_predict_without_checkpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PredictConfig {
            data_dir:       dir.path().to_string_lossy().into_owned(),
            checkpoint_dir: dir.path().join("ckpt").to_string_lossy().into_owned(),
            split:          Split::Test,
            batch_size:     4,
            output:         None,
        };

        let err = PredictUseCase::new(cfg).err().unwrap();
        assert!(format!("{err:#}").contains("train_config.json"));
    }
}
