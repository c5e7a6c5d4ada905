// ============================================================
// Layer 5: Inferencer
// ============================================================
use anyhow::Result;
use burn::{data::dataloader::DataLoaderBuilder, prelude::*};

use crate::application::train_use_case::TrainConfig;
use crate::data::batcher::{CaptionBatch, CaptionBatcher};
use crate::data::dataset::CaptionDataset;
use crate::data::vocabulary::Vocabulary;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{CaptionModel, CaptionNet};
use crate::ml::trainer::first_image;

type InferBackend = burn::backend::Wgpu;

/// Caption the first image of every batch. Returns exactly one caption per batch.
pub fn predict<B, M>(
    model:   &M,
    batches: impl IntoIterator<Item = CaptionBatch<B>>,
    device:  &B::Device,
    vocab:   &Vocabulary,
    max_len: usize,
) -> Vec<String>
where
    B: Backend,
    M: CaptionModel<B>,
{
    // TODO: caption every image of the batch once generation takes a batched input
    batches
        .into_iter()
        .map(|batch| {
            let image = first_image(batch.images.to_device(device));
            model.generate_caption(image, vocab, max_len)
        })
        .collect()
}

/// A trained model restored from the checkpoint directory, on WGPU.
pub struct Inferencer {
    model:  CaptionNet<InferBackend>,
    vocab:  Vocabulary,
    config: TrainConfig,
    device: burn::backend::wgpu::WgpuDevice,
}

impl Inferencer {
    /// Rebuild the model from train_config.json + vocabulary.json and
    /// load the weights of the latest epoch.
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        let config = ckpt_manager.load_config()?;
        let vocab  = ckpt_manager.load_vocabulary()?;
        let device = burn::backend::wgpu::WgpuDevice::default();

        let model: CaptionNet<InferBackend> = config.model_config(vocab.len()).init(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint");

        Ok(Self { model, vocab, config, device })
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// The configuration the checkpoint was trained with
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// One caption per batch of `dataset`, in dataset order.
    pub fn caption_dataset(&self, dataset: CaptionDataset, batch_size: usize) -> Vec<String> {
        let batcher = CaptionBatcher::<InferBackend>::new(
            self.device.clone(), self.vocab.pad_index(), self.config.image_size,
        );
        let loader = DataLoaderBuilder::new(batcher)
            .batch_size(batch_size)
            .num_workers(self.config.num_workers)
            .build(dataset);

        predict(&self.model, loader.iter(), &self.device, &self.vocab, self.config.max_len)
    }
}
