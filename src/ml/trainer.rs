// ============================================================
// Layer 5: Training Loop
// ============================================================
// Epoch loop using Burn's DataLoader and Adam.
//
// Per training batch:
//   targets [batch, len] → transpose → [len, batch]
//   model(images, targets[..len-1])   → scores [len-1, batch, vocab]
//   flatten scores  → [(len-1)*batch, vocab]
//   flatten targets[1..] → [(len-1)*batch]
//   cross-entropy (ignoring <PAD>) → backward → Adam step
//
// Burn notes:
//   - "Training mode" is the autodiff backend: train_epoch only
//     accepts models on an AutodiffBackend
//   - model.valid() returns the model on the inner backend, with
//     no gradient tracking and dropout disabled; validation runs
//     on that copy
//   - Gradients are produced fresh by every backward() call, so
//     there is nothing to zero between batches
//   - The optimiser consumes the model and returns the updated one
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use indicatif::ProgressBar;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{CaptionBatch, CaptionBatcher},
    dataset::CaptionDataset,
    vocabulary::Vocabulary,
};
use crate::domain::traits::MetricSink;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{CaptionModel, CaptionModelConfig, CaptionNet};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Metric tag of the per-batch training loss
pub const TRAIN_LOSS_TAG: &str = "Loss/train";

pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: CaptionDataset,
    val_dataset:   CaptionDataset,
    vocab:         &Vocabulary,
    ckpt_manager:  &CheckpointManager,
    metric_sink:   &mut dyn MetricSink,
) -> Result<()> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<MyBackend>(cfg, train_dataset, val_dataset, vocab, ckpt_manager, metric_sink, device)?;
    Ok(())
}

/// Build model, optimiser and loaders, then run every epoch:
/// train, caption one validation image, checkpoint.
pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: CaptionDataset,
    val_dataset:   CaptionDataset,
    vocab:         &Vocabulary,
    ckpt_manager:  &CheckpointManager,
    metric_sink:   &mut dyn MetricSink,
    device:        B::Device,
) -> Result<CaptionNet<B>> {
    B::seed(cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: CaptionNet<B> = cfg.model_config(vocab.len()).init(&device);
    tracing::info!(
        "Model ready: vocab={}, embed_dim={}, hidden_dim={}",
        vocab.len(), cfg.embed_dim, cfg.hidden_dim,
    );

    let mut optim = AdamConfig::new().with_epsilon(1e-8).init::<B, CaptionNet<B>>();

    // <PAD> positions contribute nothing to the loss
    let pad = vec![vocab.pad_index()];
    let train_loss = CrossEntropyLossConfig::new()
        .with_pad_tokens(Some(pad.clone()))
        .init::<B>(&device);
    let val_loss = CrossEntropyLossConfig::new()
        .with_pad_tokens(Some(pad))
        .init::<B::InnerBackend>(&device);

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_batcher = CaptionBatcher::<B>::new(device.clone(), vocab.pad_index(), cfg.image_size);
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.num_workers)
        .build(train_dataset);

    let val_batcher = CaptionBatcher::<B::InnerBackend>::new(device.clone(), vocab.pad_index(), cfg.image_size);
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers)
        .build(val_dataset);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        model = train_epoch(
            model,
            train_loader.iter(),
            &train_loss,
            &mut optim,
            &mut *metric_sink,
            epoch,
            &device,
            cfg.lr,
        )?;

        let model_valid = model.valid();
        validate_epoch(
            &model_valid,
            val_loader.iter(),
            &val_loss,
            &mut *metric_sink,
            epoch,
            &device,
            vocab,
            cfg.max_len,
        );

        ckpt_manager.save_model(&model, epoch)?;
        println!("Epoch {:>3}/{} done | checkpoint saved", epoch, cfg.epochs);
    }

    tracing::info!("Training complete!");
    Ok(model)
}

/// One pass over `batches`: forward, loss, backward, one optimiser
/// step per batch, and one "Loss/train" scalar per batch keyed by `epoch`.
#[allow(clippy::too_many_arguments)]
pub fn train_epoch<B, M, O, S>(
    mut model:   M,
    batches:     impl IntoIterator<Item = CaptionBatch<B>>,
    loss_fn:     &CrossEntropyLoss<B>,
    optimizer:   &mut O,
    metric_sink: &mut S,
    epoch:       usize,
    device:      &B::Device,
    lr:          f64,
) -> Result<M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + CaptionModel<B>,
    O: Optimizer<M, B>,
    S: MetricSink + ?Sized,
{
    let progress     = ProgressBar::new_spinner();
    let mut loss_sum = 0.0f64;
    let mut steps    = 0usize;

    for batch in batches {
        let images  = batch.images.to_device(device);
        // [batch, len] → [len, batch]: the decoder input is sequence-major
        let targets = batch.targets.to_device(device).swap_dims(0, 1);
        let [len, batch_size] = targets.dims();

        if len < 2 {
            tracing::warn!("Skipping batch with captions shorter than two tokens");
            continue;
        }

        let prefix = targets.clone().slice([0..len - 1, 0..batch_size]);
        let next   = targets.slice([1..len, 0..batch_size]);

        let scores = model.forward(images, prefix);
        let [seq, _, vocab_size] = scores.dims();

        let scores = scores.reshape([seq * batch_size, vocab_size]);
        let next   = next.reshape([seq * batch_size]);

        let loss = loss_fn.forward(scores, next);
        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

        // Backward pass + Adam update
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optimizer.step(lr, model, grads);

        metric_sink.add_scalar(TRAIN_LOSS_TAG, loss_val, epoch)?;

        loss_sum += loss_val;
        steps    += 1;
        progress.inc(1);
    }
    progress.finish_and_clear();

    let avg = if steps > 0 { loss_sum / steps as f64 } else { f64::NAN };
    tracing::info!("Epoch {}: train_loss={:.4} over {} batches", epoch, avg, steps);

    Ok(model)
}

/// Caption the first image of the first batch and print it.
///
/// The model must be on a non-autodiff backend (see `model.valid()`).
/// Only one sample is captioned and nothing is written to the metric sink.
#[allow(clippy::too_many_arguments)]
pub fn validate_epoch<B, M, S>(
    model:        &M,
    batches:      impl IntoIterator<Item = CaptionBatch<B>>,
    _loss_fn:     &CrossEntropyLoss<B>,
    _metric_sink: &mut S,
    epoch:        usize,
    device:       &B::Device,
    vocab:        &Vocabulary,
    max_len:      usize,
) -> Option<String>
where
    B: Backend,
    M: CaptionModel<B>,
    S: MetricSink + ?Sized,
{
    // TODO: compute a validation loss over every batch and record it as "Loss/val"
    let batch   = batches.into_iter().next()?;
    let image   = first_image(batch.images.to_device(device));
    let caption = model.generate_caption(image, vocab, max_len);

    tracing::debug!("Epoch {} validation caption generated", epoch);
    println!("Caption: {caption}");
    Some(caption)
}

/// [batch, 3, h, w] → [1, 3, h, w]
pub(crate) fn first_image<B: Backend>(images: Tensor<B, 4>) -> Tensor<B, 4> {
    let [_, c, h, w] = images.dims();
    images.slice([0..1, 0..c, 0..h, 0..w])
}
