// ============================================================
// Layer 5: ML / Model Layer (Burn)
// ============================================================
// Model, training loop and inference. Everything that builds
// layers, computes a loss or steps an optimiser lives here.
//
//   model.rs: CNN encoder + LSTM decoder (CaptionNet)
//     behind the CaptionModel trait
//
//   trainer.rs: epoch loop: train_epoch (one Adam step per
//     batch), validate_epoch (one sample caption),
//     checkpoint per epoch
//
//   inferencer.rs: restores a checkpoint and captions the
//     first image of every batch
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Vinyals et al. (2015) Show and Tell

/// Encoder-decoder captioning model
pub mod model;

/// Training loop with per-epoch validation and checkpointing
pub mod trainer;

/// Checkpoint loading and caption prediction
pub mod inferencer;
