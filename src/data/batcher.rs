// ============================================================
// Layer 4: Caption Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<CaptionSample>
// into device tensors.
//
// How batching works here:
//   Input:  N samples, each a CHW image and a caption of
//           varying length L_i
//   Output: images  [N, 3, S, S]
//           targets [N, max(L_i)]
//
// Captions are right-padded with the <PAD> index up to the
// longest caption in the batch, so the loss can ignore the
// padded positions.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::CaptionSample;

// ─── CaptionBatch ─────────────────────────────────────────────────────────────
/// A batch of (image, caption) pairs. Both tensors are batch-major.
#[derive(Debug, Clone)]
pub struct CaptionBatch<B: Backend> {
    /// Images, shape: [batch_size, 3, image_size, image_size]
    pub images: Tensor<B, 4>,

    /// Caption indices, shape: [batch_size, max_len]
    pub targets: Tensor<B, 2, Int>,
}

// ─── CaptionBatcher ───────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct CaptionBatcher<B: Backend> {
    pub device:     B::Device,
    pub pad_index:  usize,
    pub image_size: usize,
}

impl<B: Backend> CaptionBatcher<B> {
    pub fn new(device: B::Device, pad_index: usize, image_size: usize) -> Self {
        Self { device, pad_index, image_size }
    }
}

impl<B: Backend> Batcher<CaptionSample, CaptionBatch<B>> for CaptionBatcher<B> {
    fn batch(&self, items: Vec<CaptionSample>) -> CaptionBatch<B> {
        let batch_size = items.len();
        let max_len    = items.iter().map(|s| s.tokens.len()).max().unwrap_or(0);

        // ── Flatten images ────────────────────────────────────────────────────
        let image_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.image.iter().copied())
            .collect();

        // ── Flatten and pad captions ──────────────────────────────────────────
        let pad = self.pad_index as i32;
        let target_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| {
                s.tokens
                    .iter()
                    .map(|&t| t as i32)
                    .chain(std::iter::repeat(pad))
                    .take(max_len)
            })
            .collect();

        let images = Tensor::<B, 1>::from_floats(
            image_flat.as_slice(), &self.device
        ).reshape([batch_size, 3, self.image_size, self.image_size]);

        let targets = Tensor::<B, 1, Int>::from_ints(
            target_flat.as_slice(), &self.device
        ).reshape([batch_size, max_len]);

        CaptionBatch { images, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_pads_to_longest_caption() {
        let device  = Default::default();
        let batcher = CaptionBatcher::<TestBackend>::new(device, 9, 2);

        let items = vec![
            CaptionSample { image: vec![0.5; 12], tokens: vec![0, 1, 2, 3] },
            CaptionSample { image: vec![0.25; 12], tokens: vec![0, 3] },
        ];
        let batch = batcher.batch(items);

        assert_eq!(batch.images.dims(), [2, 3, 2, 2]);
        assert_eq!(batch.targets.dims(), [2, 4]);

        let targets: Vec<i64> = batch.targets
            .into_data()
            .iter::<i64>()
            .collect();
        assert_eq!(targets, vec![0, 1, 2, 3, 0, 3, 9, 9]);
    }
}
