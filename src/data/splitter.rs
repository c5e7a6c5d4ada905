// ============================================================
// Layer 4: Train/Validation/Test Splitter
// ============================================================
// Partitions the image list into three disjoint sets:
//   - Training set:   used to update model weights
//   - Validation set: captioned after every epoch
//   - Test set:       used by `predict`
//
// Split ratios (per partition step):
//   all images  → 80% train+val, 20% test
//   train+val   → 80% train,     20% val
//   i.e. 64% / 16% / 20% overall
//
// Shuffling uses a seeded StdRng so that re-running preparation
// with the same seed produces the same partition.
//
// Reference: rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Fraction kept on the "train" side at each split step
pub const KEEP_FRACTION: f64 = 0.8;

/// The three image partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreeWaySplit<T> {
    pub train: Vec<T>,
    pub val:   Vec<T>,
    pub test:  Vec<T>,
}

/// Shuffle once, then take the last 20% as test and the last 20%
/// of the remainder as validation.
pub fn split_three_way<T>(mut samples: Vec<T>, seed: u64) -> ThreeWaySplit<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let (train_val, test) = split_at_fraction(samples, KEEP_FRACTION);
    let (train, val)      = split_at_fraction(train_val, KEEP_FRACTION);

    tracing::debug!(
        "Dataset split: {} train, {} val, {} test",
        train.len(),
        val.len(),
        test.len(),
    );

    ThreeWaySplit { train, val, test }
}

fn split_at_fraction<T>(mut samples: Vec<T>, fraction: f64) -> (Vec<T>, Vec<T>) {
    let total    = samples.len();
    let split_at = ((total as f64) * fraction) as usize;

    // Clamp to valid range to avoid panics on tiny datasets
    let split_at = split_at.min(total);

    let rest = samples.split_off(split_at);
    (samples, rest)
}
