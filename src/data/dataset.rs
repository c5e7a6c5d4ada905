use std::{collections::HashMap, fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use burn::data::dataset::Dataset;
use image::imageops::FilterType;

use crate::data::vocabulary::Vocabulary;
use crate::domain::caption::{image_id, CaptionMap, Split};

/// One decoded (image, caption) pair.
/// `image` is CHW RGB scaled to [0, 1]; `tokens` are vocabulary indices.
#[derive(Debug, Clone)]
pub struct CaptionSample {
    pub image:  Vec<f32>,
    pub tokens: Vec<usize>,
}

#[derive(Debug, Clone)]
struct CaptionEntry {
    image_path: PathBuf,
    tokens:     Vec<usize>,
}

/// Every (image, caption) pair of one split. Images are decoded lazily in `get`.
pub struct CaptionDataset {
    entries:    Vec<CaptionEntry>,
    image_size: usize,
}

impl CaptionDataset {
    /// Fails if the split directory cannot be read or any referenced
    /// image is unreadable. Burn's loader stops at the first `None`
    /// from `get`, so bad files must be caught here.
    pub fn new(
        dir:        &Path,
        split:      Split,
        captions:   &CaptionMap,
        vocab:      &Vocabulary,
        image_size: usize,
        max_len:    usize,
    ) -> Result<Self> {
        // A caption needs at least a decoder input and a target step
        let max_len = max_len.max(2);
        let images  = index_images(&dir.join(split.as_str()))?;
        let mut entries = Vec::new();

        for (id, image_captions) in captions {
            let Some(image_path) = images.get(id.as_str()) else {
                tracing::warn!("Skipping '{id}': no image file in the {split} split");
                continue;
            };
            image::image_dimensions(image_path)
                .with_context(|| format!("Unreadable image '{}'", image_path.display()))?;

            for caption in image_captions {
                let mut tokens = vocab.encode(caption);
                tokens.truncate(max_len);
                entries.push(CaptionEntry { image_path: image_path.clone(), tokens });
            }
        }

        tracing::info!("{} split: {} caption samples", split, entries.len());
        Ok(Self { entries, image_size })
    }

    pub fn sample_count(&self) -> usize { self.entries.len() }
}

/// Image id → file path for every regular file in `split_dir`, whatever its extension.
fn index_images(split_dir: &Path) -> Result<HashMap<String, PathBuf>> {
    let mut images = HashMap::new();
    for entry in fs::read_dir(split_dir)
        .with_context(|| format!("Cannot read split directory '{}'", split_dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            let name = entry.file_name().to_string_lossy().into_owned();
            images.insert(image_id(&name).to_string(), entry.path());
        }
    }
    Ok(images)
}

impl Dataset<CaptionSample> for CaptionDataset {
    fn get(&self, index: usize) -> Option<CaptionSample> {
        let entry = self.entries.get(index)?;
        match load_image(&entry.image_path, self.image_size) {
            Ok(image) => Some(CaptionSample { image, tokens: entry.tokens.clone() }),
            Err(e) => {
                tracing::error!("{e:#}");
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Decode an image as RGB, resize to `size`×`size` if needed and lay it
/// out channel-first with values in [0, 1].
pub fn load_image(path: &Path, size: usize) -> Result<Vec<f32>> {
    let mut img = image::open(path)
        .with_context(|| format!("Cannot decode image '{}'", path.display()))?
        .to_rgb8();

    let side = size as u32;
    if img.dimensions() != (side, side) {
        img = image::imageops::resize(&img, side, side, FilterType::Triangle);
    }

    let plane = size * size;
    let mut chw = vec![0.0f32; 3 * plane];
    for (i, pixel) in img.pixels().enumerate() {
        for c in 0..3 {
            chw[c * plane + i] = pixel[c] as f32 / 255.0;
        }
    }
    Ok(chw)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::vocabulary::build_vocabulary;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_load_image_is_channel_first() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        RgbImage::from_pixel(4, 4, Rgb([255, 0, 0])).save(&path).unwrap();

        let chw = load_image(&path, 4).unwrap();
        assert_eq!(chw.len(), 3 * 16);
        assert!(chw[..16].iter().all(|&v| v == 1.0));
        assert!(chw[16..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_load_image_resizes() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbImage::new(10, 3).save(&path).unwrap();
        assert_eq!(load_image(&path, 5).unwrap().len(), 3 * 25);
    }

    #[test]
    fn test_one_sample_per_caption_and_missing_images_skipped() {
        let dir       = tempfile::tempdir().unwrap();
        let split_dir = dir.path().join("train");
        std::fs::create_dir_all(&split_dir).unwrap();
        RgbImage::new(4, 4).save(split_dir.join("img1.jpg")).unwrap();

        let mut captions = CaptionMap::new();
        captions.insert("img1".into(), vec!["<s> a dog </s>".into(), "<s> a cat </s>".into()]);
        captions.insert("gone".into(), vec!["<s> a bird </s>".into()]);

        let vocab = build_vocabulary(&["<s>", "a", "dog", "cat", "</s>"]);
        let ds    = CaptionDataset::new(dir.path(), Split::Train, &captions, &vocab, 4, 3).unwrap();

        assert_eq!(ds.len(), 2);
        let sample = ds.get(0).unwrap();
        assert_eq!(sample.image.len(), 3 * 16);
        // truncated to max_len
        assert_eq!(sample.tokens, vec![0, 1, 2]);
        assert!(ds.get(2).is_none());
    }

    #[test]
    fn test_any_image_extension_is_found() {
        let dir       = tempfile::tempdir().unwrap();
        let split_dir = dir.path().join("val");
        std::fs::create_dir_all(&split_dir).unwrap();
        RgbImage::new(4, 4).save(split_dir.join("img1.png")).unwrap();

        let mut captions = CaptionMap::new();
        captions.insert("img1".into(), vec!["<s> a dog </s>".into()]);

        let vocab = build_vocabulary(&["<s>", "a", "dog", "</s>"]);
        let ds    = CaptionDataset::new(dir.path(), Split::Val, &captions, &vocab, 4, 10).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.get(0).unwrap().image.len(), 3 * 16);
    }

    #[test]
    fn test_corrupt_image_fails_construction() {
        let dir       = tempfile::tempdir().unwrap();
        let split_dir = dir.path().join("train");
        std::fs::create_dir_all(&split_dir).unwrap();
        RgbImage::new(4, 4).save(split_dir.join("img1.jpg")).unwrap();
        std::fs::write(split_dir.join("img2.jpg"), b"not a jpeg").unwrap();
        RgbImage::new(4, 4).save(split_dir.join("img3.jpg")).unwrap();

        let mut captions = CaptionMap::new();
        for id in ["img1", "img2", "img3"] {
            captions.insert(id.into(), vec!["<s> a dog </s>".into()]);
        }

        let vocab = build_vocabulary(&["<s>", "a", "dog", "</s>"]);
        let err   = CaptionDataset::new(dir.path(), Split::Train, &captions, &vocab, 4, 10)
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("img2.jpg"));
    }

    #[test]
    fn test_missing_split_directory_is_an_error() {
        let dir   = tempfile::tempdir().unwrap();
        let vocab = build_vocabulary(&["<s>", "</s>"]);
        assert!(CaptionDataset::new(dir.path(), Split::Test, &CaptionMap::new(), &vocab, 4, 10).is_err());
    }
}
