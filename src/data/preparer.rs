// ============================================================
// Layer 4: Dataset Preparer
// ============================================================
// Turns the extracted Flickr8k archive into the layout the
// corpus loader and the dataset expect.
//
// Input (Kaggle dataset "adityajn105/flickr8k", extracted):
//   <root>/flickr8k/
//     Images/        ← 8091 .jpg files
//     captions.txt   ← CSV with header `image,caption`
//
// Output:
//   <root>/flickr8k/
//     train/ val/ test/          ← images resized to 299×299 RGB
//     captions_train.json        ← { "<image id>": ["caption", ...] }
//     captions_val.json
//     captions_test.json
//
// Each step is skipped when its outputs already exist. The
// check only looks at paths, not contents, so a run that was
// interrupted half way leaves a layout that will be reused
// as-is. Delete the split directories to force a rebuild.
//
// Reference: csv crate documentation
//            image crate documentation

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use indicatif::ProgressBar;
use serde::Deserialize;

use crate::data::splitter::split_three_way;
use crate::domain::caption::{image_id, CaptionMap, Split};

/// Kaggle identifier of the raw dataset
pub const DATASET_IDENTIFIER: &str = "adityajn105/flickr8k";

/// Side length the images are stored at (Inception input size)
pub const PREPARED_IMAGE_SIZE: u32 = 299;

const DATASET_DIR:   &str = "flickr8k";
const RAW_IMAGES:    &str = "Images";
const RAW_CAPTIONS:  &str = "captions.txt";

/// One row of captions.txt
#[derive(Debug, Deserialize)]
struct CaptionRow {
    image:   String,
    caption: String,
}

/// Builds the split layout under `<root>/flickr8k`.
pub struct DatasetPreparer {
    root: PathBuf,
    seed: u64,
}

impl DatasetPreparer {
    pub fn new(root: impl Into<PathBuf>, seed: u64) -> Self {
        Self { root: root.into(), seed }
    }

    /// Directory holding the prepared dataset
    pub fn dataset_dir(&self) -> PathBuf {
        self.root.join(DATASET_DIR)
    }

    /// Run every preparation step and return the ready directory.
    pub fn prepare(&self) -> Result<PathBuf> {
        let dir = self.dataset_dir();

        self.split_images(&dir)?;
        self.organize_captions(&dir)?;

        tracing::info!("Dataset processed and saved in '{}'", dir.display());
        Ok(dir)
    }

    fn split_images(&self, dir: &Path) -> Result<()> {
        if Split::ALL.iter().all(|s| dir.join(s.as_str()).is_dir()) {
            tracing::info!("Split directories already exist, skipping image split");
            return Ok(());
        }

        let raw_dir = dir.join(RAW_IMAGES);
        if !raw_dir.is_dir() {
            bail!(
                "No raw images found at '{}'. Download the Kaggle dataset '{}' \
                 and extract it into '{}'.",
                raw_dir.display(),
                DATASET_IDENTIFIER,
                dir.display(),
            );
        }

        let mut files = list_files(&raw_dir)?;
        // read_dir order is platform dependent; sort so the seed fully
        // determines the partition
        files.sort();

        let split = split_three_way(files, self.seed);
        tracing::info!(
            "Splitting images: {} train, {} val, {} test",
            split.train.len(),
            split.val.len(),
            split.test.len(),
        );

        for (s, images) in [
            (Split::Train, &split.train),
            (Split::Val,   &split.val),
            (Split::Test,  &split.test),
        ] {
            let out_dir = dir.join(s.as_str());
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("Cannot create '{}'", out_dir.display()))?;

            let progress = ProgressBar::new(images.len() as u64);
            progress.set_message(s.as_str());

            for file in images {
                resize_image(&raw_dir.join(file), &out_dir.join(file))?;
                progress.inc(1);
            }
            progress.finish_and_clear();
        }

        Ok(())
    }

    fn organize_captions(&self, dir: &Path) -> Result<()> {
        if Split::ALL.iter().all(|s| dir.join(s.captions_file()).is_file()) {
            tracing::info!("Caption records already exist, skipping caption organisation");
            return Ok(());
        }

        let csv_path = dir.join(RAW_CAPTIONS);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&csv_path)
            .with_context(|| format!("Cannot open '{}'", csv_path.display()))?;

        let mut rows = Vec::new();
        for row in reader.deserialize::<CaptionRow>() {
            let row = row
                .with_context(|| format!("Malformed row in '{}'", csv_path.display()))?;
            rows.push(row);
        }
        tracing::debug!("Read {} caption rows", rows.len());

        for split in Split::ALL {
            let split_dir = dir.join(split.as_str());
            let images: HashSet<String> = list_files(&split_dir)?.into_iter().collect();

            let captions = group_captions(&rows, &images);

            let path = dir.join(split.captions_file());
            fs::write(&path, serde_json::to_string_pretty(&captions)?)
                .with_context(|| format!("Cannot write '{}'", path.display()))?;

            tracing::info!("Wrote {} image records to '{}'", captions.len(), path.display());
        }

        Ok(())
    }
}

/// Group caption rows by image id, keeping only images in `images`.
/// Captions keep their file order within each image.
fn group_captions(rows: &[CaptionRow], images: &HashSet<String>) -> CaptionMap {
    let mut captions = CaptionMap::new();
    for row in rows.iter().filter(|r| images.contains(&r.image)) {
        captions
            .entry(image_id(&row.image).to_string())
            .or_default()
            .push(row.caption.clone());
    }
    captions
}

/// Names of the regular files directly inside `dir`
fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

fn resize_image(src: &Path, dst: &Path) -> Result<()> {
    let img = image::open(src)
        .with_context(|| format!("Cannot decode image '{}'", src.display()))?
        .to_rgb8();

    let resized = image::imageops::resize(
        &img,
        PREPARED_IMAGE_SIZE,
        PREPARED_IMAGE_SIZE,
        FilterType::Triangle,
    );

    resized
        .save(dst)
        .with_context(|| format!("Cannot save image '{}'", dst.display()))?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    /// Lay out a fake extracted archive with `n` tiny images.
    fn fake_archive(root: &Path, n: usize) {
        let raw = root.join(DATASET_DIR).join(RAW_IMAGES);
        fs::create_dir_all(&raw).unwrap();

        let mut csv = String::from("image,caption\n");
        for i in 0..n {
            RgbImage::new(8, 6).save(raw.join(format!("img{i}.jpg"))).unwrap();
            csv.push_str(&format!("img{i}.jpg,A dog number {i} .\n"));
            csv.push_str(&format!("img{i}.jpg,\"A dog, again.\"\n"));
        }
        fs::write(root.join(DATASET_DIR).join(RAW_CAPTIONS), csv).unwrap();
    }

    fn count_files(dir: &Path) -> usize {
        list_files(dir).unwrap().len()
    }

    #[test]
    fn test_prepare_builds_split_layout() {
        let root = tempfile::tempdir().unwrap();
        fake_archive(root.path(), 10);

        let dir = DatasetPreparer::new(root.path(), 42).prepare().unwrap();

        assert_eq!(count_files(&dir.join("train")), 6);
        assert_eq!(count_files(&dir.join("val")),   2);
        assert_eq!(count_files(&dir.join("test")),  2);

        let any_test = list_files(&dir.join("test")).unwrap().remove(0);
        let dims     = image::image_dimensions(dir.join("test").join(&any_test)).unwrap();
        assert_eq!(dims, (PREPARED_IMAGE_SIZE, PREPARED_IMAGE_SIZE));

        let json = fs::read_to_string(dir.join("captions_test.json")).unwrap();
        let test: CaptionMap = serde_json::from_str(&json).unwrap();
        assert_eq!(test.len(), 2);

        let id = image_id(&any_test);
        assert_eq!(test[id].len(), 2);
        assert_eq!(test[id][1], "A dog, again.");
    }

    #[test]
    fn test_existing_layout_is_reused() {
        let root = tempfile::tempdir().unwrap();
        fake_archive(root.path(), 5);
        let preparer = DatasetPreparer::new(root.path(), 1);
        let dir      = preparer.prepare().unwrap();

        // Raw data is gone, but nothing needs to be rebuilt
        fs::remove_dir_all(dir.join(RAW_IMAGES)).unwrap();
        fs::remove_file(dir.join(RAW_CAPTIONS)).unwrap();
        assert!(preparer.prepare().is_ok());
    }

    #[test]
    fn test_missing_archive_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let err  = DatasetPreparer::new(root.path(), 0).prepare().unwrap_err();
        assert!(err.to_string().contains(DATASET_IDENTIFIER));
    }

    #[test]
    fn test_group_captions_strips_extension() {
        let rows = vec![
            CaptionRow { image: "a.jpg".into(), caption: "first".into() },
            CaptionRow { image: "b.jpg".into(), caption: "other".into() },
            CaptionRow { image: "a.jpg".into(), caption: "second".into() },
        ];
        let images: HashSet<String> = ["a.jpg".to_string()].into_iter().collect();
        let grouped = group_captions(&rows, &images);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped["a"], vec!["first", "second"]);
    }
}
