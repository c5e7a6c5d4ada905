// ============================================================
// Layer 6: CSV Metric Sink
// ============================================================
// Appends every recorded scalar to a CSV file so learning
// curves can be plotted after (or during) a run.
//
// Output file: checkpoints/metrics.csv
//
// Example:
//   tag,step,value
//   Loss/train,1,4.812300
//   Loss/train,1,4.770100
//   ...
//
// One row is written per training batch; `step` is the epoch
// the batch belongs to, so several rows share the same step.
// Re-running training appends to the existing file.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};
use serde::Serialize;

use crate::domain::traits::MetricSink;

pub const METRICS_FILE: &str = "metrics.csv";

#[derive(Debug, Serialize)]
struct MetricRow<'a> {
    tag:   &'a str,
    step:  usize,
    value: String,
}

/// `MetricSink` backed by `<dir>/metrics.csv`.
pub struct CsvMetricSink {
    writer:   csv::Writer<fs::File>,
    csv_path: PathBuf,
}

impl CsvMetricSink {
    /// Open (or create) `<dir>/metrics.csv`. The header is written only for a new file.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics dir '{}'", dir.display()))?;
        let csv_path = dir.join(METRICS_FILE);
        let is_new   = !csv_path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&csv_path)
            .with_context(|| format!("Cannot open '{}'", csv_path.display()))?;

        let writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);

        if is_new {
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }
        Ok(Self { writer, csv_path })
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl MetricSink for CsvMetricSink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        let row = MetricRow { tag, step, value: format!("{value:.6}") };
        self.writer.serialize(row)?;
        // Flush per row so a crashed run keeps what it logged
        self.writer.flush()?;
        Ok(())
    }
}
