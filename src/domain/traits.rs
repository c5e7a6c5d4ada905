// ============================================================
// Layer 3: Core Traits (Abstractions)
// ============================================================
// The training loop reports scalars through a sink rather than
// a concrete logger, so tests can capture what was recorded and
// the real run can append to a CSV file (Layer 6).
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

// ─── MetricSink ───────────────────────────────────────────────────────────────
/// Append-only destination for tagged scalar metrics.
///
/// Implementations:
///   - CsvMetricSink → appends rows to metrics.csv
///   - Vec<ScalarRecord> → keeps everything in memory
pub trait MetricSink {
    /// Record `value` for metric `tag` at `step` (the epoch number).
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()>;
}

/// One recorded scalar
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarRecord {
    pub tag:   String,
    pub value: f64,
    pub step:  usize,
}

impl MetricSink for Vec<ScalarRecord> {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        self.push(ScalarRecord { tag: tag.to_string(), value, step });
        Ok(())
    }
}

impl<S: MetricSink + ?Sized> MetricSink for &mut S {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        (**self).add_scalar(tag, value, step)
    }
}
