// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Persistence shared by the training and prediction workflows:
//
//   checkpoint.rs: model weights (Burn CompactRecorder), the
//     training config and the vocabulary, so a
//     later `predict` can rebuild the exact model
//
//   metrics.rs: CSV-backed MetricSink; the training loop
//     appends one loss row per batch
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV sink
pub mod metrics;
