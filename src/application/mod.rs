// ============================================================
// Layer 2: Application / Use Cases
// ============================================================
// Each use case wires the data, ml and infra layers together
// for one CLI command. No model math and no printing here.
//
// Reference: Clean Architecture pattern

// Dataset layout only
pub mod prepare_use_case;

// The training workflow
pub mod train_use_case;

// Captioning a split with a trained checkpoint
pub mod predict_use_case;
