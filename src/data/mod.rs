// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// Everything from the raw Flickr8k archive to device-ready
// tensor batches. The pipeline runs in this order:
//
//   Images/ + captions.txt
//       │
//       ▼
//   DatasetPreparer   → 80/20/20 image split, 299×299 resize,
//       │               captions grouped per split as JSON
//       ▼
//   load_corpus       → normalised captions + train token list
//       │               (uses tokenizer for punctuation tags)
//       ▼
//   build_vocabulary  → word ↔ index
//       │
//       ▼
//   CaptionDataset    → implements Burn's Dataset trait
//       │
//       ▼
//   CaptionBatcher    → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Punctuation ↔ tag substitution
pub mod tokenizer;

/// Word ↔ index mapping built from the train split
pub mod vocabulary;

/// Loads and normalises the per-split caption JSON files
pub mod corpus;

/// Lays out the extracted archive into train/val/test
pub mod preparer;

/// Seeded three-way split
pub mod splitter;

/// Implements Burn's Dataset trait for (image, caption) pairs
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
