// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a raw dataset file to device-ready batches.
//
//   .json / .csv file
//       │
//       ▼
//   DatasetLoader      → reads rows, validates fields/columns
//       │
//       ▼
//   TextNormalizer     → lowercase, strip, stopwords, lemmas
//       │                (fanned out on a rayon worker pool)
//       ▼
//   stratified_split   → training / validation rows
//       │
//       ▼
//   SubwordEncoder     → [CLS] ids [SEP] + mask (transformer)
//   WordEncoder        → vocabulary ids          (BiLSTM)
//       │
//       ▼
//   ClassificationDataset → Burn Dataset over encoded samples
//       │
//       ▼
//   *Batcher           → stacks samples into tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Typed validation errors for dataset files
pub mod error;

/// Stopword list and noun lemmatizer
pub mod lexicon;

/// Deterministic text cleanup
pub mod normalizer;

/// JSON-lines / CSV reader with parallel normalisation
pub mod loader;

/// Stratified, seeded train/validation split
pub mod splitter;

/// Word vocabulary for the recurrent model
pub mod vocab;

/// Subword and word-id sequence encoders
pub mod encoder;

/// Burn Dataset over encoded samples
pub mod dataset;

/// Burn Batchers for both model families
pub mod batcher;
