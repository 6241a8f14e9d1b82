// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to data sources and trained
// models only through these traits, so it never needs to know
// whether rows came from JSON-lines or CSV, or whether the
// model underneath is the transformer or the BiLSTM (or which
// Burn backend it runs on).
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)
//            Rust Book §17 (Trait Objects)

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::domain::{
    example::LabeledExample,
    label_map::LabelMap,
    metrics::{EpochReport, MetricsRecord},
};

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Any component that can produce labelled, normalised rows.
///
/// Implementations:
///   - DatasetLoader → JSON-lines or CSV file, cleaned on a worker pool
pub trait ExampleSource {
    fn load_all(&self) -> Result<Vec<LabeledExample>>;
}

// ─── TextClassifier ───────────────────────────────────────────────────────────
/// A trained sarcasm classifier, independent of architecture and backend.
pub trait TextClassifier {
    /// Short architecture name, used for output paths ("transformer" / "lstm").
    fn kind(&self) -> &'static str;

    /// Label space the model was trained on.
    fn labels(&self) -> &LabelMap;

    /// Per-epoch metrics recorded while fitting.
    fn history(&self) -> &[EpochReport];

    /// Score the model on rows whose labels all belong to `labels()`.
    fn evaluate(&self, examples: &[LabeledExample]) -> Result<MetricsRecord>;

    /// Predict a label name for each already-normalised text.
    fn predict(&self, clean_texts: &[String]) -> Result<Vec<String>>;

    /// Persist weights + manifest under `root`; returns the primary artifact path.
    fn save(&self, root: &Path, name: &str) -> Result<PathBuf>;

    /// Validation metrics of the last epoch, if any epoch ran.
    fn final_validation(&self) -> Option<MetricsRecord> {
        self.history().last().map(|r| r.valid)
    }
}
