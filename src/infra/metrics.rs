// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records per-epoch classification metrics to a CSV file.
//
// One row per (epoch, split):
//   epoch,split,loss,accuracy,precision,recall,f1
//   1,train,0.612345,0.671000,0.655000,0.598000,0.625000
//   1,valid,0.551200,0.722000,0.701000,0.690000,0.695000
//   ...
//
// How to read the metrics:
//   - Loss should decrease each epoch (model is learning)
//   - If valid loss rises while train loss falls → overfitting
//   - F1 is the number the sweep ranks configurations by
//
// The file is recreated at the start of every training run.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use crate::domain::metrics::{EpochReport, MetricsRecord};

pub const CSV_HEADER: [&str; 7] = ["epoch", "split", "loss", "accuracy", "precision", "recall", "f1"];

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create (or truncate) `csv_path` and write the header row.
    pub fn create(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();
        if let Some(parent) = csv_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        let mut w = csv::Writer::from_path(&csv_path)
            .with_context(|| format!("Cannot create metrics CSV '{}'", csv_path.display()))?;
        w.write_record(CSV_HEADER)?;
        w.flush()?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append the train and valid rows of one epoch.
    pub fn log(&self, report: &EpochReport) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        w.write_record(csv_row(report.epoch, "train", &report.train))?;
        w.write_record(csv_row(report.epoch, "valid", &report.valid))?;
        w.flush()?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, valid_loss={:.4}",
            report.epoch,
            report.train.loss,
            report.valid.loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

fn csv_row(epoch: usize, split: &str, m: &MetricsRecord) -> [String; 7] {
    [
        epoch.to_string(),
        split.to_string(),
        format!("{:.6}", m.loss),
        format!("{:.6}", m.accuracy),
        format!("{:.6}", m.precision),
        format!("{:.6}", m.recall),
        format!("{:.6}", m.f1),
    ]
}
