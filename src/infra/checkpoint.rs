// ============================================================
// Layer 6 — Model Store
// ============================================================
// Saves and restores trained classifiers using Burn's
// CompactRecorder plus a JSON manifest.
//
// What gets saved per model:
//   1. Model weights (.mpk.gz file) — all learned parameters
//   2. Manifest (JSON)              — model kind, label map,
//                                     architecture config,
//                                     training config, and the
//                                     vocabulary (BiLSTM only)
//   3. tokenizer.json               — transformer only
//   4. Metrics CSV                  — one row per epoch/split
//
// Why save the architecture config separately?
//   To load weights we first need to rebuild an empty model of
//   exactly the same shape (vocab size, d_model, classes...).
//
// File layout under the output root:
//   models/
//     transformer/
//       h2t/
//         model.mpk.gz
//         manifest.json
//         tokenizer.json
//         metrics.csv
//     lstm/
//       t2h.mpk.gz
//       t2h.json
//       t2h.metrics.csv
//
// Burn's CompactRecorder:
//   - Serialises model parameters to MessagePack format
//   - Compresses with gzip for smaller file size
//   - Type-safe: loading fails if architecture doesn't match
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::application::train_use_case::{ModelKind, TrainConfig};
use crate::data::vocab::Vocabulary;
use crate::domain::label_map::LabelMap;
use crate::ml::{lstm::BiLstmClassifierConfig, model::TransformerClassifierConfig};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const WEIGHTS_STEM: &str = "model";
pub const WEIGHTS_EXTENSION: &str = "mpk.gz";

// ─── ModelManifest ────────────────────────────────────────────────────────────
/// Everything needed to rebuild a trained classifier before loading its weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub kind:        ModelKind,
    pub labels:      LabelMap,
    pub train:       TrainConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformer: Option<TransformerClassifierConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lstm:        Option<BiLstmClassifierConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocab:       Option<Vocabulary>,
}

/// A saved model found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavedModel {
    /// Directory holding weights, manifest and tokenizer
    Transformer { dir: PathBuf },
    /// Weights path without extension; manifest is `<base>.json`
    Lstm { base: PathBuf },
}

// ─── ModelStore ───────────────────────────────────────────────────────────────
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn transformer_dir(&self, name: &str) -> PathBuf {
        self.root.join(ModelKind::Transformer.as_str()).join(name)
    }

    /// `<root>/lstm/<name>`; the recorder appends `.mpk.gz`.
    pub fn lstm_base(&self, name: &str) -> PathBuf {
        self.root.join(ModelKind::Lstm.as_str()).join(name)
    }

    pub fn metrics_csv(&self, kind: ModelKind, name: &str) -> PathBuf {
        match kind {
            ModelKind::Transformer => self.transformer_dir(name).join("metrics.csv"),
            ModelKind::Lstm => self.root.join(kind.as_str()).join(format!("{name}.metrics.csv")),
        }
    }

    /// Record `model` at `base` (extension added by the recorder).
    pub fn save_record<B: Backend, M: Module<B>>(&self, model: &M, base: &Path) -> Result<PathBuf> {
        if let Some(parent) = base.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        CompactRecorder::new()
            .record(model.clone().into_record(), base.to_path_buf())
            .with_context(|| format!("Failed to save model weights to '{}'", base.display()))?;

        let path = with_weights_extension(base);
        tracing::debug!("Saved weights: '{}'", path.display());
        Ok(path)
    }

    /// Load weights recorded at `base` into a freshly initialised `model`.
    ///
    /// The model must have the same architecture as the recorded one.
    pub fn load_record<B: Backend, M: Module<B>>(
        &self,
        model:  M,
        base:   &Path,
        device: &B::Device,
    ) -> Result<M> {
        let record = CompactRecorder::new()
            .load(base.to_path_buf(), device)
            .with_context(|| {
                format!("Cannot load model weights '{}'", with_weights_extension(base).display())
            })?;
        Ok(model.load_record(record))
    }
}

/// Decide whether `path` names a transformer directory or a BiLSTM model.
///
/// Accepts a transformer directory, or a BiLSTM path given as the base
/// name, the `.mpk.gz` weights file or the `.json` manifest.
pub fn locate(path: &Path) -> Result<SavedModel> {
    if path.is_dir() && path.join(MANIFEST_FILE).is_file() {
        return Ok(SavedModel::Transformer { dir: path.to_path_buf() });
    }

    let text = path.to_string_lossy();
    let base = text
        .strip_suffix(".mpk.gz")
        .or_else(|| text.strip_suffix(".json"))
        .map(PathBuf::from)
        .unwrap_or_else(|| path.to_path_buf());

    if lstm_manifest_path(&base).is_file() {
        return Ok(SavedModel::Lstm { base });
    }
    bail!(
        "No saved model at '{}': expected a transformer directory with {MANIFEST_FILE} \
         or a BiLSTM model with a '.json' manifest",
        path.display()
    )
}

pub fn lstm_manifest_path(base: &Path) -> PathBuf {
    append_extension(base, "json")
}

pub fn with_weights_extension(base: &Path) -> PathBuf {
    append_extension(base, WEIGHTS_EXTENSION)
}

fn append_extension(base: &Path, ext: &str) -> PathBuf {
    let mut s = base.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

/// Write `value` as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Cannot write '{}'", path.display()))?;
    tracing::debug!("Wrote '{}'", path.display());
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'. Have you trained the model first?", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Malformed JSON in '{}'", path.display()))
}
