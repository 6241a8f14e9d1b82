// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Trains one classifier on one dataset and saves it:
//
//   Step 1: Load + normalise the dataset     (Layer 4 - data)
//   Step 2: Drop rows with empty clean text  (Layer 3 - domain)
//   Step 3: Stratified train/valid split     (Layer 4 - data)
//   Step 4: Build label map from train split (Layer 3 - domain)
//   Step 5: Fit the model on the device      (Layer 5 - ml)
//   Step 6: Save weights + manifest          (Layer 6 - infra)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use std::{fmt, path::PathBuf, str::FromStr};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::application::pipeline::{fit_model, load_examples, prepare_corpus};
use crate::data::{
    loader::DatasetSpec,
    splitter::{DEFAULT_SEED, DEFAULT_VALID_FRACTION},
    vocab::DEFAULT_MIN_FREQ,
};
use crate::domain::metrics::MetricsRecord;
use crate::infra::{checkpoint::ModelStore, device::ComputeDevice};

// ─── ModelKind ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Transformer,
    Lstm,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transformer => "transformer",
            Self::Lstm => "lstm",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "transformer" => Ok(Self::Transformer),
            "lstm" => Ok(Self::Lstm),
            other => bail!("unknown model kind '{other}' (expected 'transformer' or 'lstm')"),
        }
    }
}

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it is stored in the model manifest.
// Architecture fields of the other model kind are carried but unused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub model:          ModelKind,
    pub output_dir:     PathBuf,
    pub lr:             f64,
    pub batch_size:     usize,
    pub epochs:         usize,
    /// Transformer: padded length incl. [CLS]/[SEP]. BiLSTM: optional truncation.
    pub max_len:        Option<usize>,
    pub seed:           u64,
    pub valid_fraction: f64,
    /// Loader worker threads; None = all cores
    pub workers:        Option<usize>,
    pub dropout:        f64,

    // ── Transformer ──
    pub d_model:         usize,
    pub num_heads:       usize,
    pub num_layers:      usize,
    pub d_ff:            usize,
    /// Pretrained tokenizer.json; None = train a WordPiece tokenizer
    pub tokenizer:       Option<PathBuf>,
    pub tokenizer_vocab: usize,
    /// Saved transformer directory to start from (encoder weights + tokenizer)
    #[serde(default)]
    pub init_from:       Option<PathBuf>,

    // ── BiLSTM ──
    pub embed_dim:   usize,
    pub hidden_size: usize,
    pub min_freq:    usize,
}

pub const DEFAULT_TRANSFORMER_MAX_LEN: usize = 64;

impl TrainConfig {
    /// Defaults for `kind`.
    pub fn for_model(kind: ModelKind) -> Self {
        let base = Self {
            model:           kind,
            output_dir:      PathBuf::from("models"),
            lr:              2e-5,
            batch_size:      16,
            epochs:          3,
            max_len:         Some(DEFAULT_TRANSFORMER_MAX_LEN),
            seed:            DEFAULT_SEED,
            valid_fraction:  DEFAULT_VALID_FRACTION,
            workers:         None,
            dropout:         0.1,
            d_model:         256,
            num_heads:       8,
            num_layers:      4,
            d_ff:            1024,
            tokenizer:       None,
            tokenizer_vocab: 30_000,
            init_from:       None,
            embed_dim:       128,
            hidden_size:     128,
            min_freq:        DEFAULT_MIN_FREQ,
        };
        match kind {
            ModelKind::Transformer => base,
            ModelKind::Lstm => Self {
                lr:         1e-3,
                batch_size: 32,
                epochs:     5,
                max_len:    None,
                dropout:    0.3,
                ..base
            },
        }
    }

    /// Smaller BiLSTM used for quick runs.
    pub fn fast(mut self) -> Self {
        self.embed_dim   = 64;
        self.hidden_size = 64;
        self.dropout     = 0.1;
        self
    }

    pub fn transformer_max_len(&self) -> usize {
        self.max_len.unwrap_or(DEFAULT_TRANSFORMER_MAX_LEN)
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self::for_model(ModelKind::Transformer)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
/// What a finished training run produced.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub saved_to:   PathBuf,
    pub validation: Option<MetricsRecord>,
}

pub struct TrainUseCase {
    config: TrainConfig,
    device: ComputeDevice,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig, device: ComputeDevice) -> Self {
        Self { config, device }
    }

    /// Train on `dataset` and save the model as `name`.
    pub fn execute(&self, dataset: &DatasetSpec, name: &str) -> Result<TrainOutcome> {
        let cfg = &self.config;

        // ── Steps 1-2: Load, normalise, drop empty rows ───────────────────────
        let examples = load_examples(dataset, cfg.workers)?;

        // ── Steps 3-4: Split and build the label space ────────────────────────
        let corpus = prepare_corpus(examples, cfg.valid_fraction, cfg.seed)?;
        tracing::info!(
            "Split: {} train, {} validation, labels {:?}",
            corpus.train.len(),
            corpus.valid.len(),
            corpus.labels.names()
        );

        // ── Step 5: Fit ───────────────────────────────────────────────────────
        let store = ModelStore::new(&cfg.output_dir);
        let metrics_csv = store.metrics_csv(cfg.model, name);
        let model = fit_model(cfg, &corpus, &self.device, Some(&metrics_csv))?;

        // ── Step 6: Save ──────────────────────────────────────────────────────
        let saved_to = model.save(store.root(), name)?;
        tracing::info!("Saved {} model to '{}'", model.kind(), saved_to.display());

        Ok(TrainOutcome { saved_to, validation: model.final_validation() })
    }
}
