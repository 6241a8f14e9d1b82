// ============================================================
// Layer 2 — SweepUseCase
// ============================================================
// Exhaustive grid search over training hyperparameters:
//
//   for lr in lrs
//     for batch_size in batch_sizes
//       for epochs in epochs
//         for max_len in max_lens
//           fit a fresh model, score validation F1
//
// The dataset is loaded and split once; every trial trains
// from scratch on the same split. The best trial is the one
// with strictly greater F1 than all earlier ones, so the
// first trial seen wins a tie.
//
// Reference: Rust Book §13 (Iterators and Closures)

use std::path::PathBuf;

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::application::{
    pipeline::{fit_model, load_examples, prepare_corpus},
    train_use_case::{ModelKind, TrainConfig},
};
use crate::data::loader::DatasetSpec;
use crate::domain::metrics::MetricsRecord;
use crate::infra::{checkpoint::write_json, device::ComputeDevice};

// ─── SweepGrid ────────────────────────────────────────────────────────────────
/// Candidate values per hyperparameter. An empty list means "use the base config value".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepGrid {
    pub lrs:         Vec<f64>,
    pub batch_sizes: Vec<usize>,
    pub epochs:      Vec<usize>,
    pub max_lens:    Vec<Option<usize>>,
}

impl SweepGrid {
    /// The grid searched when none is given on the command line.
    pub fn default_for(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Transformer => Self {
                lrs:         vec![2e-5, 3e-5],
                batch_sizes: vec![16, 32],
                epochs:      vec![2, 3],
                max_lens:    vec![Some(64), Some(128)],
            },
            ModelKind::Lstm => Self {
                lrs:         vec![1e-3],
                batch_sizes: vec![64],
                epochs:      vec![2],
                max_lens:    vec![None],
            },
        }
    }

    /// One config per grid point, in lr × batch size × epochs × max_len order.
    pub fn configs(&self, base: &TrainConfig) -> Vec<TrainConfig> {
        let lrs         = or_base(&self.lrs, base.lr);
        let batch_sizes = or_base(&self.batch_sizes, base.batch_size);
        let epochs      = or_base(&self.epochs, base.epochs);
        let max_lens    = or_base(&self.max_lens, base.max_len);

        let mut out = Vec::with_capacity(lrs.len() * batch_sizes.len() * epochs.len() * max_lens.len());
        for &lr in &lrs {
            for &batch_size in &batch_sizes {
                for &n_epochs in &epochs {
                    for &max_len in &max_lens {
                        out.push(TrainConfig { lr, batch_size, epochs: n_epochs, max_len, ..base.clone() });
                    }
                }
            }
        }
        out
    }
}

fn or_base<T: Copy>(values: &[T], base: T) -> Vec<T> {
    if values.is_empty() { vec![base] } else { values.to_vec() }
}

// ─── Trials ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepTrial {
    pub lr:         f64,
    pub batch_size: usize,
    pub epochs:     usize,
    pub max_len:    Option<usize>,
    pub metrics:    MetricsRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub model:  ModelKind,
    pub trials: Vec<SweepTrial>,
    /// Index into `trials` of the best F1
    pub best:   Option<usize>,
}

impl SweepReport {
    pub fn best_trial(&self) -> Option<&SweepTrial> {
        self.best.and_then(|i| self.trials.get(i))
    }
}

/// Score every config with `score`, keeping the first strictly-best F1.
pub fn run_grid<F>(configs: &[TrainConfig], mut score: F) -> Result<(Vec<SweepTrial>, Option<usize>)>
where
    F: FnMut(&TrainConfig) -> Result<MetricsRecord>,
{
    let mut trials = Vec::with_capacity(configs.len());
    let mut best: Option<(usize, f64)> = None;

    for (i, cfg) in configs.iter().enumerate() {
        let metrics = score(cfg)?;
        println!(
            "===> lr={}, bs={}, ep={}, max_len={} → f1={:.4}",
            cfg.lr,
            cfg.batch_size,
            cfg.epochs,
            cfg.max_len.map_or_else(|| "none".to_string(), |n| n.to_string()),
            metrics.f1
        );

        if best.map_or(true, |(_, f1)| metrics.f1 > f1) {
            best = Some((i, metrics.f1));
        }
        trials.push(SweepTrial {
            lr:         cfg.lr,
            batch_size: cfg.batch_size,
            epochs:     cfg.epochs,
            max_len:    cfg.max_len,
            metrics,
        });
    }
    Ok((trials, best.map(|(i, _)| i)))
}

// ─── SweepUseCase ─────────────────────────────────────────────────────────────
pub struct SweepUseCase {
    base:   TrainConfig,
    grid:   SweepGrid,
    device: ComputeDevice,
}

impl SweepUseCase {
    pub fn new(base: TrainConfig, grid: SweepGrid, device: ComputeDevice) -> Self {
        Self { base, grid, device }
    }

    pub fn report_path(&self) -> PathBuf {
        self.base.output_dir.join(format!("sweep-{}.json", self.base.model))
    }

    pub fn execute(&self, dataset: &DatasetSpec) -> Result<SweepReport> {
        let configs = self.grid.configs(&self.base);
        ensure!(!configs.is_empty(), "Sweep grid is empty");
        tracing::info!("Sweeping {} {} configurations on {}", configs.len(), self.base.model, dataset.name);

        let examples = load_examples(dataset, self.base.workers)?;
        let corpus = prepare_corpus(examples, self.base.valid_fraction, self.base.seed)?;

        let (trials, best) = run_grid(&configs, |cfg| {
            let model = fit_model(cfg, &corpus, &self.device, None)?;
            Ok(model.final_validation().unwrap_or_else(MetricsRecord::empty))
        })?;

        let report = SweepReport { model: self.base.model, trials, best };
        if let Some(trial) = report.best_trial() {
            tracing::info!(
                "Best config: lr={}, bs={}, ep={}, max_len={:?}, {}",
                trial.lr, trial.batch_size, trial.epochs, trial.max_len, trial.metrics.summary()
            );
        }
        write_json(&self.report_path(), &report)?;
        Ok(report)
    }
}
