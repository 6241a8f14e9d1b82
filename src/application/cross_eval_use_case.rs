// ============================================================
// Layer 2 — CrossEvalUseCase
// ============================================================
// Train on dataset A, then score the model on dataset B:
//
//   Step 1: Load + split A, fit a fresh model      (train side)
//   Step 2: Save it under the run name (h2t, t2h)
//   Step 3: Load + normalise B                     (eval side)
//   Step 4: Keep only B rows whose label A knows   (order kept)
//   Step 5: Evaluate on the kept rows
//
// Rows with labels unseen in A are not an error. They are
// counted per label, returned in the outcome and logged as a
// warning so a label-space mismatch is visible.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{ensure, Result};

use crate::application::{
    pipeline::{fit_model, load_examples, prepare_corpus},
    train_use_case::TrainConfig,
};
use crate::data::loader::{label_distribution, DatasetSpec};
use crate::domain::{label_map::retain_known_labels, metrics::MetricsRecord};
use crate::infra::{checkpoint::ModelStore, device::ComputeDevice};

#[derive(Debug, Clone)]
pub struct CrossEvalOutcome {
    pub saved_to:   PathBuf,
    pub validation: Option<MetricsRecord>,
    /// Rows of the evaluation set that were scored
    pub evaluated:  usize,
    /// Unseen evaluation label → rows dropped
    pub dropped:    BTreeMap<String, usize>,
    pub metrics:    MetricsRecord,
}

pub struct CrossEvalUseCase {
    config: TrainConfig,
    device: ComputeDevice,
}

impl CrossEvalUseCase {
    pub fn new(config: TrainConfig, device: ComputeDevice) -> Self {
        Self { config, device }
    }

    pub fn execute(&self, train_on: &DatasetSpec, eval_on: &DatasetSpec, name: &str) -> Result<CrossEvalOutcome> {
        let cfg = &self.config;
        tracing::info!("Cross-evaluation '{}': train on {}, evaluate on {}", name, train_on.name, eval_on.name);

        // ── Steps 1-2: Fit on A and save ──────────────────────────────────────
        let corpus = prepare_corpus(load_examples(train_on, cfg.workers)?, cfg.valid_fraction, cfg.seed)?;
        let store = ModelStore::new(&cfg.output_dir);
        let metrics_csv = store.metrics_csv(cfg.model, name);
        let model = fit_model(cfg, &corpus, &self.device, Some(&metrics_csv))?;
        let saved_to = model.save(store.root(), name)?;
        tracing::info!("Saved {} model to '{}'", model.kind(), saved_to.display());

        // ── Steps 3-4: Load B and restrict to A's label space ─────────────────
        let eval_rows = load_examples(eval_on, cfg.workers)?;
        let filter = retain_known_labels(eval_rows, model.labels());
        if !filter.dropped.is_empty() {
            tracing::warn!(
                "Dropped {} of {} evaluation rows with labels unseen in training: {:?}",
                filter.dropped_total(),
                filter.dropped_total() + filter.kept.len(),
                filter.dropped
            );
        }
        ensure!(
            !filter.kept.is_empty(),
            "No rows of '{}' share a label with '{}' (training labels {:?})",
            eval_on.name,
            train_on.name,
            model.labels().names()
        );
        tracing::info!("Evaluation label distribution: {}", label_distribution(&filter.kept));

        // ── Step 5: Evaluate ──────────────────────────────────────────────────
        let metrics = model.evaluate(&filter.kept)?;
        tracing::info!("Cross-evaluation '{}': {}", name, metrics.summary());

        Ok(CrossEvalOutcome {
            saved_to,
            validation: model.final_validation(),
            evaluated: filter.kept.len(),
            dropped: filter.dropped,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::application::train_use_case::ModelKind;

    fn write_csv(path: &std::path::Path, rows: &[(&str, &str)]) {
        let mut f = std::fs::File::create(path).unwrap();
        writeln!(f, "tweets,class").unwrap();
        for (text, label) in rows {
            writeln!(f, "{text},{label}").unwrap();
        }
    }

    #[test]
    fn test_unseen_labels_are_dropped_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let train_path = dir.path().join("train.csv");
        let eval_path = dir.path().join("eval.csv");

        let mut train_rows = Vec::new();
        for _ in 0..10 {
            train_rows.push(("love waiting hours line", "sarcasm"));
            train_rows.push(("rain expected tomorrow", "regular"));
        }
        write_csv(&train_path, &train_rows);
        write_csv(
            &eval_path,
            &[
                ("love waiting line", "sarcasm"),
                ("sure great idea", "irony"),
                ("rain tomorrow", "regular"),
                ("clearly genius", "irony"),
                ("laughing crying", "figurative"),
            ],
        );

        let cfg = TrainConfig {
            epochs:     1,
            batch_size: 8,
            min_freq:   1,
            workers:    Some(1),
            output_dir: dir.path().join("models"),
            ..TrainConfig::for_model(ModelKind::Lstm).fast()
        };
        let outcome = CrossEvalUseCase::new(cfg, ComputeDevice::Cpu)
            .execute(
                &DatasetSpec::new(&train_path, "tweets", "class"),
                &DatasetSpec::new(&eval_path, "tweets", "class"),
                "t2t",
            )
            .unwrap();

        assert_eq!(outcome.evaluated, 2);
        assert_eq!(outcome.dropped.get("irony"), Some(&2));
        assert_eq!(outcome.dropped.get("figurative"), Some(&1));
        assert!(outcome.saved_to.exists());
        assert!((0.0..=1.0).contains(&outcome.metrics.accuracy));
    }
}
