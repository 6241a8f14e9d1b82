// ============================================================
// Layer 2 — Shared Pipeline Steps
// ============================================================
// The steps every workflow (train, cross-eval, sweep, predict)
// has in common:
//
//   load_examples   → read, normalise, drop empty rows
//   prepare_corpus  → stratified split + label map
//   fit_model       → pick architecture × backend, train
//   load_model      → pick architecture × backend, restore
//
// The backend is chosen here, once, from the resolved
// ComputeDevice:
//
//   ComputeDevice::Cpu      → Autodiff<NdArray>
//   ComputeDevice::Gpu(dev) → Autodiff<Wgpu> on `dev`
//
// Callers only ever see `Box<dyn TextClassifier>`.

use std::path::Path;

use anyhow::{ensure, Result};
use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray, Wgpu};

use crate::application::train_use_case::{ModelKind, TrainConfig};
use crate::data::{
    loader::{DatasetLoader, DatasetSpec},
    splitter::stratified_split,
};
use crate::domain::{
    example::{drop_empty, LabeledExample},
    label_map::LabelMap,
    traits::{ExampleSource, TextClassifier},
};
use crate::infra::{
    checkpoint::{locate, SavedModel},
    device::ComputeDevice,
};
use crate::ml::{
    lstm_pipeline::{fit_lstm, FittedLstm},
    transformer_pipeline::{fit_transformer, FittedTransformer},
};

/// Train/validation rows plus the label space learned from training.
#[derive(Debug, Clone)]
pub struct PreparedCorpus {
    pub train:  Vec<LabeledExample>,
    pub valid:  Vec<LabeledExample>,
    pub labels: LabelMap,
}

/// Load and normalise a dataset, keeping only rows with clean text.
pub fn load_examples(spec: &DatasetSpec, workers: Option<usize>) -> Result<Vec<LabeledExample>> {
    let loader = DatasetLoader::new(spec.clone(), workers);
    let examples = drop_empty(loader.load_all()?);
    ensure!(!examples.is_empty(), "Dataset '{}' has no rows left after cleaning", spec.name);
    Ok(examples)
}

/// Split `examples` and derive the label map from the training part.
pub fn prepare_corpus(
    examples:       Vec<LabeledExample>,
    valid_fraction: f64,
    seed:           u64,
) -> Result<PreparedCorpus> {
    ensure!(
        (0.0..1.0).contains(&valid_fraction),
        "Validation fraction must be in [0, 1), got {valid_fraction}"
    );

    let (train, valid) = stratified_split(examples, |e| e.label.clone(), valid_fraction, seed);
    ensure!(!train.is_empty(), "Training split is empty");

    let labels = LabelMap::from_examples(&train);
    ensure!(
        labels.len() >= 2,
        "Need at least two labels to train a classifier, found {:?}",
        labels.names()
    );
    Ok(PreparedCorpus { train, valid, labels })
}

/// Train the model described by `cfg` on the device.
pub fn fit_model(
    cfg:         &TrainConfig,
    corpus:      &PreparedCorpus,
    device:      &ComputeDevice,
    metrics_csv: Option<&Path>,
) -> Result<Box<dyn TextClassifier>> {
    ensure!(
        cfg.init_from.is_none() || cfg.model == ModelKind::Transformer,
        "--init-from needs a saved transformer and only applies to --model transformer"
    );
    let PreparedCorpus { train, valid, labels } = corpus;
    let labels = labels.clone();

    let model: Box<dyn TextClassifier> = match (cfg.model, device) {
        (ModelKind::Transformer, ComputeDevice::Cpu) => Box::new(fit_transformer::<Autodiff<NdArray>>(
            cfg, train, valid, labels, NdArrayDevice::Cpu, metrics_csv,
        )?),
        (ModelKind::Transformer, ComputeDevice::Gpu(dev)) => Box::new(fit_transformer::<Autodiff<Wgpu>>(
            cfg, train, valid, labels, dev.clone(), metrics_csv,
        )?),
        (ModelKind::Lstm, ComputeDevice::Cpu) => Box::new(fit_lstm::<Autodiff<NdArray>>(
            cfg, train, valid, labels, NdArrayDevice::Cpu, metrics_csv,
        )?),
        (ModelKind::Lstm, ComputeDevice::Gpu(dev)) => Box::new(fit_lstm::<Autodiff<Wgpu>>(
            cfg, train, valid, labels, dev.clone(), metrics_csv,
        )?),
    };
    Ok(model)
}

/// Restore a saved model from a transformer directory or a BiLSTM path.
pub fn load_model(path: &Path, device: &ComputeDevice) -> Result<Box<dyn TextClassifier>> {
    let model: Box<dyn TextClassifier> = match (locate(path)?, device) {
        (SavedModel::Transformer { dir }, ComputeDevice::Cpu) => {
            Box::new(FittedTransformer::<NdArray>::load(&dir, NdArrayDevice::Cpu)?)
        }
        (SavedModel::Transformer { dir }, ComputeDevice::Gpu(dev)) => {
            Box::new(FittedTransformer::<Wgpu>::load(&dir, dev.clone())?)
        }
        (SavedModel::Lstm { base }, ComputeDevice::Cpu) => {
            Box::new(FittedLstm::<NdArray>::load(&base, NdArrayDevice::Cpu)?)
        }
        (SavedModel::Lstm { base }, ComputeDevice::Gpu(dev)) => {
            Box::new(FittedLstm::<Wgpu>::load(&base, dev.clone())?)
        }
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn rows(n: usize) -> Vec<LabeledExample> {
        (0..n)
            .map(|i| {
                let label = if i % 4 == 0 { "1" } else { "0" };
                LabeledExample::new(format!("text {i}"), label).with_clean_text(format!("text {i}"))
            })
            .collect()
    }

    #[test]
    fn test_prepare_corpus_labels_from_train() {
        let corpus = prepare_corpus(rows(40), 0.1, 42).unwrap();
        assert_eq!(corpus.train.len() + corpus.valid.len(), 40);
        assert_eq!(corpus.labels.names(), &["0".to_string(), "1".to_string()]);
    }

    #[test]
    fn test_prepare_corpus_rejects_single_label() {
        let only_zero: Vec<_> = rows(40).into_iter().filter(|e| e.label == "0").collect();
        assert!(prepare_corpus(only_zero, 0.1, 42).is_err());
        assert!(prepare_corpus(rows(10), 1.0, 42).is_err());
    }

    #[test]
    fn test_singleton_label_stays_in_training() {
        let mut examples = rows(8);
        examples.push(LabeledExample::new("lone", "2").with_clean_text("lone"));

        let corpus = prepare_corpus(examples, 0.5, 42).unwrap();
        assert_eq!(corpus.labels.len(), 3);
        assert!(corpus.valid.iter().all(|e| corpus.labels.index_of(&e.label).is_some()));
    }

    #[test]
    fn test_load_examples_drops_empty_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.jsonl");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, r#"{{"headline": "Dogs barking loudly", "is_sarcastic": 1}}"#).unwrap();
        writeln!(f, r#"{{"headline": "the of and", "is_sarcastic": 0}}"#).unwrap();

        let spec = DatasetSpec::new(&path, "headline", "is_sarcastic");
        let examples = load_examples(&spec, Some(1)).unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].label, "1");
    }

    #[test]
    fn test_fit_and_reload_on_cpu() {
        let corpus = prepare_corpus(rows(24), 0.25, 7).unwrap();
        let cfg = TrainConfig {
            epochs:     1,
            batch_size: 8,
            min_freq:   1,
            ..TrainConfig::for_model(ModelKind::Lstm).fast()
        };
        let model = fit_model(&cfg, &corpus, &ComputeDevice::Cpu, None).unwrap();
        assert_eq!(model.kind(), "lstm");

        let dir = tempfile::tempdir().unwrap();
        let saved = model.save(dir.path(), "demo").unwrap();
        let loaded = load_model(&saved, &ComputeDevice::Cpu).unwrap();
        assert_eq!(loaded.labels(), model.labels());
        assert!(load_model(&dir.path().join("missing"), &ComputeDevice::Cpu).is_err());
    }
}
