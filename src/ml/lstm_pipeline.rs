// ============================================================
// Layer 5 — BiLSTM Pipeline
// ============================================================
// Fits, scores, saves and reloads the recurrent classifier.
//
//   clean text ──Vocabulary──▶ SequenceSample
//              ──SequenceBatcher──▶ SequenceBatch (padded per batch)
//              ──BiLstmClassifier──▶ logits
//
// Optimiser: Adam at a constant learning rate.
// The vocabulary is built from the training split only and is
// stored inside the manifest, so a saved model is one
// `.mpk.gz` weights file plus one `.json` manifest.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burn::{
    data::dataset::Dataset,
    module::AutodiffModule,
    optim::AdamConfig,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::{ModelKind, TrainConfig};
use crate::data::{
    batcher::SequenceBatcher,
    dataset::ClassificationDataset,
    encoder::WordEncoder,
    vocab::Vocabulary,
};
use crate::domain::{
    example::LabeledExample,
    label_map::LabelMap,
    metrics::{EpochReport, MetricsRecord},
    traits::TextClassifier,
};
use crate::infra::{
    checkpoint::{lstm_manifest_path, read_json, write_json, ModelManifest, ModelStore},
    metrics::MetricsLogger,
};
use crate::ml::{
    lstm::{BiLstmClassifier, BiLstmClassifierConfig},
    schedule::LrSchedule,
    trainer::{evaluate, fit, predict_indices, FitOptions},
};

pub struct FittedLstm<B: Backend> {
    model:        BiLstmClassifier<B>,
    encoder:      WordEncoder,
    labels:       LabelMap,
    model_config: BiLstmClassifierConfig,
    train_config: TrainConfig,
    history:      Vec<EpochReport>,
    device:       B::Device,
}

/// Train a BiLSTM on `train`, validating on `valid` each epoch.
pub fn fit_lstm<B: AutodiffBackend>(
    cfg:         &TrainConfig,
    train:       &[LabeledExample],
    valid:       &[LabeledExample],
    labels:      LabelMap,
    device:      B::Device,
    metrics_csv: Option<&Path>,
) -> Result<FittedLstm<B::InnerBackend>> {
    let vocab = Vocabulary::build(train.iter().map(|e| e.clean_text.as_str()), cfg.min_freq);
    tracing::info!("Vocabulary: {} tokens (min_freq={})", vocab.len(), cfg.min_freq);
    let encoder = WordEncoder::new(vocab, cfg.max_len);

    let train_ds = ClassificationDataset::new(encoder.encode(train, &labels)?);
    let valid_ds = ClassificationDataset::new(encoder.encode(valid, &labels)?);

    let model_config = BiLstmClassifierConfig::new(encoder.vocab().len(), labels.len())
        .with_embed_dim(cfg.embed_dim)
        .with_hidden_size(cfg.hidden_size)
        .with_dropout(cfg.dropout);
    let model: BiLstmClassifier<B> = model_config.init(&device);

    let opts = FitOptions {
        epochs:      cfg.epochs,
        batch_size:  cfg.batch_size,
        num_classes: labels.len(),
        seed:        cfg.seed,
        schedule:    LrSchedule::Constant(cfg.lr),
    };
    tracing::info!(
        "BiLSTM ready: embed={}, hidden={}, {} steps/epoch",
        cfg.embed_dim,
        cfg.hidden_size,
        FitOptions::steps_per_epoch(train_ds.len(), cfg.batch_size)
    );

    let logger = metrics_csv.map(MetricsLogger::create).transpose()?;
    let (model, history) = fit(
        model,
        AdamConfig::new().init(),
        SequenceBatcher::<B>::new(device.clone()),
        SequenceBatcher::<B::InnerBackend>::new(device.clone()),
        train_ds,
        valid_ds,
        &opts,
        logger.as_ref(),
    )?;

    Ok(FittedLstm {
        model: model.valid(),
        encoder,
        labels,
        model_config,
        train_config: cfg.clone(),
        history,
        device,
    })
}

impl<B: Backend> FittedLstm<B> {
    /// Rebuild a saved BiLSTM from its weights base path (no extension).
    pub fn load(base: &Path, device: B::Device) -> Result<Self> {
        let manifest: ModelManifest = read_json(&lstm_manifest_path(base))?;
        let model_config = manifest
            .lstm
            .with_context(|| format!("'{}' has no BiLSTM config", base.display()))?;
        let vocab = manifest
            .vocab
            .with_context(|| format!("'{}' has no vocabulary", base.display()))?;

        let store = ModelStore::new(base.parent().unwrap_or(Path::new(".")));
        let model = store.load_record(model_config.init::<B>(&device), base, &device)?;
        tracing::info!("BiLSTM loaded from '{}'", base.display());

        Ok(Self {
            model,
            encoder: WordEncoder::new(vocab, manifest.train.max_len),
            labels: manifest.labels,
            model_config,
            train_config: manifest.train,
            history: Vec::new(),
            device,
        })
    }
}

impl<B: Backend> TextClassifier for FittedLstm<B> {
    fn kind(&self) -> &'static str {
        ModelKind::Lstm.as_str()
    }

    fn labels(&self) -> &LabelMap {
        &self.labels
    }

    fn history(&self) -> &[EpochReport] {
        &self.history
    }

    fn evaluate(&self, examples: &[LabeledExample]) -> Result<MetricsRecord> {
        evaluate(
            &self.model,
            SequenceBatcher::<B>::new(self.device.clone()),
            self.encoder.encode(examples, &self.labels)?,
            self.train_config.batch_size,
            self.labels.len(),
        )
    }

    fn predict(&self, clean_texts: &[String]) -> Result<Vec<String>> {
        let indices = predict_indices(
            &self.model,
            SequenceBatcher::<B>::new(self.device.clone()),
            self.encoder.encode_texts(clean_texts),
            self.train_config.batch_size,
        );
        indices
            .into_iter()
            .map(|i| {
                self.labels
                    .name_of(i)
                    .map(str::to_string)
                    .with_context(|| format!("Predicted class {i} has no label"))
            })
            .collect()
    }

    fn save(&self, root: &Path, name: &str) -> Result<PathBuf> {
        let store = ModelStore::new(root);
        let base = store.lstm_base(name);

        let weights = store.save_record(&self.model, &base)?;
        write_json(
            &lstm_manifest_path(&base),
            &ModelManifest {
                kind:        ModelKind::Lstm,
                labels:      self.labels.clone(),
                train:       self.train_config.clone(),
                transformer: None,
                lstm:        Some(self.model_config.clone()),
                vocab:       Some(self.encoder.vocab().clone()),
            },
        )?;
        Ok(weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::infra::checkpoint::{locate, SavedModel};

    fn rows() -> Vec<LabeledExample> {
        (0..16)
            .map(|i| {
                let (text, label) = if i % 2 == 0 {
                    ("oh great another meeting", "1")
                } else {
                    ("city council approves park", "0")
                };
                LabeledExample::new(text, label).with_clean_text(text)
            })
            .collect()
    }

    #[test]
    fn test_fit_save_load_predict() {
        let data = rows();
        let cfg = TrainConfig {
            epochs:     2,
            batch_size: 4,
            ..TrainConfig::for_model(ModelKind::Lstm).fast()
        };
        let labels = LabelMap::from_examples(&data);
        let fitted =
            fit_lstm::<Autodiff<NdArray>>(&cfg, &data[..12], &data[12..], labels, Default::default(), None)
                .unwrap();
        assert_eq!(fitted.history().len(), 2);
        assert!(fitted.final_validation().is_some());

        let dir = tempfile::tempdir().unwrap();
        let weights = fitted.save(dir.path(), "t2h").unwrap();
        assert!(weights.to_string_lossy().ends_with("lstm/t2h.mpk.gz"));

        let SavedModel::Lstm { base } = locate(&weights).unwrap() else {
            panic!("expected a BiLSTM model");
        };
        let loaded = FittedLstm::<NdArray>::load(&base, Default::default()).unwrap();
        assert_eq!(loaded.labels(), fitted.labels());

        let texts = vec!["great meeting".to_string(), "unseen words only".to_string()];
        assert_eq!(loaded.predict(&texts).unwrap(), fitted.predict(&texts).unwrap());
    }

    #[test]
    fn test_evaluate_on_held_out_rows() {
        let data = rows();
        let cfg = TrainConfig { epochs: 1, batch_size: 8, ..TrainConfig::for_model(ModelKind::Lstm).fast() };
        let fitted = fit_lstm::<Autodiff<NdArray>>(
            &cfg,
            &data[..8],
            &data[8..],
            LabelMap::from_examples(&data),
            Default::default(),
            None,
        )
        .unwrap();
        let metrics = fitted.evaluate(&data[8..]).unwrap();
        assert!(metrics.loss.is_finite());
        assert!((0.0..=1.0).contains(&metrics.accuracy));
    }
}
