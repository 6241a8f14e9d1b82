// ============================================================
// Layer 5 — Transformer Pipeline
// ============================================================
// Fits, scores, saves and reloads the transformer classifier.
//
//   clean text ──SubwordEncoder──▶ TransformerSample
//              ──TransformerBatcher──▶ TransformerBatch
//              ──TransformerClassifier──▶ logits
//
// Optimiser: AdamW (weight decay 0.01) with a linear warmup
// over the first 10% of steps, then linear decay to zero.
//
// With `init_from`, training starts from a saved transformer:
// its tokenizer, architecture and encoder weights are reused
// and only the classification head is freshly initialised, so
// the new run may have a different label set.
//
// Reference: Burn Book §5 (Training)
//            Devlin et al. (2019) BERT fine-tuning recipe

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burn::{
    data::dataset::Dataset,
    module::AutodiffModule,
    optim::AdamWConfig,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::{ModelKind, TrainConfig};
use crate::data::{
    batcher::TransformerBatcher,
    dataset::ClassificationDataset,
    encoder::SubwordEncoder,
};
use crate::domain::{
    example::LabeledExample,
    label_map::LabelMap,
    metrics::{EpochReport, MetricsRecord},
    traits::TextClassifier,
};
use crate::infra::{
    checkpoint::{read_json, write_json, ModelManifest, ModelStore, MANIFEST_FILE, WEIGHTS_STEM},
    metrics::MetricsLogger,
    tokenizer_store::{load_or_build, TokenizerStore},
};
use crate::ml::{
    model::{TransformerClassifier, TransformerClassifierConfig},
    schedule::LrSchedule,
    trainer::{evaluate, fit, predict_indices, FitOptions},
};

const WEIGHT_DECAY: f32 = 0.01;

/// A trained transformer on inference backend `B`.
pub struct FittedTransformer<B: Backend> {
    model:        TransformerClassifier<B>,
    encoder:      SubwordEncoder,
    labels:       LabelMap,
    model_config: TransformerClassifierConfig,
    train_config: TrainConfig,
    history:      Vec<EpochReport>,
    device:       B::Device,
}

/// Train a transformer on `train`, validating on `valid` each epoch.
pub fn fit_transformer<B: AutodiffBackend>(
    cfg:         &TrainConfig,
    train:       &[LabeledExample],
    valid:       &[LabeledExample],
    labels:      LabelMap,
    device:      B::Device,
    metrics_csv: Option<&Path>,
) -> Result<FittedTransformer<B::InnerBackend>> {
    // ── Encoder + model, fresh or warm-started ────────────────────────────────
    let (encoder, model_config, model) = match cfg.init_from.as_deref() {
        Some(dir) => {
            if cfg.tokenizer.is_some() {
                tracing::warn!("Ignoring --tokenizer: '{}' brings its own", dir.display());
            }
            warm_start::<B>(dir, labels.len(), &device)?
        }
        None => {
            let texts: Vec<String> = train.iter().map(|e| e.clean_text.clone()).collect();
            let tokenizer = load_or_build(cfg.tokenizer.as_deref(), &texts, cfg.tokenizer_vocab)?;
            let encoder = SubwordEncoder::new(tokenizer, cfg.transformer_max_len());
            let model_config = TransformerClassifierConfig::new(encoder.vocab_size(), encoder.max_len(), labels.len())
                .with_d_model(cfg.d_model)
                .with_num_heads(cfg.num_heads)
                .with_num_layers(cfg.num_layers)
                .with_d_ff(cfg.d_ff)
                .with_dropout(cfg.dropout);
            let model: TransformerClassifier<B> = model_config.init(&device);
            (encoder, model_config, model)
        }
    };
    tracing::info!(
        "Transformer ready: {} layers, d_model={}, vocab={}, classes={}",
        model_config.num_layers, model_config.d_model, model_config.vocab_size, labels.len()
    );

    let train_ds = ClassificationDataset::new(encoder.encode(train, &labels)?);
    let valid_ds = ClassificationDataset::new(encoder.encode(valid, &labels)?);

    // ── AdamW + warmup schedule ───────────────────────────────────────────────
    let optim = AdamWConfig::new().with_weight_decay(WEIGHT_DECAY).init();
    let total_steps = FitOptions::steps_per_epoch(train_ds.len(), cfg.batch_size) * cfg.epochs;
    let opts = FitOptions {
        epochs:      cfg.epochs,
        batch_size:  cfg.batch_size,
        num_classes: labels.len(),
        seed:        cfg.seed,
        schedule:    LrSchedule::linear_warmup(cfg.lr, total_steps),
    };

    let logger = metrics_csv.map(MetricsLogger::create).transpose()?;
    let (model, history) = fit(
        model,
        optim,
        TransformerBatcher::<B>::new(device.clone()),
        TransformerBatcher::<B::InnerBackend>::new(device.clone()),
        train_ds,
        valid_ds,
        &opts,
        logger.as_ref(),
    )?;

    Ok(FittedTransformer {
        model: model.valid(),
        encoder,
        labels,
        model_config,
        train_config: cfg.clone(),
        history,
        device,
    })
}

/// Reuse a saved transformer's tokenizer and encoder weights under a new
/// head for `num_classes`.
fn warm_start<B: Backend>(
    dir:         &Path,
    num_classes: usize,
    device:      &B::Device,
) -> Result<(SubwordEncoder, TransformerClassifierConfig, TransformerClassifier<B>)> {
    let manifest: ModelManifest = read_json(&dir.join(MANIFEST_FILE))?;
    let saved = manifest
        .transformer
        .with_context(|| format!("Cannot initialise from '{}': not a transformer", dir.display()))?;

    let encoder = SubwordEncoder::new(TokenizerStore::new(dir).load()?, saved.max_seq_len);
    let mut model = ModelStore::new(dir).load_record(saved.init::<B>(device), &dir.join(WEIGHTS_STEM), device)?;

    let model_config = TransformerClassifierConfig { num_classes, ..saved };
    model.classifier = model_config.init_head(device);
    tracing::info!(
        "Initialised from '{}' ({} -> {} classes)",
        dir.display(),
        manifest.labels.len(),
        num_classes
    );
    Ok((encoder, model_config, model))
}

impl<B: Backend> FittedTransformer<B> {
    /// Rebuild a saved transformer from its directory.
    pub fn load(dir: &Path, device: B::Device) -> Result<Self> {
        let manifest: ModelManifest = read_json(&dir.join(MANIFEST_FILE))?;
        let model_config = manifest
            .transformer
            .with_context(|| format!("'{}' is not a transformer manifest", dir.display()))?;

        let tokenizer = TokenizerStore::new(dir).load()?;
        let encoder = SubwordEncoder::new(tokenizer, model_config.max_seq_len);

        let store = ModelStore::new(dir);
        let model = store.load_record(model_config.init::<B>(&device), &dir.join(WEIGHTS_STEM), &device)?;
        tracing::info!("Transformer loaded from '{}'", dir.display());

        Ok(Self {
            model,
            encoder,
            labels: manifest.labels,
            model_config,
            train_config: manifest.train,
            history: Vec::new(),
            device,
        })
    }

    fn batcher(&self) -> TransformerBatcher<B> {
        TransformerBatcher::new(self.device.clone())
    }
}

impl<B: Backend> TextClassifier for FittedTransformer<B> {
    fn kind(&self) -> &'static str {
        ModelKind::Transformer.as_str()
    }

    fn labels(&self) -> &LabelMap {
        &self.labels
    }

    fn history(&self) -> &[EpochReport] {
        &self.history
    }

    fn evaluate(&self, examples: &[LabeledExample]) -> Result<MetricsRecord> {
        let samples = self.encoder.encode(examples, &self.labels)?;
        evaluate(
            &self.model,
            self.batcher(),
            samples,
            self.train_config.batch_size,
            self.labels.len(),
        )
    }

    fn predict(&self, clean_texts: &[String]) -> Result<Vec<String>> {
        let samples = self.encoder.encode_texts(clean_texts)?;
        predict_indices(&self.model, self.batcher(), samples, self.train_config.batch_size)
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
        let dir = store.transformer_dir(name);

        store.save_record(&self.model, &dir.join(WEIGHTS_STEM))?;
        TokenizerStore::new(&dir).save(self.encoder.tokenizer())?;
        write_json(
            &dir.join(MANIFEST_FILE),
            &ModelManifest {
                kind:        ModelKind::Transformer,
                labels:      self.labels.clone(),
                train:       self.train_config.clone(),
                transformer: Some(self.model_config.clone()),
                lstm:        None,
                vocab:       None,
            },
        )?;
        Ok(dir)
    }
}
