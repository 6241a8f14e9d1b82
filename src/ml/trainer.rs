// ============================================================
// Layer 5 — Training Loop
// ============================================================
// One train + validation loop shared by every architecture.
//
// The loop only needs three things from a model:
//   - it is an AutodiffModule, so `valid()` gives an
//     inference copy on the inner backend
//   - it maps a training batch to (logits, targets)
//   - its inner copy maps a validation batch the same way
//
// Per epoch:
//   training   → forward, cross entropy, backward, optimiser
//                step at the scheduled learning rate
//   validation → model.valid(), forward, cross entropy
//   both       → accumulate predicted vs. true class indices
//                and turn them into a MetricsRecord
//
// Key Burn insight:
//   - Training uses B (Autodiff<...>) for gradients
//   - model.valid() returns the model on B::InnerBackend
//   - The validation batcher must also use B::InnerBackend
//   - argmax(1) returns [batch,1] so we flatten before reading
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam
//            Loshchilov & Hutter (2019) AdamW

use std::fmt::Debug;

use anyhow::Result;
use burn::{
    data::{
        dataloader::{batcher::Batcher, DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use indicatif::{ProgressBar, ProgressStyle};

use crate::data::dataset::ClassificationDataset;
use crate::domain::metrics::{EpochReport, MetricsRecord};
use crate::infra::metrics::MetricsLogger;
use crate::ml::classifier::{ClassificationStep, SequenceClassifier};
use crate::ml::schedule::LrSchedule;

/// Loop settings that are independent of the architecture.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub epochs:      usize,
    pub batch_size:  usize,
    pub num_classes: usize,
    /// Shuffle seed for the training loader
    pub seed:        u64,
    pub schedule:    LrSchedule,
}

impl FitOptions {
    /// Optimiser steps in one epoch over `train_len` rows.
    pub fn steps_per_epoch(train_len: usize, batch_size: usize) -> usize {
        train_len.div_ceil(batch_size.max(1))
    }
}

/// Train `model` for `opts.epochs` epochs and return it with one report per epoch.
#[allow(clippy::too_many_arguments)]
pub fn fit<B, M, O, S, TB, VB, BT, BV>(
    mut model:     M,
    mut optim:     O,
    train_batcher: BT,
    valid_batcher: BV,
    train:         ClassificationDataset<S>,
    valid:         ClassificationDataset<S>,
    opts:          &FitOptions,
    logger:        Option<&MetricsLogger>,
) -> Result<(M, Vec<EpochReport>)>
where
    B:  AutodiffBackend,
    M:  AutodiffModule<B> + SequenceClassifier<B, TB>,
    M::InnerModule: SequenceClassifier<B::InnerBackend, VB>,
    O:  Optimizer<M, B>,
    S:  Clone + Debug + Send + Sync + 'static,
    TB: Clone + Debug + Send + Sync + 'static,
    VB: Clone + Debug + Send + Sync + 'static,
    BT: Batcher<S, TB> + 'static + Clone,
    BV: Batcher<S, VB> + 'static + Clone,
{
    let train_steps = FitOptions::steps_per_epoch(train.len(), opts.batch_size);
    let valid_steps = FitOptions::steps_per_epoch(valid.len(), opts.batch_size);

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::new(train_batcher)
        .batch_size(opts.batch_size)
        .shuffle(opts.seed)
        .num_workers(1)
        .build(train);

    // ── Validation data loader (InnerBackend, no autodiff) ──────────
    let valid_loader = DataLoaderBuilder::new(valid_batcher)
        .batch_size(opts.batch_size)
        .num_workers(1)
        .build(valid);

    if let Some(logger) = logger {
        tracing::info!("Epoch metrics → '{}'", logger.csv_path().display());
    }

    let mut reports = Vec::with_capacity(opts.epochs);
    let mut step = 0usize;

    for epoch in 1..=opts.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let bar = progress_bar(train_steps, format!("epoch {epoch}/{} train", opts.epochs))?;
        let mut acc = Accumulator::default();

        for batch in train_loader.iter() {
            let ClassificationStep { logits, targets } = model.classify(batch);
            let ce   = CrossEntropyLossConfig::new().init(&logits.device());
            let loss = ce.forward(logits.clone(), targets.clone());

            acc.add(loss.clone().into_scalar().elem::<f64>(), logits, targets);

            let lr    = opts.schedule.lr_at(step);
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);
            step += 1;
            bar.inc(1);
        }
        bar.finish_and_clear();
        let train_metrics = acc.finish(opts.num_classes);

        // ── Validation phase ──────────────────────────────────────────────────
        // dropout disabled for deterministic evaluation
        let model_valid = model.valid();
        let valid_metrics = evaluate_loader(
            &model_valid,
            valid_loader.as_ref(),
            valid_steps,
            opts.num_classes,
            format!("epoch {epoch}/{} valid", opts.epochs),
        )?;

        println!(
            "Epoch {:>3}/{} | train {} | valid {}",
            epoch, opts.epochs, train_metrics.summary(), valid_metrics.summary(),
        );
        tracing::info!(
            epoch,
            train_loss = train_metrics.loss,
            valid_loss = valid_metrics.loss,
            valid_f1   = valid_metrics.f1,
            "Epoch complete"
        );

        let report = EpochReport { epoch, train: train_metrics, valid: valid_metrics };
        if let Some(logger) = logger {
            logger.log(&report)?;
        }
        reports.push(report);
    }

    tracing::info!("Training complete!");
    Ok((model, reports))
}

/// Score an inference model over every batch of `loader`, in order.
pub fn evaluate_loader<B, M, I>(
    model:       &M,
    loader:      &dyn DataLoader<I>,
    steps:       usize,
    num_classes: usize,
    label:       String,
) -> Result<MetricsRecord>
where
    B: Backend,
    M: SequenceClassifier<B, I>,
{
    let bar = progress_bar(steps, label)?;
    let mut acc = Accumulator::default();

    for batch in loader.iter() {
        let ClassificationStep { logits, targets } = model.classify(batch);
        let ce   = CrossEntropyLossConfig::new().init(&logits.device());
        let loss = ce.forward(logits.clone(), targets.clone());
        acc.add(loss.into_scalar().elem::<f64>(), logits, targets);
        bar.inc(1);
    }
    bar.finish_and_clear();

    Ok(acc.finish(num_classes))
}

/// Build an in-order loader and score `samples` with an inference model.
pub fn evaluate<B, M, S, I, BI>(
    model:       &M,
    batcher:     BI,
    samples:     Vec<S>,
    batch_size:  usize,
    num_classes: usize,
) -> Result<MetricsRecord>
where
    B:  Backend,
    M:  SequenceClassifier<B, I>,
    S:  Clone + Debug + Send + Sync + 'static,
    I:  Clone + Debug + Send + Sync + 'static,
    BI: Batcher<S, I> + 'static + Clone,
{
    let steps  = FitOptions::steps_per_epoch(samples.len(), batch_size);
    let loader = DataLoaderBuilder::new(batcher)
        .batch_size(batch_size)
        .num_workers(1)
        .build(ClassificationDataset::new(samples));
    evaluate_loader(model, loader.as_ref(), steps, num_classes, "evaluate".to_string())
}

/// Predicted class index for every sample, in input order.
pub fn predict_indices<B, M, S, I, BI>(
    model:      &M,
    batcher:    BI,
    samples:    Vec<S>,
    batch_size: usize,
) -> Vec<usize>
where
    B:  Backend,
    M:  SequenceClassifier<B, I>,
    S:  Clone + Debug + Send + Sync + 'static,
    I:  Clone + Debug + Send + Sync + 'static,
    BI: Batcher<S, I> + 'static + Clone,
{
    let loader = DataLoaderBuilder::new(batcher)
        .batch_size(batch_size)
        .num_workers(1)
        .build(ClassificationDataset::new(samples));

    loader
        .iter()
        .flat_map(|batch| argmax_indices(model.classify(batch).logits))
        .collect()
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn argmax_indices<B: Backend>(logits: Tensor<B, 2>) -> Vec<usize> {
    // argmax(1) returns shape [batch, 1]; flatten to [batch]
    logits
        .argmax(1)
        .flatten::<1>(0, 1)
        .into_data()
        .iter::<i64>()
        .map(|i| i as usize)
        .collect()
}

fn index_vec<B: Backend>(t: Tensor<B, 1, Int>) -> Vec<usize> {
    t.into_data().iter::<i64>().map(|i| i as usize).collect()
}

/// Running loss and prediction totals for one pass over a loader.
#[derive(Default)]
struct Accumulator {
    loss_sum:    f64,
    batches:     usize,
    targets:     Vec<usize>,
    predictions: Vec<usize>,
}

impl Accumulator {
    fn add<B: Backend>(&mut self, loss: f64, logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) {
        self.loss_sum += loss;
        self.batches  += 1;
        self.predictions.extend(argmax_indices(logits));
        self.targets.extend(index_vec(targets));
    }

    fn finish(self, num_classes: usize) -> MetricsRecord {
        if self.batches == 0 {
            return MetricsRecord::empty();
        }
        MetricsRecord::from_predictions(
            self.loss_sum / self.batches as f64,
            &self.targets,
            &self.predictions,
            num_classes,
        )
    }
}

fn progress_bar(len: usize, message: String) -> Result<ProgressBar> {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg:>20} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );
    bar.set_message(message);
    Ok(bar)
}
