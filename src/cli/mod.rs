// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Four commands are supported:
//   1. `train`      — fit one model on one dataset and save it
//   2. `cross-eval` — fit on dataset A, score on dataset B
//   3. `sweep`      — grid search, best config by validation F1
//   4. `predict`    — label texts with a saved model
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, CrossEvalArgs, PredictArgs, SweepArgs, TrainArgs};

use crate::application::train_use_case::TrainConfig;
use crate::domain::metrics::MetricsRecord;
use crate::infra::device::select_device;

#[derive(Parser, Debug)]
#[command(
    name = "sarcasm-bench",
    version,
    about = "Train, cross-evaluate and tune sarcasm classifiers (transformer and BiLSTM)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::CrossEval(args) => run_cross_eval(args),
            Commands::Sweep(args)     => run_sweep(args),
            Commands::Predict(args)   => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let dataset = args.run.dataset(&args.dataset)?;
    let name = args.name.clone().unwrap_or_else(|| dataset.name.clone());
    let config = TrainConfig::from(&args.run);
    let device = select_device(args.run.device.into());

    tracing::info!("Training {} on {} as '{}'", config.model, dataset, name);
    let outcome = TrainUseCase::new(config, device).execute(&dataset, &name)?;

    print_metrics("Validation", outcome.validation.as_ref());
    println!("Model saved to {}", outcome.saved_to.display());
    Ok(())
}

fn run_cross_eval(args: CrossEvalArgs) -> Result<()> {
    use crate::application::cross_eval_use_case::CrossEvalUseCase;

    let train_on = args.run.dataset(&args.train_on)?;
    let eval_on = args.run.dataset(&args.eval_on)?;
    let config = TrainConfig::from(&args.run);
    let device = select_device(args.run.device.into());

    let outcome = CrossEvalUseCase::new(config, device).execute(&train_on, &eval_on, &args.name)?;

    print_metrics("Validation", outcome.validation.as_ref());
    for (label, count) in &outcome.dropped {
        println!("Dropped {count} rows with unseen label '{label}'");
    }
    println!("[Cross-Eval {}] {} rows, {}", args.name, outcome.evaluated, outcome.metrics.summary());
    println!("Model saved to {}", outcome.saved_to.display());
    Ok(())
}

fn run_sweep(args: SweepArgs) -> Result<()> {
    use crate::application::sweep_use_case::SweepUseCase;

    let dataset = args.run.dataset(&args.dataset)?;
    let config = TrainConfig::from(&args.run);
    let device = select_device(args.run.device.into());

    let use_case = SweepUseCase::new(config, args.grid(), device);
    let report = use_case.execute(&dataset)?;

    match report.best_trial() {
        Some(best) => println!(
            "Best {} config: lr={}, batch_size={}, epochs={}, max_len={:?} → f1={:.4}, acc={:.4}",
            report.model, best.lr, best.batch_size, best.epochs, best.max_len, best.metrics.f1, best.metrics.accuracy
        ),
        None => println!("No configuration was evaluated"),
    }
    println!("Sweep report written to {}", use_case.report_path().display());
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let device = select_device(args.device.into());
    let use_case = PredictUseCase::new(&args.model_path, &device)?;
    for p in use_case.predict(&args.texts)? {
        println!("{}\t{}", p.label, p.text);
    }
    Ok(())
}

fn print_metrics(split: &str, metrics: Option<&MetricsRecord>) {
    match metrics {
        Some(m) => println!("{split} → {}", m.summary()),
        None => println!("{split} → no epochs were run"),
    }
}
