// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands: `train`, `cross-eval`, `sweep`
// and `predict`, and all their configurable flags.
//
// Hyperparameter flags are optional: anything left unset takes
// the default of the chosen model kind (transformer or lstm),
// so `--model lstm` alone gives lr 1e-3, batch 32, 5 epochs.
//
// Datasets are given as a preset name (headlines, tweets,
// tweets-test, tweets-binary, tweets-test-binary) resolved
// against --data-dir, or as `path,text_field,label_field[,positive]`.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};

use crate::application::{
    sweep_use_case::SweepGrid,
    train_use_case::{ModelKind, TrainConfig},
};
use crate::data::loader::DatasetSpec;
use crate::infra::device::DevicePreference;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train one model on one dataset and save it
    Train(TrainArgs),

    /// Train on one dataset, evaluate on another
    CrossEval(CrossEvalArgs),

    /// Grid-search learning rate, batch size, epochs and max length
    Sweep(SweepArgs),

    /// Label texts with a saved model
    Predict(PredictArgs),
}

// ─── Shared flags ─────────────────────────────────────────────────────────────
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelArg {
    Transformer,
    Lstm,
}

impl From<ModelArg> for ModelKind {
    fn from(m: ModelArg) -> Self {
        match m {
            ModelArg::Transformer => ModelKind::Transformer,
            ModelArg::Lstm => ModelKind::Lstm,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceArg {
    /// GPU unless CUDA_VISIBLE_DEVICES hides every device
    Auto,
    Cpu,
    Gpu,
}

impl From<DeviceArg> for DevicePreference {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Auto => DevicePreference::Auto,
            DeviceArg::Cpu => DevicePreference::Cpu,
            DeviceArg::Gpu => DevicePreference::Gpu,
        }
    }
}

/// Flags shared by every command that trains a model.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Which architecture to train
    #[arg(long, value_enum, default_value_t = ModelArg::Transformer)]
    pub model: ModelArg,

    /// Compute device
    #[arg(long, value_enum, default_value_t = DeviceArg::Auto)]
    pub device: DeviceArg,

    /// Root directory for saved models, metrics and sweep reports
    #[arg(long, default_value = "models")]
    pub output_dir: PathBuf,

    /// Directory holding the preset dataset files
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Smaller BiLSTM (embed 64, hidden 64, dropout 0.1)
    #[arg(long)]
    pub fast: bool,

    /// Threads used to normalise text (default: all cores)
    #[arg(long)]
    pub workers: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Share of each label held out for validation
    #[arg(long)]
    pub valid_fraction: Option<f64>,

    #[arg(long)]
    pub lr: Option<f64>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub epochs: Option<usize>,

    /// Transformer: padded sequence length. BiLSTM: truncation length.
    #[arg(long)]
    pub max_len: Option<usize>,

    #[arg(long)]
    pub dropout: Option<f64>,

    /// Transformer hidden size; must be divisible by --num-heads
    #[arg(long)]
    pub d_model: Option<usize>,

    #[arg(long)]
    pub num_heads: Option<usize>,

    #[arg(long)]
    pub num_layers: Option<usize>,

    /// Feed-forward inner size, typically 4x d_model
    #[arg(long)]
    pub d_ff: Option<usize>,

    /// Pretrained tokenizer.json (default: train a WordPiece tokenizer)
    #[arg(long)]
    pub tokenizer: Option<PathBuf>,

    /// Saved transformer directory whose encoder weights and tokenizer start training
    #[arg(long)]
    pub init_from: Option<PathBuf>,

    /// Vocabulary size of a built tokenizer
    #[arg(long)]
    pub tokenizer_vocab: Option<usize>,

    #[arg(long)]
    pub embed_dim: Option<usize>,

    #[arg(long)]
    pub hidden_size: Option<usize>,

    /// Minimum token count for the BiLSTM vocabulary
    #[arg(long)]
    pub min_freq: Option<usize>,
}

impl RunArgs {
    pub fn dataset(&self, spec: &str) -> Result<DatasetSpec> {
        Ok(spec.parse::<DatasetSpec>()?.resolve(&self.data_dir))
    }
}

/// Convert CLI RunArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2:
/// the application layer never sees clap types.
impl From<&RunArgs> for TrainConfig {
    fn from(a: &RunArgs) -> Self {
        let mut cfg = TrainConfig::for_model(a.model.into());
        if a.fast {
            cfg = cfg.fast();
        }
        cfg.output_dir = a.output_dir.clone();
        cfg.workers = a.workers;

        macro_rules! take {
            ($($field:ident),*) => {
                $( if let Some(v) = a.$field.clone() { cfg.$field = v; } )*
            };
        }
        take!(
            seed, valid_fraction, lr, batch_size, epochs, dropout, d_model, num_heads,
            num_layers, d_ff, tokenizer_vocab, embed_dim, hidden_size, min_freq
        );
        if a.max_len.is_some() {
            cfg.max_len = a.max_len;
        }
        if a.tokenizer.is_some() {
            cfg.tokenizer = a.tokenizer.clone();
        }
        if a.init_from.is_some() {
            cfg.init_from = a.init_from.clone();
        }
        cfg
    }
}

// ─── Subcommand arguments ─────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Dataset preset or `path,text_field,label_field[,positive]`
    #[arg(long, default_value = "headlines")]
    pub dataset: String,

    /// Name the model is saved under (default: the dataset name)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct CrossEvalArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Dataset to train on
    #[arg(long, default_value = "headlines")]
    pub train_on: String,

    /// Dataset to evaluate on; labels unseen in training are dropped
    #[arg(long, default_value = "tweets-test-binary")]
    pub eval_on: String,

    /// Run name the trained model is saved under
    #[arg(long, default_value = "h2t")]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    #[command(flatten)]
    pub run: RunArgs,

    #[arg(long, default_value = "headlines")]
    pub dataset: String,

    /// Learning rates to try, comma separated
    #[arg(long, value_delimiter = ',')]
    pub lrs: Vec<f64>,

    #[arg(long, value_delimiter = ',')]
    pub batch_sizes: Vec<usize>,

    /// Epoch counts to try
    #[arg(long = "epoch-grid", value_delimiter = ',')]
    pub epoch_grid: Vec<usize>,

    #[arg(long, value_delimiter = ',')]
    pub max_lens: Vec<usize>,
}

impl SweepArgs {
    /// Built-in grid for the model kind when no grid flag is given.
    pub fn grid(&self) -> SweepGrid {
        if self.lrs.is_empty()
            && self.batch_sizes.is_empty()
            && self.epoch_grid.is_empty()
            && self.max_lens.is_empty()
        {
            return SweepGrid::default_for(self.run.model.into());
        }
        SweepGrid {
            lrs:         self.lrs.clone(),
            batch_sizes: self.batch_sizes.clone(),
            epochs:      self.epoch_grid.clone(),
            max_lens:    self.max_lens.iter().copied().map(Some).collect(),
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Transformer model directory, or BiLSTM `.mpk.gz` / `.json` / base path
    #[arg(long)]
    pub model_path: PathBuf,

    #[arg(long, value_enum, default_value_t = DeviceArg::Auto)]
    pub device: DeviceArg,

    /// Texts to label
    #[arg(required = true)]
    pub texts: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn test_unset_flags_take_model_defaults() {
        let Commands::Train(args) = parse(&["sarcasm-bench", "train", "--model", "lstm", "--epochs", "7"]) else {
            panic!("expected train");
        };
        let cfg = TrainConfig::from(&args.run);
        assert_eq!(cfg.model, ModelKind::Lstm);
        assert_eq!(cfg.epochs, 7);
        assert_eq!(cfg.lr, 1e-3);
        assert_eq!(cfg.max_len, None);
    }

    #[test]
    fn test_fast_and_overrides() {
        let Commands::Train(args) =
            parse(&["sarcasm-bench", "train", "--model", "lstm", "--fast", "--hidden-size", "32"])
        else {
            panic!("expected train");
        };
        let cfg = TrainConfig::from(&args.run);
        assert_eq!((cfg.embed_dim, cfg.hidden_size), (64, 32));
    }

    #[test]
    fn test_dataset_presets_resolve_against_data_dir() {
        let Commands::CrossEval(args) = parse(&["sarcasm-bench", "cross-eval", "--data-dir", "/srv/data"]) else {
            panic!("expected cross-eval");
        };
        let eval = args.run.dataset(&args.eval_on).unwrap();
        assert_eq!(eval.path, PathBuf::from("/srv/data/test.csv"));
        assert_eq!(eval.positive.as_deref(), Some("sarcasm"));
        assert!(args.run.dataset("nope").is_err());
    }

    #[test]
    fn test_sweep_grid_flags() {
        let Commands::Sweep(args) =
            parse(&["sarcasm-bench", "sweep", "--lrs", "1e-3,5e-4", "--max-lens", "32,64"])
        else {
            panic!("expected sweep");
        };
        let grid = args.grid();
        assert_eq!(grid.lrs, vec![1e-3, 5e-4]);
        assert_eq!(grid.max_lens, vec![Some(32), Some(64)]);
        assert!(grid.batch_sizes.is_empty());

        let Commands::Sweep(args) = parse(&["sarcasm-bench", "sweep"]) else {
            panic!("expected sweep");
        };
        assert_eq!(args.grid(), SweepGrid::default_for(ModelKind::Transformer));
    }

    #[test]
    fn test_init_from_flag() {
        let Commands::Train(args) =
            parse(&["sarcasm-bench", "train", "--init-from", "models/transformer/headlines"])
        else {
            panic!("expected train");
        };
        let cfg = TrainConfig::from(&args.run);
        assert_eq!(cfg.init_from, Some(PathBuf::from("models/transformer/headlines")));
        assert_eq!(cfg.tokenizer, None);
    }

    #[test]
    fn test_predict_requires_texts() {
        assert!(Cli::try_parse_from(["sarcasm-bench", "predict", "--model-path", "m"]).is_err());
    }
}
