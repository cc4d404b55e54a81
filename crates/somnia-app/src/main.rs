//! Somnia - sleep-stage classification from EEG/EMG recordings
//!
//! Single-shot offline run over the fixed dataset layout: per-channel
//! signal CSVs in a storage root, labels, and a sample file supplying the
//! output ids.
//!
//! # Usage
//!
//! ```bash
//! # Full run with the default SVM
//! somnia --data-dir ./data
//!
//! # Quick smoke test over the first 10 epochs per file
//! somnia --data-dir ./data --smoke-test
//!
//! # Reuse the standardized matrices dumped by a previous run
//! somnia --data-dir ./data --reuse-features --classifier grid-search-svm
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use somnia_pipeline::{
    BoostParams, ClassifierKind, GridParams, PipelineConfig, SvmParams,
};

/// Somnia sleep-staging pipeline
#[derive(Parser, Debug)]
#[command(name = "somnia")]
#[command(author, version, about = "Sleep-stage classification from EEG/EMG epochs", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Directory holding the dataset CSVs; outputs land next to them
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Load only the first few epochs per file for a quick check
    #[arg(long)]
    smoke_test: bool,

    /// Epoch cap applied in smoke-test mode
    #[arg(long, default_value = "10")]
    smoke_rows: usize,

    /// Reload standardized feature matrices from a previous run instead
    /// of recomputing them from the raw signals
    #[arg(long)]
    reuse_features: bool,

    /// Classifier strategy
    #[arg(long, value_enum, default_value = "svm")]
    classifier: ClassifierArg,

    /// SVM penalty term
    #[arg(long, default_value = "10.0")]
    svm_c: f64,

    /// SVM kernel bandwidth
    #[arg(long, default_value = "0.001")]
    svm_gamma: f64,

    /// Cross-validation fold count
    #[arg(long, default_value = "5")]
    cv_folds: usize,

    /// AdaBoost rounds
    #[arg(long, default_value = "60")]
    n_estimators: usize,

    /// AdaBoost learning rate
    #[arg(long, default_value = "0.8")]
    learning_rate: f64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ClassifierArg {
    /// RBF support-vector classifier
    Svm,
    /// SAMME boosting over shallow trees
    AdaBoost,
    /// SVM with hyperparameter grid search
    GridSearchSvm,
}

impl From<ClassifierArg> for ClassifierKind {
    fn from(arg: ClassifierArg) -> Self {
        match arg {
            ClassifierArg::Svm => ClassifierKind::Svm,
            ClassifierArg::AdaBoost => ClassifierKind::AdaBoost,
            ClassifierArg::GridSearchSvm => ClassifierKind::GridSearchSvm,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Somnia v{}", env!("CARGO_PKG_VERSION"));

    let config = PipelineConfig {
        storage_root: cli.data_dir,
        recompute_features: !cli.reuse_features,
        smoke_test: cli.smoke_test,
        smoke_rows: cli.smoke_rows,
        classifier: cli.classifier.into(),
        svm: SvmParams {
            c: cli.svm_c,
            gamma: cli.svm_gamma,
        },
        boost: BoostParams {
            n_estimators: cli.n_estimators,
            learning_rate: cli.learning_rate,
            ..BoostParams::default()
        },
        grid: GridParams::default(),
        cv_folds: cli.cv_folds,
    };

    let summary = somnia_pipeline::run(&config)?;

    info!(
        train_epochs = summary.train_epochs,
        test_epochs = summary.test_epochs,
        feature_columns = summary.feature_columns,
        predictions = summary.predictions,
        "run complete"
    );
    if !summary.cv_scores.is_empty() {
        let mean = summary.cv_scores.iter().sum::<f64>() / summary.cv_scores.len() as f64;
        info!(scores = ?summary.cv_scores, mean, "cross-validation micro-F1");
    }

    Ok(())
}
