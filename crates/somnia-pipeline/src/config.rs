//! Pipeline configuration
//!
//! One immutable struct passed into the pipeline entry point. Everything
//! the original workflow toggled in-source (feature recomputation, reduced
//! smoke-test loading, storage root, classifier choice, hyperparameters)
//! is an explicit field here.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which classifier strategy to train.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifierKind {
    /// RBF-kernel C-SVC with balanced class weights
    Svm,
    /// SAMME boosting over shallow decision trees
    AdaBoost,
    /// SVM with exhaustive hyperparameter search by cross-validation
    GridSearchSvm,
}

/// Hyperparameters for the RBF support-vector classifier.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SvmParams {
    /// Penalty term for misclassification
    pub c: f64,
    /// RBF kernel bandwidth
    pub gamma: f64,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 10.0,
            gamma: 0.001,
        }
    }
}

/// Hyperparameters for the AdaBoost classifier.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BoostParams {
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to each estimator's weight
    pub learning_rate: f64,
    /// Depth limit of the decision-tree weak learners
    pub max_depth: usize,
}

impl Default for BoostParams {
    fn default() -> Self {
        Self {
            n_estimators: 60,
            learning_rate: 0.8,
            max_depth: 2,
        }
    }
}

/// Search grid for [`ClassifierKind::GridSearchSvm`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridParams {
    /// Candidate penalty terms
    pub c_grid: Vec<f64>,
    /// Candidate kernel bandwidths
    pub gamma_grid: Vec<f64>,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            c_grid: vec![10.0, 20.0, 25.0, 30.0],
            gamma_grid: vec![0.001, 0.005, 0.01],
        }
    }
}

/// Full configuration for one pipeline run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the input CSVs; outputs are written next to them
    pub storage_root: PathBuf,
    /// Recompute features from raw signals instead of reloading the
    /// standardized matrices dumped by a previous run
    pub recompute_features: bool,
    /// Load only the first [`PipelineConfig::smoke_rows`] epochs per file
    pub smoke_test: bool,
    /// Row cap applied in smoke-test mode
    pub smoke_rows: usize,
    /// Classifier strategy
    pub classifier: ClassifierKind,
    /// SVM hyperparameters (also the base for grid search)
    pub svm: SvmParams,
    /// AdaBoost hyperparameters
    pub boost: BoostParams,
    /// Grid-search candidates
    pub grid: GridParams,
    /// Cross-validation fold count
    pub cv_folds: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("."),
            recompute_features: true,
            smoke_test: false,
            smoke_rows: 10,
            classifier: ClassifierKind::Svm,
            svm: SvmParams::default(),
            boost: BoostParams::default(),
            grid: GridParams::default(),
            cv_folds: 5,
        }
    }
}

impl PipelineConfig {
    /// Row limit implied by the smoke-test flag.
    #[inline]
    #[must_use]
    pub fn row_limit(&self) -> Option<usize> {
        self.smoke_test.then_some(self.smoke_rows)
    }
}
