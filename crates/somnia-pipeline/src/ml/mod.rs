//! Classification
//!
//! Standardization, the classifier strategies, and model selection:
//!
//! - [`scaler`]: per-column standardization
//! - [`svm`]: RBF C-SVC with one-vs-one voting
//! - [`adaboost`]: SAMME boosting over shallow trees
//! - [`grid`]: SVM with hyperparameter grid search
//! - [`validation`]: stratified k-fold cross-validation
//! - [`metrics`]: micro-averaged F1

use ndarray::Array2;

use crate::config::{ClassifierKind, PipelineConfig};
use crate::error::{MlError, MlResult};

pub mod adaboost;
pub mod grid;
pub mod metrics;
pub mod scaler;
pub mod svm;
pub mod validation;

pub use adaboost::AdaBoostClassifier;
pub use grid::GridSearchSvc;
pub use metrics::f1_micro;
pub use scaler::StandardScaler;
pub use svm::RbfSvc;
pub use validation::{cross_val_score, stratified_kfold};

/// A classifier strategy: fit on a labelled feature matrix, predict
/// labels for a new one.
pub trait Classifier {
    /// Train on the feature matrix and its positionally matched labels.
    ///
    /// # Errors
    ///
    /// Implementations reject empty or mismatched inputs and invalid
    /// hyperparameters.
    fn fit(&mut self, x: &Array2<f64>, y: &[i64]) -> MlResult<()>;

    /// Predict one label per row.
    ///
    /// # Errors
    ///
    /// Fails when called before `fit` or on a column-count mismatch.
    fn predict(&self, x: &Array2<f64>) -> MlResult<Vec<i64>>;
}

/// Build the classifier strategy selected by the configuration.
#[must_use]
pub fn build_classifier(config: &PipelineConfig) -> Box<dyn Classifier> {
    match config.classifier {
        ClassifierKind::Svm => Box::new(RbfSvc::new(config.svm)),
        ClassifierKind::AdaBoost => Box::new(AdaBoostClassifier::new(config.boost)),
        ClassifierKind::GridSearchSvm => {
            Box::new(GridSearchSvc::new(config.grid.clone(), config.cv_folds))
        }
    }
}

/// Shared fit-input validation: non-empty matrix, matching label count,
/// at least two classes. Returns the sorted distinct labels.
pub(crate) fn check_training_inputs(x: &Array2<f64>, y: &[i64]) -> MlResult<Vec<i64>> {
    if x.nrows() == 0 {
        return Err(MlError::EmptyTrainingSet);
    }
    if x.nrows() != y.len() {
        return Err(MlError::LabelCountMismatch {
            rows: x.nrows(),
            labels: y.len(),
        });
    }

    let mut classes: Vec<i64> = y.to_vec();
    classes.sort_unstable();
    classes.dedup();
    if classes.len() < 2 {
        return Err(MlError::SingleClass { label: classes[0] });
    }
    Ok(classes)
}
