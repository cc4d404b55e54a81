//! Cross-validation
//!
//! Stratified k-fold with deterministic fold assignment: samples of each
//! class are dealt round-robin across folds in input order, so repeated
//! runs score identically.

use std::collections::BTreeMap;

use ndarray::{Array2, Axis};
use tracing::{debug, warn};

use crate::error::{MlError, MlResult};
use crate::ml::metrics::f1_micro;
use crate::ml::Classifier;

/// Build stratified fold test-index sets.
///
/// Folds that end up empty (more folds than members of every class) are
/// dropped with a warning rather than scored as zero.
///
/// # Errors
///
/// [`MlError::InvalidParameter`] for fewer than 2 folds or more folds
/// than samples; [`MlError::EmptyTrainingSet`] for empty labels.
pub fn stratified_kfold(labels: &[i64], folds: usize) -> MlResult<Vec<Vec<usize>>> {
    if labels.is_empty() {
        return Err(MlError::EmptyTrainingSet);
    }
    if folds < 2 {
        return Err(MlError::InvalidParameter {
            name: "cv_folds",
            reason: format!("need at least 2 folds, got {folds}"),
        });
    }
    if folds > labels.len() {
        return Err(MlError::InvalidParameter {
            name: "cv_folds",
            reason: format!("{folds} folds but only {} samples", labels.len()),
        });
    }

    let mut assigned: Vec<Vec<usize>> = vec![Vec::new(); folds];
    let mut next_fold: BTreeMap<i64, usize> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        let fold = next_fold.entry(label).or_insert(0);
        assigned[*fold % folds].push(i);
        *fold += 1;
    }

    let populated: Vec<Vec<usize>> = assigned.into_iter().filter(|f| !f.is_empty()).collect();
    if populated.len() < folds {
        warn!(
            requested = folds,
            populated = populated.len(),
            "some folds were empty and were dropped; class counts are \
             smaller than the fold count"
        );
    }
    Ok(populated)
}

/// Score a classifier by stratified k-fold cross-validation.
///
/// `make` builds a fresh, unfitted classifier per fold. Returns one
/// micro-F1 score per populated fold.
///
/// # Errors
///
/// Propagates fold-construction and per-fold fit/predict failures.
pub fn cross_val_score(
    make: &dyn Fn() -> Box<dyn Classifier>,
    x: &Array2<f64>,
    y: &[i64],
    folds: usize,
) -> MlResult<Vec<f64>> {
    if x.nrows() != y.len() {
        return Err(MlError::LabelCountMismatch {
            rows: x.nrows(),
            labels: y.len(),
        });
    }

    let fold_sets = stratified_kfold(y, folds)?;
    let mut scores = Vec::with_capacity(fold_sets.len());

    for (fold, test_indices) in fold_sets.iter().enumerate() {
        let train_indices: Vec<usize> =
            (0..y.len()).filter(|i| !test_indices.contains(i)).collect();

        let x_train = x.select(Axis(0), &train_indices);
        let y_train: Vec<i64> = train_indices.iter().map(|&i| y[i]).collect();
        let x_test = x.select(Axis(0), test_indices);
        let y_test: Vec<i64> = test_indices.iter().map(|&i| y[i]).collect();

        let mut model = make();
        model.fit(&x_train, &y_train)?;
        let predictions = model.predict(&x_test)?;

        let score = f1_micro(&y_test, &predictions);
        debug!(fold, score, test_size = y_test.len(), "fold scored");
        scores.push(score);
    }

    Ok(scores)
}
