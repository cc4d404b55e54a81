//! Grid-searched SVM
//!
//! Exhaustive search over the (C, gamma) grid by stratified
//! cross-validation, refitting the best combination on the full training
//! set. Candidate order is fixed, and a tie keeps the earlier candidate,
//! so the search is deterministic.

use ndarray::Array2;
use tracing::info;

use crate::config::{GridParams, SvmParams};
use crate::error::{MlError, MlResult};
use crate::ml::svm::RbfSvc;
use crate::ml::validation::cross_val_score;
use crate::ml::Classifier;

/// SVM wrapped in hyperparameter grid search.
pub struct GridSearchSvc {
    grid: GridParams,
    cv_folds: usize,
    best: Option<(SvmParams, f64)>,
    model: Option<RbfSvc>,
}

impl GridSearchSvc {
    /// Create an unfitted grid search over the given candidates.
    #[must_use]
    pub fn new(grid: GridParams, cv_folds: usize) -> Self {
        Self {
            grid,
            cv_folds,
            best: None,
            model: None,
        }
    }

    /// Best (params, mean cross-validation score) found by `fit`.
    #[must_use]
    pub fn best(&self) -> Option<(SvmParams, f64)> {
        self.best
    }
}

impl Classifier for GridSearchSvc {
    fn fit(&mut self, x: &Array2<f64>, y: &[i64]) -> MlResult<()> {
        if self.grid.c_grid.is_empty() || self.grid.gamma_grid.is_empty() {
            return Err(MlError::InvalidParameter {
                name: "grid",
                reason: "both C and gamma grids need at least one candidate".to_string(),
            });
        }

        let mut best: Option<(SvmParams, f64)> = None;
        for &c in &self.grid.c_grid {
            for &gamma in &self.grid.gamma_grid {
                let params = SvmParams { c, gamma };
                let scores = cross_val_score(
                    &|| Box::new(RbfSvc::new(params)) as Box<dyn Classifier>,
                    x,
                    y,
                    self.cv_folds,
                )?;
                let mean = scores.iter().sum::<f64>() / scores.len() as f64;
                info!(c, gamma, mean_score = mean, "grid candidate scored");

                if best.map_or(true, |(_, best_mean)| mean > best_mean) {
                    best = Some((params, mean));
                }
            }
        }

        let (params, score) = best.ok_or(MlError::EmptyTrainingSet)?;
        info!(
            c = params.c,
            gamma = params.gamma,
            score,
            "refitting best grid candidate on all data"
        );

        let mut model = RbfSvc::new(params);
        model.fit(x, y)?;
        self.best = Some((params, score));
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> MlResult<Vec<i64>> {
        self.model.as_ref().ok_or(MlError::NotFitted)?.predict(x)
    }
}
