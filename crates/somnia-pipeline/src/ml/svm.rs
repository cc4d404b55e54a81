//! RBF-kernel support-vector classifier
//!
//! C-SVC trained with sequential minimal optimization, one-vs-one voting
//! for multiclass problems, and balanced class weights: each sample's box
//! constraint is its class weight times the shared penalty term, so rare
//! stages are not drowned out by the majority class.

use ndarray::{Array2, ArrayView1};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::SvmParams;
use crate::error::{MlError, MlResult};
use crate::ml::{check_training_inputs, Classifier};

/// Consecutive full SMO sweeps without an update before declaring
/// convergence.
const CONVERGED_SWEEPS: usize = 3;
/// Hard cap on SMO sweeps per binary subproblem.
const MAX_SWEEPS: usize = 1000;
/// KKT violation tolerance.
const TOLERANCE: f64 = 1e-3;

/// RBF kernel: `exp(-gamma * ||a - b||^2)`.
fn rbf_kernel(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>, gamma: f64) -> f64 {
    let mut dist = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let d = x - y;
        dist += d * d;
    }
    (-gamma * dist).exp()
}

/// One binary one-vs-one subproblem after training.
struct PairwiseModel {
    /// Class voted for when the decision value is positive
    positive: i64,
    /// Class voted for otherwise
    negative: i64,
    /// Support-vector row indices into the stored training matrix
    rows: Vec<usize>,
    /// `alpha_i * y_i` per support vector
    alpha_y: Vec<f64>,
    bias: f64,
}

struct Fitted {
    train: Array2<f64>,
    classes: Vec<i64>,
    models: Vec<PairwiseModel>,
}

/// RBF C-SVC with one-vs-one multiclass voting.
pub struct RbfSvc {
    params: SvmParams,
    fitted: Option<Fitted>,
}

impl RbfSvc {
    /// Create an unfitted classifier with the given hyperparameters.
    #[must_use]
    pub fn new(params: SvmParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    /// Hyperparameters this classifier was built with.
    #[must_use]
    pub fn params(&self) -> SvmParams {
        self.params
    }

    fn check_params(&self) -> MlResult<()> {
        if self.params.c <= 0.0 {
            return Err(MlError::InvalidParameter {
                name: "c",
                reason: format!("penalty term must be positive, got {}", self.params.c),
            });
        }
        if self.params.gamma <= 0.0 {
            return Err(MlError::InvalidParameter {
                name: "gamma",
                reason: format!("kernel bandwidth must be positive, got {}", self.params.gamma),
            });
        }
        Ok(())
    }
}

impl Classifier for RbfSvc {
    fn fit(&mut self, x: &Array2<f64>, y: &[i64]) -> MlResult<()> {
        self.check_params()?;
        let classes = check_training_inputs(x, y)?;

        // Balanced class weights: n_samples / (n_classes * class_count).
        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for &label in y {
            *counts.entry(label).or_insert(0) += 1;
        }
        let n = y.len() as f64;
        let k = classes.len() as f64;
        let weight = |label: i64| n / (k * counts[&label] as f64);

        let mut models = Vec::new();
        for (i, &positive) in classes.iter().enumerate() {
            for &negative in &classes[i + 1..] {
                let rows: Vec<usize> = (0..y.len())
                    .filter(|&r| y[r] == positive || y[r] == negative)
                    .collect();
                let signs: Vec<f64> = rows
                    .iter()
                    .map(|&r| if y[r] == positive { 1.0 } else { -1.0 })
                    .collect();
                let caps: Vec<f64> = rows.iter().map(|&r| self.params.c * weight(y[r])).collect();

                let (alpha, bias, sweeps) = solve_smo(x, &rows, &signs, &caps, self.params.gamma);
                debug!(
                    positive,
                    negative,
                    support = alpha.iter().filter(|&&a| a > 1e-10).count(),
                    sweeps,
                    "trained pairwise subproblem"
                );

                let mut sv_rows = Vec::new();
                let mut alpha_y = Vec::new();
                for (local, &row) in rows.iter().enumerate() {
                    if alpha[local] > 1e-10 {
                        sv_rows.push(row);
                        alpha_y.push(alpha[local] * signs[local]);
                    }
                }

                models.push(PairwiseModel {
                    positive,
                    negative,
                    rows: sv_rows,
                    alpha_y,
                    bias,
                });
            }
        }

        self.fitted = Some(Fitted {
            train: x.clone(),
            classes,
            models,
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> MlResult<Vec<i64>> {
        let fitted = self.fitted.as_ref().ok_or(MlError::NotFitted)?;
        if x.ncols() != fitted.train.ncols() {
            return Err(MlError::ColumnMismatch {
                fitted: fitted.train.ncols(),
                got: x.ncols(),
            });
        }

        let mut predictions = Vec::with_capacity(x.nrows());
        for sample in x.rows() {
            let mut votes: BTreeMap<i64, usize> = BTreeMap::new();
            for model in &fitted.models {
                let mut decision = model.bias;
                for (&row, &ay) in model.rows.iter().zip(&model.alpha_y) {
                    decision += ay * rbf_kernel(fitted.train.row(row), sample, self.params.gamma);
                }
                let vote = if decision > 0.0 {
                    model.positive
                } else {
                    model.negative
                };
                *votes.entry(vote).or_insert(0) += 1;
            }

            // Most votes wins; ties go to the smallest class label because
            // classes iterate in sorted order.
            let mut best = fitted.classes[0];
            let mut best_votes = 0;
            for &class in &fitted.classes {
                let v = votes.get(&class).copied().unwrap_or(0);
                if v > best_votes {
                    best = class;
                    best_votes = v;
                }
            }
            predictions.push(best);
        }
        Ok(predictions)
    }
}

/// Sequential minimal optimization over one binary subproblem.
///
/// `rows` selects the participating training rows, `signs` their +/-1
/// labels, `caps` their per-sample box constraints. Returns the alpha
/// vector (local indexing), the bias, and the sweep count. The second
/// working-set index is chosen by maximum error difference, so the solve
/// is deterministic.
fn solve_smo(
    x: &Array2<f64>,
    rows: &[usize],
    signs: &[f64],
    caps: &[f64],
    gamma: f64,
) -> (Vec<f64>, f64, usize) {
    let n = rows.len();

    // The kernel matrix of a pairwise subproblem fits comfortably for the
    // epoch counts this pipeline sees; precomputing it keeps the inner
    // loops trivial.
    let mut kernel = vec![0.0; n * n];
    for a in 0..n {
        for b in a..n {
            let value = rbf_kernel(x.row(rows[a]), x.row(rows[b]), gamma);
            kernel[a * n + b] = value;
            kernel[b * n + a] = value;
        }
    }

    let mut alpha = vec![0.0; n];
    let mut bias = 0.0;

    let decision = |alpha: &[f64], bias: f64, i: usize| -> f64 {
        let mut sum = bias;
        for j in 0..n {
            if alpha[j] > 0.0 {
                sum += alpha[j] * signs[j] * kernel[i * n + j];
            }
        }
        sum
    };

    let mut quiet_sweeps = 0;
    let mut sweeps = 0;
    while quiet_sweeps < CONVERGED_SWEEPS && sweeps < MAX_SWEEPS {
        sweeps += 1;
        let mut changed = 0;

        for i in 0..n {
            let e_i = decision(&alpha, bias, i) - signs[i];
            let violates = (signs[i] * e_i < -TOLERANCE && alpha[i] < caps[i])
                || (signs[i] * e_i > TOLERANCE && alpha[i] > 0.0);
            if !violates {
                continue;
            }

            // Second index: maximize |E_i - E_j|.
            let mut j = usize::MAX;
            let mut best_gap = -1.0;
            for candidate in 0..n {
                if candidate == i {
                    continue;
                }
                let gap = (e_i - (decision(&alpha, bias, candidate) - signs[candidate])).abs();
                if gap > best_gap {
                    best_gap = gap;
                    j = candidate;
                }
            }
            if j == usize::MAX {
                continue;
            }
            let e_j = decision(&alpha, bias, j) - signs[j];

            let (alpha_i_old, alpha_j_old) = (alpha[i], alpha[j]);
            let (low, high) = if (signs[i] - signs[j]).abs() > f64::EPSILON {
                let diff = alpha_j_old - alpha_i_old;
                (diff.max(0.0), caps[j].min(caps[i] + diff))
            } else {
                let sum = alpha_i_old + alpha_j_old;
                ((sum - caps[i]).max(0.0), caps[j].min(sum))
            };
            if low >= high {
                continue;
            }

            let eta = 2.0 * kernel[i * n + j] - kernel[i * n + i] - kernel[j * n + j];
            if eta >= 0.0 {
                continue;
            }

            let mut alpha_j_new = alpha_j_old - signs[j] * (e_i - e_j) / eta;
            alpha_j_new = alpha_j_new.clamp(low, high);
            if (alpha_j_new - alpha_j_old).abs() < 1e-5 {
                continue;
            }
            let alpha_i_new = alpha_i_old + signs[i] * signs[j] * (alpha_j_old - alpha_j_new);

            alpha[i] = alpha_i_new;
            alpha[j] = alpha_j_new;

            let delta_i = alpha_i_new - alpha_i_old;
            let delta_j = alpha_j_new - alpha_j_old;
            let b1 = bias
                - e_i
                - signs[i] * delta_i * kernel[i * n + i]
                - signs[j] * delta_j * kernel[i * n + j];
            let b2 = bias
                - e_j
                - signs[i] * delta_i * kernel[i * n + j]
                - signs[j] * delta_j * kernel[j * n + j];
            bias = if alpha_i_new > 0.0 && alpha_i_new < caps[i] {
                b1
            } else if alpha_j_new > 0.0 && alpha_j_new < caps[j] {
                b2
            } else {
                (b1 + b2) / 2.0
            };

            changed += 1;
        }

        if changed == 0 {
            quiet_sweeps += 1;
        } else {
            quiet_sweeps = 0;
        }
    }

    if sweeps >= MAX_SWEEPS {
        warn!(sweeps, "SMO hit the sweep cap before converging");
    }
    (alpha, bias, sweeps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn blob(center: (f64, f64), count: usize, spread: f64) -> Vec<[f64; 2]> {
        (0..count)
            .map(|i| {
                let angle = i as f64 * 2.399963; // golden-angle spacing
                [
                    center.0 + spread * angle.cos() * (1.0 + i as f64 * 0.05),
                    center.1 + spread * angle.sin() * (1.0 + i as f64 * 0.05),
                ]
            })
            .collect()
    }

    fn to_matrix(points: &[[f64; 2]]) -> Array2<f64> {
        let mut m = Array2::zeros((points.len(), 2));
        for (i, p) in points.iter().enumerate() {
            m[[i, 0]] = p[0];
            m[[i, 1]] = p[1];
        }
        m
    }

    #[test]
    fn separates_two_blobs() {
        let mut points = blob((0.0, 0.0), 12, 0.4);
        points.extend(blob((6.0, 6.0), 12, 0.4));
        let x = to_matrix(&points);
        let y: Vec<i64> = (0..24).map(|i| if i < 12 { 1 } else { 2 }).collect();

        let mut svc = RbfSvc::new(SvmParams { c: 10.0, gamma: 0.5 });
        svc.fit(&x, &y).unwrap();
        assert_eq!(svc.predict(&x).unwrap(), y);
    }

    #[test]
    fn three_class_voting_produces_known_labels() {
        let mut points = blob((0.0, 0.0), 8, 0.3);
        points.extend(blob((6.0, 0.0), 8, 0.3));
        points.extend(blob((0.0, 6.0), 8, 0.3));
        let x = to_matrix(&points);
        let y: Vec<i64> = (0..24).map(|i| (i / 8) as i64 + 1).collect();

        let mut svc = RbfSvc::new(SvmParams { c: 10.0, gamma: 0.5 });
        svc.fit(&x, &y).unwrap();

        let predictions = svc.predict(&x).unwrap();
        assert_eq!(predictions.len(), 24);
        assert!(predictions.iter().all(|p| [1, 2, 3].contains(p)));
        assert_eq!(predictions, y);
    }

    #[test]
    fn prediction_count_matches_input_rows() {
        let mut points = blob((0.0, 0.0), 10, 0.4);
        points.extend(blob((6.0, 6.0), 10, 0.4));
        let x = to_matrix(&points);
        let y: Vec<i64> = (0..20).map(|i| if i < 10 { 1 } else { 2 }).collect();

        let mut svc = RbfSvc::new(SvmParams { c: 10.0, gamma: 0.5 });
        svc.fit(&x, &y).unwrap();

        let queries = to_matrix(&blob((3.0, 3.0), 10, 2.0));
        let predictions = svc.predict(&queries).unwrap();
        assert_eq!(predictions.len(), 10);
        assert!(predictions.iter().all(|p| [1, 2].contains(p)));
    }

    #[test]
    fn predict_before_fit_is_rejected() {
        let svc = RbfSvc::new(SvmParams::default());
        let err = svc.predict(&Array2::zeros((2, 2))).unwrap_err();
        assert!(matches!(err, MlError::NotFitted));
    }

    #[test]
    fn single_class_training_is_rejected() {
        let x = to_matrix(&blob((0.0, 0.0), 6, 0.3));
        let mut svc = RbfSvc::new(SvmParams::default());
        let err = svc.fit(&x, &[4; 6]).unwrap_err();
        assert!(matches!(err, MlError::SingleClass { label: 4 }));
    }

    #[test]
    fn invalid_hyperparameters_are_rejected() {
        let x = to_matrix(&blob((0.0, 0.0), 4, 0.3));
        let mut svc = RbfSvc::new(SvmParams { c: -1.0, gamma: 0.001 });
        let err = svc.fit(&x, &[1, 1, 2, 2]).unwrap_err();
        assert!(matches!(err, MlError::InvalidParameter { name: "c", .. }));
    }

    #[test]
    fn unbalanced_classes_still_get_votes() {
        // 20 majority vs 4 minority samples; balanced weighting must keep
        // the minority cluster classified as itself.
        let mut points = blob((0.0, 0.0), 20, 0.5);
        points.extend(blob((7.0, 7.0), 4, 0.3));
        let x = to_matrix(&points);
        let y: Vec<i64> = (0..24).map(|i| if i < 20 { 1 } else { 2 }).collect();

        let mut svc = RbfSvc::new(SvmParams { c: 10.0, gamma: 0.5 });
        svc.fit(&x, &y).unwrap();
        let predictions = svc.predict(&x).unwrap();
        for i in 20..24 {
            assert_eq!(predictions[i], 2);
        }
    }
}
