//! AdaBoost (SAMME) over shallow decision trees
//!
//! Boosting rounds reweight the training epochs so each weak learner
//! concentrates on what its predecessors got wrong. Weak learners are
//! depth-limited decision trees split on weighted Gini impurity.

use ndarray::{Array2, ArrayView1};
use tracing::{debug, warn};

use crate::config::BoostParams;
use crate::error::{MlError, MlResult};
use crate::ml::{check_training_inputs, Classifier};

/// A fitted decision tree.
#[derive(Clone, Debug)]
struct DecisionTree {
    root: Node,
}

#[derive(Clone, Debug)]
enum Node {
    Leaf {
        label: i64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl DecisionTree {
    /// Fit on weighted samples. `weights` must sum to 1.
    fn fit(x: &Array2<f64>, y: &[i64], weights: &[f64], classes: &[i64], max_depth: usize) -> Self {
        let indices: Vec<usize> = (0..y.len()).collect();
        Self {
            root: build_node(x, y, weights, classes, &indices, max_depth),
        }
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> i64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { label } => return *label,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Weighted class counts over a set of sample indices.
fn class_weights(y: &[i64], weights: &[f64], classes: &[i64], indices: &[usize]) -> Vec<f64> {
    let mut counts = vec![0.0; classes.len()];
    for &i in indices {
        let slot = classes.iter().position(|&c| c == y[i]).unwrap_or(0);
        counts[slot] += weights[i];
    }
    counts
}

fn gini(counts: &[f64]) -> f64 {
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total).powi(2)).sum::<f64>()
}

fn majority(counts: &[f64], classes: &[i64]) -> i64 {
    let mut best = classes[0];
    let mut best_weight = f64::NEG_INFINITY;
    for (slot, &class) in classes.iter().enumerate() {
        if counts[slot] > best_weight {
            best_weight = counts[slot];
            best = class;
        }
    }
    best
}

fn build_node(
    x: &Array2<f64>,
    y: &[i64],
    weights: &[f64],
    classes: &[i64],
    indices: &[usize],
    depth: usize,
) -> Node {
    let counts = class_weights(y, weights, classes, indices);
    let node_gini = gini(&counts);
    if depth == 0 || node_gini == 0.0 || indices.len() < 2 {
        return Node::Leaf {
            label: majority(&counts, classes),
        };
    }

    // Best weighted-Gini split across all features.
    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, impurity)
    let total_weight: f64 = indices.iter().map(|&i| weights[i]).sum();

    for feature in 0..x.ncols() {
        let mut order: Vec<usize> = indices.to_vec();
        order.sort_by(|&a, &b| {
            x[[a, feature]]
                .partial_cmp(&x[[b, feature]])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_counts = vec![0.0; classes.len()];
        let mut right_counts = counts.clone();

        for w in 0..order.len() - 1 {
            let i = order[w];
            let slot = classes.iter().position(|&c| c == y[i]).unwrap_or(0);
            left_counts[slot] += weights[i];
            right_counts[slot] -= weights[i];

            let here = x[[i, feature]];
            let next = x[[order[w + 1], feature]];
            if here == next {
                continue;
            }

            let left_weight: f64 = left_counts.iter().sum();
            let right_weight: f64 = right_counts.iter().sum();
            let impurity =
                (left_weight * gini(&left_counts) + right_weight * gini(&right_counts))
                    / total_weight;

            if best.map_or(true, |(_, _, best_impurity)| impurity < best_impurity) {
                best = Some((feature, (here + next) / 2.0, impurity));
            }
        }
    }

    let Some((feature, threshold, impurity)) = best else {
        // All samples identical in every feature.
        return Node::Leaf {
            label: majority(&counts, classes),
        };
    };
    if impurity >= node_gini {
        return Node::Leaf {
            label: majority(&counts, classes),
        };
    }

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| x[[i, feature]] <= threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_node(x, y, weights, classes, &left_idx, depth - 1)),
        right: Box::new(build_node(x, y, weights, classes, &right_idx, depth - 1)),
    }
}

struct Stage {
    weight: f64,
    tree: DecisionTree,
}

struct FittedBoost {
    classes: Vec<i64>,
    columns: usize,
    stages: Vec<Stage>,
}

/// SAMME AdaBoost classifier.
pub struct AdaBoostClassifier {
    params: BoostParams,
    fitted: Option<FittedBoost>,
}

impl AdaBoostClassifier {
    /// Create an unfitted classifier with the given hyperparameters.
    #[must_use]
    pub fn new(params: BoostParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    fn check_params(&self) -> MlResult<()> {
        if self.params.n_estimators == 0 {
            return Err(MlError::InvalidParameter {
                name: "n_estimators",
                reason: "at least one boosting round is required".to_string(),
            });
        }
        if self.params.learning_rate <= 0.0 {
            return Err(MlError::InvalidParameter {
                name: "learning_rate",
                reason: format!("must be positive, got {}", self.params.learning_rate),
            });
        }
        Ok(())
    }
}

impl Classifier for AdaBoostClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[i64]) -> MlResult<()> {
        self.check_params()?;
        let classes = check_training_inputs(x, y)?;

        let n = y.len();
        let k = classes.len() as f64;
        let mut weights = vec![1.0 / n as f64; n];
        let mut stages = Vec::new();

        for round in 0..self.params.n_estimators {
            let tree = DecisionTree::fit(x, y, &weights, &classes, self.params.max_depth);
            let predictions: Vec<i64> = x.rows().into_iter().map(|r| tree.predict_row(r)).collect();

            let error: f64 = predictions
                .iter()
                .zip(y)
                .zip(&weights)
                .filter(|((p, t), _)| p != t)
                .map(|(_, &w)| w)
                .sum();

            if error <= 0.0 {
                // Perfect learner dominates the ensemble; nothing left to
                // reweight.
                stages.push(Stage { weight: 1.0, tree });
                debug!(round, "weak learner reached zero training error");
                break;
            }

            // SAMME requires the learner to beat random guessing.
            if error >= 1.0 - 1.0 / k {
                warn!(round, error, "weak learner no better than chance, stopping");
                if stages.is_empty() {
                    stages.push(Stage { weight: 1.0, tree });
                }
                break;
            }

            let stage_weight =
                self.params.learning_rate * (((1.0 - error) / error).ln() + (k - 1.0).ln());

            for (i, (p, t)) in predictions.iter().zip(y).enumerate() {
                if p != t {
                    weights[i] *= stage_weight.exp();
                }
            }
            let total: f64 = weights.iter().sum();
            for w in &mut weights {
                *w /= total;
            }

            debug!(round, error, stage_weight, "boosting round complete");
            stages.push(Stage {
                weight: stage_weight,
                tree,
            });
        }

        self.fitted = Some(FittedBoost {
            classes,
            columns: x.ncols(),
            stages,
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> MlResult<Vec<i64>> {
        let fitted = self.fitted.as_ref().ok_or(MlError::NotFitted)?;
        if x.ncols() != fitted.columns {
            return Err(MlError::ColumnMismatch {
                fitted: fitted.columns,
                got: x.ncols(),
            });
        }

        let mut predictions = Vec::with_capacity(x.nrows());
        for row in x.rows() {
            let mut scores = vec![0.0; fitted.classes.len()];
            for stage in &fitted.stages {
                let label = stage.tree.predict_row(row);
                if let Some(slot) = fitted.classes.iter().position(|&c| c == label) {
                    scores[slot] += stage.weight;
                }
            }

            // Highest score wins; ties go to the smallest label because
            // classes are sorted.
            let mut best = fitted.classes[0];
            let mut best_score = f64::NEG_INFINITY;
            for (slot, &class) in fitted.classes.iter().enumerate() {
                if scores[slot] > best_score {
                    best_score = scores[slot];
                    best = class;
                }
            }
            predictions.push(best);
        }
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn stump_learns_a_threshold() {
        let x = array![[0.0], [1.0], [2.0], [10.0], [11.0], [12.0]];
        let y = vec![1, 1, 1, 2, 2, 2];
        let weights = vec![1.0 / 6.0; 6];

        let tree = DecisionTree::fit(&x, &y, &weights, &[1, 2], 1);
        for (i, &label) in y.iter().enumerate() {
            assert_eq!(tree.predict_row(x.row(i)), label);
        }
    }

    #[test]
    fn boosting_fits_separable_data() {
        let x = array![
            [0.0, 0.0],
            [0.5, 0.2],
            [0.1, 0.8],
            [5.0, 5.0],
            [5.5, 4.8],
            [4.9, 5.3],
        ];
        let y = vec![1, 1, 1, 3, 3, 3];

        let mut model = AdaBoostClassifier::new(BoostParams {
            n_estimators: 10,
            learning_rate: 0.8,
            max_depth: 2,
        });
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn three_class_predictions_stay_in_label_set() {
        let x = array![
            [0.0, 0.0],
            [0.3, 0.1],
            [4.0, 0.0],
            [4.2, 0.3],
            [0.0, 4.0],
            [0.2, 4.1],
        ];
        let y = vec![1, 1, 2, 2, 3, 3];

        let mut model = AdaBoostClassifier::new(BoostParams::default());
        model.fit(&x, &y).unwrap();

        let test = array![[0.1, 0.1], [4.1, 0.1], [0.1, 4.0], [2.0, 2.0]];
        let predictions = model.predict(&test).unwrap();
        assert_eq!(predictions.len(), 4);
        assert!(predictions.iter().all(|p| [1, 2, 3].contains(p)));
    }

    #[test]
    fn predict_before_fit_is_rejected() {
        let model = AdaBoostClassifier::new(BoostParams::default());
        assert!(matches!(
            model.predict(&Array2::zeros((1, 1))).unwrap_err(),
            MlError::NotFitted
        ));
    }

    #[test]
    fn zero_rounds_is_rejected() {
        let mut model = AdaBoostClassifier::new(BoostParams {
            n_estimators: 0,
            learning_rate: 0.8,
            max_depth: 2,
        });
        let err = model.fit(&array![[0.0], [1.0]], &[1, 2]).unwrap_err();
        assert!(matches!(
            err,
            MlError::InvalidParameter {
                name: "n_estimators",
                ..
            }
        ));
    }
}
