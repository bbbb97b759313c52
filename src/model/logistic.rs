//! Class-weighted binary logistic regression
//!
//! Fitted by deterministic full-batch gradient descent on the standardized
//! design matrix: zero-initialized weights, class-balanced sample weights to
//! counteract label imbalance, a small L2 ridge, and a gradient-norm early
//! stop under a generous iteration cap.

use serde::{Deserialize, Serialize};

/// Fitting hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainOptions {
    pub max_iter: usize,
    pub learning_rate: f64,
    pub l2: f64,
    /// Early-stop threshold on the gradient infinity norm
    pub tolerance: f64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            learning_rate: 0.1,
            l2: 1e-4,
            tolerance: 1e-6,
        }
    }
}

/// Fitted coefficients plus the label the positive class maps back to.
///
/// The outcome coercion upstream can pass through non-binary label spaces
/// (0/3 in some source exports); the classifier trains against membership of
/// `positive_label` and emits 0 or `positive_label` at predict time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
    pub positive_label: i64,
}

impl LogisticModel {
    /// Fit on a row-major design matrix and raw labels.
    ///
    /// Rows with `label == positive_label` are the positive class, everything
    /// else the negative class. Deterministic for fixed inputs.
    pub fn fit(x: &[Vec<f64>], y: &[i64], positive_label: i64, options: &TrainOptions) -> Self {
        let n_features = x.first().map(|row| row.len()).unwrap_or(0);
        let targets: Vec<f64> = y
            .iter()
            .map(|label| if *label == positive_label { 1.0 } else { 0.0 })
            .collect();

        // Balanced class weights: n / (n_classes * n_class)
        let n = targets.len() as f64;
        let n_pos = targets.iter().sum::<f64>();
        let n_neg = n - n_pos;
        let (w_pos, w_neg) = if n_pos > 0.0 && n_neg > 0.0 {
            (n / (2.0 * n_pos), n / (2.0 * n_neg))
        } else {
            (1.0, 1.0)
        };
        let sample_weights: Vec<f64> = targets
            .iter()
            .map(|t| if *t == 1.0 { w_pos } else { w_neg })
            .collect();
        let total_weight: f64 = sample_weights.iter().sum::<f64>().max(1.0);

        let mut weights = vec![0.0; n_features];
        let mut intercept = 0.0;

        for _ in 0..options.max_iter {
            let mut grad = vec![0.0; n_features];
            let mut grad_intercept = 0.0;

            for ((row, target), sample_weight) in x.iter().zip(&targets).zip(&sample_weights) {
                let p = sigmoid(dot(&weights, row) + intercept);
                let residual = sample_weight * (p - target);
                for (g, value) in grad.iter_mut().zip(row) {
                    *g += residual * value;
                }
                grad_intercept += residual;
            }

            let mut max_grad: f64 = 0.0;
            for (g, w) in grad.iter_mut().zip(&weights) {
                *g = *g / total_weight + options.l2 * w;
                max_grad = max_grad.max(g.abs());
            }
            grad_intercept /= total_weight;
            max_grad = max_grad.max(grad_intercept.abs());

            for (w, g) in weights.iter_mut().zip(&grad) {
                *w -= options.learning_rate * g;
            }
            intercept -= options.learning_rate * grad_intercept;

            if max_grad < options.tolerance {
                break;
            }
        }

        LogisticModel {
            weights,
            intercept,
            positive_label,
        }
    }

    /// Probability of the positive class for one preprocessed row
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        sigmoid(dot(&self.weights, row) + self.intercept)
    }

    /// Class label at the default 0.5 threshold
    pub fn predict(&self, row: &[f64]) -> i64 {
        if self.predict_proba(row) >= 0.5 {
            self.positive_label
        } else {
            0
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Numerically safe sigmoid
fn sigmoid(z: f64) -> f64 {
    let z = z.clamp(-35.0, 35.0);
    1.0 / (1.0 + (-z).exp())
}
