// Logistic regression — binary (sigmoid) or multinomial (softmax).
//
// Minimizes 0.5 * |W|^2 + C * sum_i s_i * loss_i with class-balanced sample
// weights s_i. The intercept is not regularized. Optimization is plain
// gradient descent with Armijo backtracking, which is slow-ish but fully
// deterministic and has no tuning knobs beyond the tolerance.

use anyhow::Result;
use ndarray::{Array1, Array2};
use sprs::CsMat;
use tracing::{debug, warn};

use super::linear::{balanced_class_weights, encode_labels, LinearClassifier, LinearModel};
use crate::corpus::Category;

pub struct LogisticRegression {
    /// Inverse regularization strength
    pub c: f64,
    /// Stop when the largest gradient component drops below this
    pub tol: f64,
    pub max_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            c: 1.0,
            tol: 1e-4,
            max_iter: 1000,
        }
    }
}

/// Parameters during optimization: `rows` coefficient rows, flattened.
#[derive(Clone)]
struct Params {
    w: Vec<f64>,
    b: Vec<f64>,
}

struct Problem<'a> {
    x: &'a CsMat<f64>,
    y: &'a [usize],
    sample_weight: Vec<f64>,
    rows: usize,
    n_features: usize,
    c: f64,
}

impl LinearClassifier for LogisticRegression {
    fn fit(&self, x: &CsMat<f64>, labels: &[Category]) -> Result<LinearModel> {
        if x.rows() != labels.len() {
            anyhow::bail!(
                "Feature matrix has {} rows but {} labels were given",
                x.rows(),
                labels.len()
            );
        }
        let (classes, y) = encode_labels(labels)?;
        let class_weights = balanced_class_weights(&y, classes.len());
        let rows = if classes.len() == 2 { 1 } else { classes.len() };
        let problem = Problem {
            x,
            y: &y,
            sample_weight: y.iter().map(|&k| class_weights[k]).collect(),
            rows,
            n_features: x.cols(),
            c: self.c,
        };

        let mut params = Params {
            w: vec![0.0; rows * x.cols()],
            b: vec![0.0; rows],
        };
        let (mut loss, mut grad) = problem.loss_and_grad(&params);
        let mut step = 1.0;
        let mut converged = false;

        for iter in 0..self.max_iter {
            let grad_max = grad.w.iter().chain(&grad.b).fold(0.0f64, |m, g| m.max(g.abs()));
            if grad_max < self.tol {
                debug!(iterations = iter, loss, "Logistic regression converged");
                converged = true;
                break;
            }
            let grad_sq: f64 = grad.w.iter().chain(&grad.b).map(|g| g * g).sum();

            // Armijo backtracking, starting from a slightly larger step than last time.
            step *= 2.0;
            let (next, next_loss, next_grad) = loop {
                let candidate = Params {
                    w: params.w.iter().zip(&grad.w).map(|(p, g)| p - step * g).collect(),
                    b: params.b.iter().zip(&grad.b).map(|(p, g)| p - step * g).collect(),
                };
                let (cand_loss, cand_grad) = problem.loss_and_grad(&candidate);
                if cand_loss <= loss - 0.5 * step * grad_sq || step < 1e-12 {
                    break (candidate, cand_loss, cand_grad);
                }
                step *= 0.5;
            };
            params = next;
            loss = next_loss;
            grad = next_grad;
        }
        if !converged {
            warn!(max_iter = self.max_iter, "Logistic regression did not converge");
        }

        Ok(LinearModel {
            classes,
            coef: Array2::from_shape_vec((rows, x.cols()), params.w)?,
            intercept: Array1::from(params.b),
        })
    }
}

impl Problem<'_> {
    fn scores(&self, params: &Params, i: usize) -> Vec<f64> {
        let mut z = params.b.clone();
        if let Some(row) = self.x.outer_view(i) {
            for (j, &v) in row.iter() {
                for (r, zr) in z.iter_mut().enumerate() {
                    *zr += v * params.w[r * self.n_features + j];
                }
            }
        }
        z
    }

    /// Objective value and gradient at `params`.
    fn loss_and_grad(&self, params: &Params) -> (f64, Params) {
        let mut loss = 0.5 * params.w.iter().map(|w| w * w).sum::<f64>();
        let mut grad = Params {
            w: params.w.clone(),
            b: vec![0.0; self.rows],
        };

        for i in 0..self.x.rows() {
            let z = self.scores(params, i);
            let weight = self.c * self.sample_weight[i];
            // dloss/dz for every coefficient row
            let dz: Vec<f64> = if self.rows == 1 {
                let t = if self.y[i] == 1 { 1.0 } else { -1.0 };
                loss += weight * softplus(-t * z[0]);
                vec![weight * -t * sigmoid(-t * z[0])]
            } else {
                let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let sum_exp: f64 = z.iter().map(|zr| (zr - max).exp()).sum();
                let log_norm = max + sum_exp.ln();
                loss += weight * (log_norm - z[self.y[i]]);
                z.iter()
                    .enumerate()
                    .map(|(r, zr)| {
                        let p = (zr - log_norm).exp();
                        weight * (p - if r == self.y[i] { 1.0 } else { 0.0 })
                    })
                    .collect()
            };

            if let Some(row) = self.x.outer_view(i) {
                for (j, &v) in row.iter() {
                    for (r, d) in dz.iter().enumerate() {
                        grad.w[r * self.n_features + j] += d * v;
                    }
                }
            }
            for (gb, d) in grad.b.iter_mut().zip(&dz) {
                *gb += d;
            }
        }

        (loss, grad)
    }
}

fn sigmoid(a: f64) -> f64 {
    if a >= 0.0 {
        1.0 / (1.0 + (-a).exp())
    } else {
        let e = a.exp();
        e / (1.0 + e)
    }
}

/// ln(1 + e^a) without overflow.
fn softplus(a: f64) -> f64 {
    if a > 0.0 {
        a + (-a).exp().ln_1p()
    } else {
        a.exp().ln_1p()
    }
}
