// Linear SVM — L2-regularized squared hinge loss, dual coordinate descent.
//
// Solves, per binary subproblem,
//
//   min_w  0.5 * |w|^2 + sum_i C_i * max(0, 1 - y_i * w.x_i)^2
//
// in the dual (Hsieh et al., 2008). The bias is learned as the weight of an
// implicit constant feature equal to 1, so it is regularized like any other
// weight. Multiclass problems are split one-vs-rest.

use anyhow::Result;
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sprs::CsMat;
use tracing::{debug, warn};

use super::linear::{balanced_class_weights, encode_labels, LinearClassifier, LinearModel};
use crate::corpus::Category;
use crate::features::matrix::{sparse_dot, sparse_sq_norm};

pub struct LinearSvm {
    /// Inverse regularization strength
    pub c: f64,
    /// Stop when the projected gradient spread drops below this
    pub tol: f64,
    pub max_iter: usize,
    /// Seed for the coordinate visiting order
    pub seed: u64,
}

impl Default for LinearSvm {
    fn default() -> Self {
        Self {
            c: 10.0,
            tol: 1e-4,
            max_iter: 1000,
            seed: 1,
        }
    }
}

impl LinearClassifier for LinearSvm {
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
        let cost: Vec<f64> = y.iter().map(|&k| self.c * class_weights[k]).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        // Binary problems need one separator with classes[1] on the positive side.
        let positives: Vec<usize> = if classes.len() == 2 {
            vec![1]
        } else {
            (0..classes.len()).collect()
        };

        let n_features = x.cols();
        let mut coef = Array2::zeros((positives.len(), n_features));
        let mut intercept = Array1::zeros(positives.len());
        for (r, &k) in positives.iter().enumerate() {
            let signs: Vec<f64> = y.iter().map(|&yi| if yi == k { 1.0 } else { -1.0 }).collect();
            let (w, b) = self.fit_binary(x, &signs, &cost, &mut rng);
            for (j, wj) in w.into_iter().enumerate() {
                coef[[r, j]] = wj;
            }
            intercept[r] = b;
        }

        Ok(LinearModel {
            classes,
            coef,
            intercept,
        })
    }
}

impl LinearSvm {
    fn fit_binary(
        &self,
        x: &CsMat<f64>,
        signs: &[f64],
        cost: &[f64],
        rng: &mut ChaCha8Rng,
    ) -> (Vec<f64>, f64) {
        let n = x.rows();
        let mut w = vec![0.0; x.cols()];
        let mut b = 0.0;
        let mut alpha = vec![0.0; n];

        // Squared hinge: the dual gains a diagonal term 1 / (2 C_i).
        let diag: Vec<f64> = cost.iter().map(|c| 0.5 / c).collect();
        let qd: Vec<f64> = x
            .outer_iterator()
            .zip(&diag)
            .map(|(row, d)| sparse_sq_norm(&row) + 1.0 + d)
            .collect();

        let mut order: Vec<usize> = (0..n).collect();
        let mut converged = false;
        for iter in 0..self.max_iter {
            order.shuffle(rng);
            let mut pg_max = f64::NEG_INFINITY;
            let mut pg_min = f64::INFINITY;

            for &i in &order {
                let Some(row) = x.outer_view(i) else {
                    continue;
                };
                let g = signs[i] * (sparse_dot(&row, &w) + b) - 1.0 + diag[i] * alpha[i];
                let pg = if alpha[i] == 0.0 { g.min(0.0) } else { g };
                pg_max = pg_max.max(pg);
                pg_min = pg_min.min(pg);

                if pg.abs() > 1e-12 {
                    let old = alpha[i];
                    alpha[i] = (alpha[i] - g / qd[i]).max(0.0);
                    let step = (alpha[i] - old) * signs[i];
                    for (j, &v) in row.iter() {
                        w[j] += step * v;
                    }
                    b += step;
                }
            }

            if pg_max - pg_min <= self.tol {
                debug!(iterations = iter + 1, "Linear SVM converged");
                converged = true;
                break;
            }
        }
        if !converged && n > 0 {
            warn!(max_iter = self.max_iter, "Linear SVM did not converge");
        }

        (w, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprs::TriMat;

    fn separable() -> (CsMat<f64>, Vec<Category>) {
        // Class "a" lives on feature 0, class "b" on feature 1.
        let mut tri = TriMat::new((6, 2));
        for i in 0..3 {
            tri.add_triplet(i, 0, 1.0);
            tri.add_triplet(i, 1, 0.1 * i as f64);
        }
        for i in 3..6 {
            tri.add_triplet(i, 1, 1.0);
            tri.add_triplet(i, 0, 0.1 * (i - 3) as f64);
        }
        let labels = ["a", "a", "a", "b", "b", "b"].iter().map(|l| Category::from(*l)).collect();
        (tri.to_csr(), labels)
    }

    #[test]
    fn test_fits_separable_binary() {
        let (x, labels) = separable();
        let model = LinearSvm::default().fit(&x, &labels).unwrap();
        assert_eq!(model.coef.nrows(), 1);
        for (i, label) in labels.iter().enumerate() {
            assert_eq!(model.predict(&x.outer_view(i).unwrap()), label);
        }
        // feature 1 speaks for "b" (the positive class)
        assert!(model.coef[[0, 1]] > model.coef[[0, 0]]);
    }

    #[test]
    fn test_row_label_mismatch_fails() {
        let (x, mut labels) = separable();
        labels.pop();
        assert!(LinearSvm::default().fit(&x, &labels).is_err());
    }
}
