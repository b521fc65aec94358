// Linear kernel PCA on sparse inputs.
//
// With a linear kernel the centered Gram matrix is K = A A^T where A is the
// column-centered data matrix, and the kernel PCA embedding of the training
// rows is U * sqrt(L) for the leading eigenpairs (U, L) of K.
//
// Small inputs (at most EXACT_MAX_ROWS rows) decompose K itself. Larger ones
// find the leading subspace with seeded randomized subspace iteration on A
// (applied implicitly, so the sparse input is never densified), followed by
// a Jacobi eigen-decomposition of the small projected problem.

use anyhow::Result;
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sprs::CsMat;
use tracing::debug;

/// Extra random directions beyond the requested components.
const OVERSAMPLING: usize = 10;
const POWER_ITERATIONS: usize = 7;
/// Up to this many rows the full Gram matrix is decomposed.
pub const EXACT_MAX_ROWS: usize = 600;
const JACOBI_MAX_SWEEPS: usize = 100;

pub struct LinearKernelPca {
    pub n_components: usize,
    pub seed: u64,
    /// Inputs with more rows use randomized subspace iteration
    pub exact_max_rows: usize,
}

impl LinearKernelPca {
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            seed: 42,
            exact_max_rows: EXACT_MAX_ROWS,
        }
    }

    /// Embed the rows of `x` into at most `n_components` dimensions.
    ///
    /// The output has min(n_components, rows, cols) columns, ordered by
    /// decreasing explained variance.
    pub fn fit_transform(&self, x: &CsMat<f64>) -> Result<Array2<f64>> {
        let (n, f) = (x.rows(), x.cols());
        let k = self.n_components.min(n).min(f);
        if k == 0 {
            return Ok(Array2::zeros((n, 0)));
        }
        let mean = column_means(x);
        let q = if n <= self.exact_max_rows {
            Array2::eye(n)
        } else {
            self.leading_subspace(x, &mean, (k + OVERSAMPLING).min(n).min(f))
        };
        let l = q.ncols();

        // l x l problem: Q^T K Q = (A^T Q)^T (A^T Q), K itself when Q = I
        let atq = centered_t_times(x, &mean, &q);
        let small = atq.t().dot(&atq);
        let (eigenvalues, eigenvectors) = symmetric_eigen(small);

        let mut order: Vec<usize> = (0..l).collect();
        order.sort_by(|&a, &b| {
            eigenvalues[b]
                .partial_cmp(&eigenvalues[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut embedding = Array2::zeros((n, k));
        for (out_col, &idx) in order.iter().take(k).enumerate() {
            let scale = eigenvalues[idx].max(0.0).sqrt();
            let direction = q.dot(&eigenvectors.column(idx));
            embedding.column_mut(out_col).assign(&(direction * scale));
        }

        debug!(
            rows = n,
            features = f,
            components = k,
            exact = n <= self.exact_max_rows,
            "Kernel PCA embedding computed"
        );
        Ok(embedding)
    }

    /// Orthonormal (rows x l) basis approximating the leading eigenvectors of K.
    fn leading_subspace(&self, x: &CsMat<f64>, mean: &Array1<f64>, l: usize) -> Array2<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let omega = Array2::from_shape_fn((x.cols(), l), |_| rng.random_range(-1.0..1.0));

        let mut q = centered_times(x, mean, &omega);
        orthonormalize_columns(&mut q);
        for _ in 0..POWER_ITERATIONS {
            let mut z = centered_t_times(x, mean, &q);
            orthonormalize_columns(&mut z);
            q = centered_times(x, mean, &z);
            orthonormalize_columns(&mut q);
        }
        q
    }
}

fn column_means(x: &CsMat<f64>) -> Array1<f64> {
    let mut mean = Array1::zeros(x.cols());
    for row in x.outer_iterator() {
        for (j, &v) in row.iter() {
            mean[j] += v;
        }
    }
    if x.rows() > 0 {
        mean /= x.rows() as f64;
    }
    mean
}

/// (X - 1 mean^T) * m, for m of shape (cols, l).
fn centered_times(x: &CsMat<f64>, mean: &Array1<f64>, m: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros((x.rows(), m.ncols()));
    for (i, row) in x.outer_iterator().enumerate() {
        let mut out_row = out.row_mut(i);
        for (j, &v) in row.iter() {
            out_row.scaled_add(v, &m.row(j));
        }
    }
    let shift = mean.dot(m);
    out -= &shift;
    out
}

/// (X - 1 mean^T)^T * q, for q of shape (rows, l).
fn centered_t_times(x: &CsMat<f64>, mean: &Array1<f64>, q: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros((x.cols(), q.ncols()));
    for (i, row) in x.outer_iterator().enumerate() {
        let q_row = q.row(i);
        for (j, &v) in row.iter() {
            out.row_mut(j).scaled_add(v, &q_row);
        }
    }
    let col_sums = q.sum_axis(Axis(0));
    for (j, mut out_row) in out.outer_iter_mut().enumerate() {
        out_row.scaled_add(-mean[j], &col_sums);
    }
    out
}

/// Modified Gram-Schmidt. Columns that are (numerically) dependent on the
/// previous ones are zeroed.
fn orthonormalize_columns(m: &mut Array2<f64>) {
    for c in 0..m.ncols() {
        for prev in 0..c {
            let proj = m.column(c).dot(&m.column(prev));
            let prev_col = m.column(prev).to_owned();
            m.column_mut(c).scaled_add(-proj, &prev_col);
        }
        let norm = m.column(c).dot(&m.column(c)).sqrt();
        if norm > 1e-10 {
            m.column_mut(c).mapv_inplace(|v| v / norm);
        } else {
            m.column_mut(c).fill(0.0);
        }
    }
}

/// Cyclic Jacobi eigen-decomposition of a symmetric matrix.
///
/// Returns the eigenvalues and a matrix with the matching eigenvectors as columns.
pub fn symmetric_eigen(mut a: Array2<f64>) -> (Vec<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::eye(n);
    let scale: f64 = a.iter().map(|x| x * x).sum::<f64>().max(f64::MIN_POSITIVE);

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| ((p + 1)..n).map(move |q| (p, q)))
            .map(|(p, q)| a[[p, q]] * a[[p, q]])
            .sum();
        if off <= 1e-24 * scale {
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq.abs() < f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;
                for k in 0..n {
                    let (akp, akq) = (a[[k, p]], a[[k, q]]);
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[[p, k]], a[[q, k]]);
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let (vkp, vkq) = (v[[k, p]], v[[k, q]]);
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[[i, i]]).collect();
    (eigenvalues, v)
}
