// DBSCAN over a precomputed distance matrix.

use std::collections::VecDeque;

use anyhow::Result;
use ndarray::Array2;

use crate::corpus::NOISE_CLUSTER;

pub struct Dbscan {
    /// Neighborhood radius (inclusive)
    pub eps: f64,
    /// Minimum neighborhood size, the point itself included, for a core point
    pub min_samples: usize,
}

impl Dbscan {
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    /// Cluster labels 0.. in discovery order; noise points get `NOISE_CLUSTER`.
    pub fn fit_predict(&self, distances: &Array2<f64>) -> Result<Vec<i32>> {
        let n = distances.nrows();
        if distances.ncols() != n {
            anyhow::bail!(
                "Distance matrix must be square, got {}x{}",
                n,
                distances.ncols()
            );
        }

        let neighborhoods: Vec<Vec<usize>> = (0..n)
            .map(|i| {
                distances
                    .row(i)
                    .iter()
                    .enumerate()
                    .filter(|(_, &d)| d <= self.eps)
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();
        let is_core: Vec<bool> = neighborhoods
            .iter()
            .map(|nb| nb.len() >= self.min_samples)
            .collect();

        let mut labels = vec![NOISE_CLUSTER; n];
        let mut next_label = 0;
        for seed in 0..n {
            if labels[seed] != NOISE_CLUSTER || !is_core[seed] {
                continue;
            }
            labels[seed] = next_label;
            let mut queue = VecDeque::from([seed]);
            while let Some(p) = queue.pop_front() {
                if !is_core[p] {
                    continue;
                }
                for &q in &neighborhoods[p] {
                    if labels[q] == NOISE_CLUSTER {
                        labels[q] = next_label;
                        queue.push_back(q);
                    }
                }
            }
            next_label += 1;
        }
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_distances(points: &[f64]) -> Array2<f64> {
        Array2::from_shape_fn((points.len(), points.len()), |(i, j)| {
            (points[i] - points[j]).abs()
        })
    }

    #[test]
    fn test_two_groups_and_noise() {
        let d = line_distances(&[0.0, 0.1, 0.2, 5.0, 5.1, 5.2, 20.0]);
        let labels = Dbscan::new(0.15, 2).fit_predict(&d).unwrap();
        assert_eq!(labels, vec![0, 0, 0, 1, 1, 1, NOISE_CLUSTER]);
    }

    #[test]
    fn test_border_point_joins_cluster() {
        // 0.3 is within eps of 0.2 (core) but has only one other neighbor
        let d = line_distances(&[0.0, 0.1, 0.2, 0.3]);
        let labels = Dbscan::new(0.11, 3).fit_predict(&d).unwrap();
        assert_eq!(labels, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_all_noise_when_sparse() {
        let d = line_distances(&[0.0, 1.0, 2.0]);
        let labels = Dbscan::new(0.5, 2).fit_predict(&d).unwrap();
        assert!(labels.iter().all(|&l| l == NOISE_CLUSTER));
    }

    #[test]
    fn test_rejects_non_square() {
        assert!(Dbscan::new(0.5, 2).fit_predict(&Array2::zeros((2, 3))).is_err());
    }
}
