// Clustering fallback — pseudo-categories for unlabelled corpora.
//
// When every document carries the same label there is nothing to contrast,
// so documents are grouped by content instead:
//   tf-idf features -> linear kernel PCA (250 dims) -> L2-normalized rows
//   -> cosine distance matrix -> DBSCAN (precomputed distances)
// The distance matrix is quadratic in the number of documents, so the corpus
// has to be reduced by the subset selector first.

use std::collections::BTreeMap;

use anyhow::Result;
use ndarray::{Array2, Axis};
use tracing::info;

use crate::corpus::subset::MAX_DOCUMENTS;
use crate::corpus::{category_count, Category, DocCategories, TextDict, NOISE_CLUSTER};
use crate::features::matrix::features_to_matrix;
use crate::features::traits::FeatureProvider;
use crate::features::transform::FeatureTransform;
use crate::features::FeatureConfig;
use crate::models::dbscan::Dbscan;
use crate::models::kpca::LinearKernelPca;

/// Dimensionality of the reduced representation.
pub const N_COMPONENTS: usize = 250;

/// Clustering parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    /// Maximum cosine distance between neighbors
    pub eps: f64,
    pub min_samples: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            eps: 0.45,
            min_samples: 3,
        }
    }
}

/// {doc_id: cluster_id}, with NOISE_CLUSTER for unassigned documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterAssignment {
    pub labels: BTreeMap<String, i32>,
}

impl ClusterAssignment {
    /// Number of real clusters; the noise bucket doesn't count.
    pub fn n_clusters(&self) -> usize {
        let mut ids: Vec<i32> = self
            .labels
            .values()
            .copied()
            .filter(|&c| c != NOISE_CLUSTER)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    pub fn noise_count(&self) -> usize {
        self.labels.values().filter(|&&c| c == NOISE_CLUSTER).count()
    }

    /// The assignment as categories. Noise stays in as its own bucket; use
    /// `corpus::drop_noise` before treating the result as real categories.
    pub fn to_categories(&self) -> DocCategories {
        self.labels
            .iter()
            .map(|(id, &c)| (id.clone(), Category::Cluster(c)))
            .collect()
    }
}

/// Whether the categories carry no supervision (a single label everywhere).
pub fn needs_clustering(doccats: &DocCategories) -> bool {
    category_count(doccats) == 1
}

/// Cluster the documents of `texts` by content.
pub fn cluster_texts(texts: &TextDict, params: ClusterParams) -> Result<ClusterAssignment> {
    if texts.is_empty() {
        anyhow::bail!("Cannot cluster an empty corpus");
    }
    if texts.len() > MAX_DOCUMENTS {
        anyhow::bail!(
            "Refusing to cluster {} documents (at most {MAX_DOCUMENTS}); select a subset first",
            texts.len()
        );
    }

    let doc_ids: Vec<String> = texts.keys().cloned().collect();
    let transform = FeatureTransform::new(FeatureConfig::clustering())?;
    let docfeats = transform.texts_to_features(texts, None)?;
    let features = features_to_matrix(&docfeats, &doc_ids, None)?;

    let mut reduced = LinearKernelPca::new(N_COMPONENTS).fit_transform(&features.matrix)?;
    l2_normalize_rows(&mut reduced);
    let distances = cosine_distances(&reduced);

    let labels = Dbscan::new(params.eps, params.min_samples).fit_predict(&distances)?;
    let assignment = ClusterAssignment {
        labels: doc_ids.into_iter().zip(labels).collect(),
    };
    info!(
        documents = texts.len(),
        clusters = assignment.n_clusters(),
        noise = assignment.noise_count(),
        "Clustered documents"
    );
    Ok(assignment)
}

/// Scale every row to unit length. Zero rows stay zero.
fn l2_normalize_rows(x: &mut Array2<f64>) {
    for mut row in x.axis_iter_mut(Axis(0)) {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }
}

/// 1 - cosine similarity of unit rows, clipped at 0 against rounding.
fn cosine_distances(x: &Array2<f64>) -> Array2<f64> {
    let mut d = x.dot(&x.t());
    d.mapv_inplace(|s| (1.0 - s).max(0.0));
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_needs_clustering() {
        let single: DocCategories = [
            ("a".to_string(), Category::from(".")),
            ("b".to_string(), Category::from(".")),
        ]
        .into();
        assert!(needs_clustering(&single));
        let two: DocCategories = [
            ("a".to_string(), Category::from("x")),
            ("b".to_string(), Category::from("y")),
        ]
        .into();
        assert!(!needs_clustering(&two));
    }

    #[test]
    fn test_assignment_counts_exclude_noise() {
        let assignment = ClusterAssignment {
            labels: [("a", 0), ("b", 0), ("c", 1), ("d", NOISE_CLUSTER), ("e", NOISE_CLUSTER)]
                .into_iter()
                .map(|(id, c)| (id.to_string(), c))
                .collect(),
        };
        assert_eq!(assignment.n_clusters(), 2);
        assert_eq!(assignment.noise_count(), 2);
        assert!(assignment.to_categories()["d"].is_noise());
    }

    #[test]
    fn test_cosine_distances() {
        let mut x = array![[3.0, 4.0], [6.0, 8.0], [0.0, 1.0], [0.0, 0.0]];
        l2_normalize_rows(&mut x);
        let d = cosine_distances(&x);
        assert!(d[[0, 1]].abs() < 1e-12);
        assert!((d[[0, 2]] - 0.2).abs() < 1e-12);
        // zero row is maximally distant from everything, itself included
        assert!((d[[3, 3]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_corpus_rejected() {
        assert!(cluster_texts(&TextDict::new(), ClusterParams::default()).is_err());
    }
}
