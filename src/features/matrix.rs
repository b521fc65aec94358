// Sparse feature matrices.
//
// Train and test matrices must agree on what each column means, so the
// column order (the feature names) is either derived once from the training
// rows or supplied by the caller.

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use sprs::{CsMat, CsVecView};

use super::DocFeatures;

/// A CSR matrix with one row per document and named columns.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub matrix: CsMat<f64>,
    pub feature_names: Vec<String>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.matrix.rows()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Sparse view of row `i`.
    pub fn row(&self, i: usize) -> Option<CsVecView<'_, f64>> {
        self.matrix.outer_view(i)
    }
}

/// Stack the feature vectors of `ids` (in that order) into a CSR matrix.
///
/// Without `feature_names` the columns are the sorted union of all terms of
/// the selected documents. With them, terms outside the given names are
/// dropped so the matrix lines up with one built earlier.
pub fn features_to_matrix(
    docfeats: &DocFeatures,
    ids: &[String],
    feature_names: Option<&[String]>,
) -> Result<FeatureMatrix> {
    let mut rows = Vec::with_capacity(ids.len());
    for id in ids {
        match docfeats.get(id) {
            Some(weights) => rows.push(weights),
            None => anyhow::bail!("No feature vector for document {id:?}"),
        }
    }

    let feature_names: Vec<String> = match feature_names {
        Some(names) => names.to_vec(),
        None => rows
            .iter()
            .flat_map(|w| w.keys())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect(),
    };
    let column: HashMap<&str, usize> = feature_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut indptr = Vec::with_capacity(rows.len() + 1);
    let mut indices = Vec::new();
    let mut data = Vec::new();
    indptr.push(0usize);

    for weights in rows {
        let mut entries: Vec<(usize, f64)> = weights
            .iter()
            .filter_map(|(term, &w)| column.get(term.as_str()).map(|&col| (col, w)))
            .filter(|(_, w)| *w != 0.0)
            .collect();
        entries.sort_by_key(|(col, _)| *col);
        for (col, w) in entries {
            indices.push(col);
            data.push(w);
        }
        indptr.push(indices.len());
    }

    let matrix = CsMat::new((ids.len(), feature_names.len()), indptr, indices, data);
    Ok(FeatureMatrix {
        matrix,
        feature_names,
    })
}

/// Dot product of a sparse row with a dense vector of the same width.
pub fn sparse_dot(row: &CsVecView<'_, f64>, dense: &[f64]) -> f64 {
    row.iter().map(|(col, &v)| v * dense[col]).sum()
}

/// Squared L2 norm of a sparse row.
pub fn sparse_sq_norm(row: &CsVecView<'_, f64>) -> f64 {
    row.iter().map(|(_, &v)| v * v).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::TermWeights;

    fn docfeats() -> DocFeatures {
        let mut feats = DocFeatures::new();
        let a: TermWeights = [("brain".to_string(), 1.0), ("tumor".to_string(), 0.5)].into();
        let b: TermWeights = [("rain".to_string(), 2.0)].into();
        feats.insert("a".to_string(), a);
        feats.insert("b".to_string(), b);
        feats
    }

    #[test]
    fn test_columns_sorted_union() {
        let fm = features_to_matrix(&docfeats(), &["a".into(), "b".into()], None).unwrap();
        assert_eq!(fm.feature_names, vec!["brain", "rain", "tumor"]);
        assert_eq!(fm.n_rows(), 2);
        let row_a: Vec<(usize, f64)> = fm.row(0).unwrap().iter().map(|(c, &v)| (c, v)).collect();
        assert_eq!(row_a, vec![(0, 1.0), (2, 0.5)]);
    }

    #[test]
    fn test_given_names_drop_unknown_terms() {
        let names = vec!["tumor".to_string(), "brain".to_string()];
        let fm = features_to_matrix(&docfeats(), &["b".into(), "a".into()], Some(names.as_slice())).unwrap();
        assert_eq!(fm.row(0).unwrap().nnz(), 0);
        let row_a: Vec<(usize, f64)> = fm.row(1).unwrap().iter().map(|(c, &v)| (c, v)).collect();
        assert_eq!(row_a, vec![(0, 0.5), (1, 1.0)]);
    }

    #[test]
    fn test_missing_document_rejected() {
        assert!(features_to_matrix(&docfeats(), &["zzz".into()], None).is_err());
    }

    #[test]
    fn test_sparse_dot() {
        let fm = features_to_matrix(&docfeats(), &["a".into()], None).unwrap();
        let row = fm.row(0).unwrap();
        assert!((sparse_dot(&row, &[2.0, 4.0]) - 4.0).abs() < 1e-12);
        assert!((sparse_sq_norm(&row) - 1.25).abs() < 1e-12);
    }
}
