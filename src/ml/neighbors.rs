//! Brute-force nearest-neighbour index over the TF-IDF matrix.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{ArtifactError, ArtifactResult};
use super::sparse::{CsrMatrix, SparseRow};

/// Distance metric the index was fitted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
}

/// Contents of `nn_model.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborsParams {
    #[serde(default)]
    pub metric: Metric,
    /// Number of rows the index was fitted on
    pub n_samples: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
}

fn by_distance(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then(a.index.cmp(&b.index))
}

pub struct NearestNeighbors {
    metric: Metric,
    matrix: CsrMatrix,
    squared_norms: Vec<f64>,
}

impl NearestNeighbors {
    pub fn fit(params: &NeighborsParams, matrix: CsrMatrix) -> ArtifactResult<Self> {
        if params.n_samples != matrix.nrows() {
            return Err(ArtifactError::Inconsistent(format!(
                "neighbour index fitted on {} samples but matrix has {} rows",
                params.n_samples,
                matrix.nrows()
            )));
        }
        let squared_norms = matrix.rows().map(|row| row.squared_norm()).collect();
        Ok(Self {
            metric: params.metric,
            matrix,
            squared_norms,
        })
    }

    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    pub fn n_samples(&self) -> usize {
        self.matrix.nrows()
    }

    /// Returns the `k` rows closest to `query`, nearest first. Equal
    /// distances are ordered by row index.
    pub fn kneighbors(&self, query: SparseRow<'_>, k: usize) -> Vec<Neighbor> {
        let k = k.min(self.n_samples());
        if k == 0 {
            return Vec::new();
        }

        let query_norm = query.squared_norm();
        let mut all: Vec<Neighbor> = self
            .squared_norms
            .par_iter()
            .enumerate()
            .map(|(index, &row_norm)| {
                let row = self
                    .matrix
                    .row(index)
                    .unwrap_or(SparseRow {
                        indices: &[],
                        values: &[],
                    });
                Neighbor {
                    index,
                    distance: self.distance(query, query_norm, row, row_norm),
                }
            })
            .collect();

        if k < all.len() {
            all.select_nth_unstable_by(k - 1, by_distance);
            all.truncate(k);
        }
        all.sort_unstable_by(by_distance);
        all
    }

    /// Neighbours of a row that is part of the index
    pub fn kneighbors_of_row(&self, row: usize, k: usize) -> Option<Vec<Neighbor>> {
        self.matrix.row(row).map(|query| self.kneighbors(query, k))
    }

    fn distance(&self, a: SparseRow<'_>, a_norm: f64, b: SparseRow<'_>, b_norm: f64) -> f64 {
        let dot = a.dot(&b);
        match self.metric {
            Metric::Cosine => {
                let denom = a_norm.sqrt() * b_norm.sqrt();
                let similarity = if denom > 0.0 { dot / denom } else { 0.0 };
                (1.0 - similarity).clamp(0.0, 2.0)
            }
            Metric::Euclidean => (a_norm + b_norm - 2.0 * dot).max(0.0).sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(metric: Metric, rows: Vec<Vec<(usize, f64)>>) -> NearestNeighbors {
        let matrix = CsrMatrix::from_rows(3, rows).unwrap();
        let params = NeighborsParams {
            metric,
            n_samples: matrix.nrows(),
        };
        NearestNeighbors::fit(&params, matrix).unwrap()
    }

    #[test]
    fn test_query_row_is_its_own_nearest() {
        let nn = index(
            Metric::Cosine,
            vec![
                vec![(0, 1.0)],
                vec![(0, 0.6), (1, 0.8)],
                vec![(2, 1.0)],
                vec![(0, 0.8), (1, 0.6)],
            ],
        );
        let found = nn.kneighbors_of_row(0, 3).unwrap();
        let order: Vec<usize> = found.iter().map(|n| n.index).collect();
        assert_eq!(order, vec![0, 3, 1]);
        assert!(found[0].distance.abs() < 1e-12);
        assert!((found[1].distance - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_ties_break_by_row_index() {
        let nn = index(
            Metric::Cosine,
            vec![vec![(0, 1.0)], vec![(1, 1.0)], vec![(2, 1.0)], vec![(1, 1.0)]],
        );
        let found = nn.kneighbors_of_row(0, 4).unwrap();
        let order: Vec<usize> = found.iter().map(|n| n.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert!(found[1..].iter().all(|n| (n.distance - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_zero_row_is_at_distance_one() {
        let nn = index(Metric::Cosine, vec![vec![(0, 1.0)], vec![]]);
        let found = nn.kneighbors_of_row(1, 2).unwrap();
        assert!(found.iter().all(|n| (n.distance - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_k_is_capped_at_sample_count() {
        let nn = index(Metric::Cosine, vec![vec![(0, 1.0)], vec![(1, 1.0)]]);
        assert_eq!(nn.kneighbors_of_row(0, 25).unwrap().len(), 2);
        assert!(nn.kneighbors_of_row(0, 0).unwrap().is_empty());
        assert!(nn.kneighbors_of_row(7, 2).is_none());
    }

    #[test]
    fn test_euclidean_metric() {
        let nn = index(
            Metric::Euclidean,
            vec![vec![(0, 3.0)], vec![(1, 4.0)], vec![(0, 1.0)]],
        );
        let found = nn.kneighbors_of_row(0, 3).unwrap();
        assert_eq!(found[1].index, 2);
        assert!((found[1].distance - 2.0).abs() < 1e-12);
        assert!((found[2].distance - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_rejects_sample_mismatch() {
        let matrix = CsrMatrix::from_rows(3, vec![vec![(0, 1.0)]]).unwrap();
        let params = NeighborsParams {
            metric: Metric::Cosine,
            n_samples: 4,
        };
        assert!(matches!(
            NearestNeighbors::fit(&params, matrix),
            Err(ArtifactError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_params_default_to_cosine() {
        let params: NeighborsParams = serde_json::from_str(r#"{"n_samples":10}"#).unwrap();
        assert_eq!(params.metric, Metric::Cosine);
    }
}
