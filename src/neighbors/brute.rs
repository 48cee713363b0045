use super::{Metric, NeighborSearch, Neighbors};
use crate::error::{RecoError, Result};
use crate::sparse::{CscMatrix, SparseRows};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Exhaustive neighbor search: every query is compared with every fitted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BruteForceIndex {
    metric: Metric,
    rows: Option<SparseRows>,
}

impl BruteForceIndex {
    pub fn new(metric: Metric) -> Self {
        Self { metric, rows: None }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn is_fitted(&self) -> bool {
        self.rows.is_some()
    }

    /// Structural check of the fitted rows, used after deserializing.
    pub fn validate(&self) -> Result<()> {
        self.metric.validate()?;
        match &self.rows {
            Some(rows) => rows.validate(),
            None => Ok(()),
        }
    }

    fn fitted_rows(&self) -> Result<&SparseRows> {
        self.rows
            .as_ref()
            .ok_or_else(|| RecoError::NotFitted("call fit before querying neighbors".to_string()))
    }
}

impl NeighborSearch for BruteForceIndex {
    fn fit(&mut self, matrix: &CscMatrix) -> Result<()> {
        self.metric.validate()?;
        if matrix.n_rows() == 0 {
            return Err(RecoError::InvalidParameter(
                "cannot fit a neighbor index on a matrix with no rows".to_string(),
            ));
        }
        self.rows = Some(matrix.to_rows());
        Ok(())
    }

    fn kneighbors(&self, query: &[f64], k: usize) -> Result<Neighbors> {
        let rows = self.fitted_rows()?;
        if k == 0 {
            return Err(RecoError::InvalidParameter("n_neighbors must be at least 1".to_string()));
        }
        if query.len() != rows.n_cols() {
            return Err(RecoError::Query(format!(
                "query has {} features but the index was fitted with {}",
                query.len(),
                rows.n_cols()
            )));
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(RecoError::Query("query contains non-finite values".to_string()));
        }

        let query_norm = self.metric.dense_norm(query);
        let mut scored: Vec<(f64, usize)> = (0..rows.n_rows())
            .map(|r| {
                let (cols, values) = rows.row(r);
                (self.metric.distance_to_sparse(query, query_norm, cols, values), r)
            })
            .collect();

        scored.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        scored.truncate(k.min(rows.n_rows()));

        Ok(Neighbors {
            distances: scored.iter().map(|(d, _)| *d).collect(),
            indices: scored.iter().map(|(_, i)| *i).collect(),
        })
    }

    fn n_samples(&self) -> Option<usize> {
        self.rows.as_ref().map(SparseRows::n_rows)
    }

    fn n_features(&self) -> Option<usize> {
        self.rows.as_ref().map(SparseRows::n_cols)
    }
}
