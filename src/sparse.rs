//! Compressed sparse matrices for the incidence data.
//!
//! The incidence table is mostly zeros (a product appears in a handful of
//! sales out of thousands), so it is handed to the neighbor search in a
//! compressed sparse column layout. The search itself scans rows, so
//! [`CscMatrix::to_rows`] produces the row-major view it stores.

use crate::error::{RecoError, Result};
use serde::{Deserialize, Serialize};

/// Compressed sparse column matrix.
///
/// Column `c` owns the entries `col_ptr[c]..col_ptr[c + 1]` of `row_indices`
/// and `values`. Row indices are strictly increasing within a column and
/// explicit zeros are never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CscMatrix {
    n_rows: usize,
    n_cols: usize,
    col_ptr: Vec<usize>,
    row_indices: Vec<usize>,
    values: Vec<f64>,
}

impl CscMatrix {
    /// Build from `(row, col, value)` triplets.
    ///
    /// Duplicate coordinates are summed; zero results are dropped.
    pub fn from_triplets(n_rows: usize, n_cols: usize, triplets: &[(usize, usize, f64)]) -> Result<Self> {
        for &(row, col, _) in triplets {
            if row >= n_rows || col >= n_cols {
                return Err(RecoError::Data(format!(
                    "entry ({}, {}) is outside a {}x{} matrix",
                    row, col, n_rows, n_cols
                )));
            }
        }

        let mut sorted: Vec<(usize, usize, f64)> = triplets.to_vec();
        sorted.sort_by(|a, b| (a.1, a.0).cmp(&(b.1, b.0)));

        let mut col_ptr = vec![0usize; n_cols + 1];
        let mut row_indices = Vec::with_capacity(sorted.len());
        let mut values: Vec<f64> = Vec::with_capacity(sorted.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, value) in sorted {
            if last == Some((row, col)) {
                if let Some(v) = values.last_mut() {
                    *v += value;
                }
                continue;
            }
            row_indices.push(row);
            values.push(value);
            col_ptr[col + 1] += 1;
            last = Some((row, col));
        }

        for c in 0..n_cols {
            col_ptr[c + 1] += col_ptr[c];
        }

        let mut matrix = Self {
            n_rows,
            n_cols,
            col_ptr,
            row_indices,
            values,
        };
        matrix.prune_zeros();
        Ok(matrix)
    }

    fn prune_zeros(&mut self) {
        if self.values.iter().all(|v| *v != 0.0) {
            return;
        }
        let mut col_ptr = vec![0usize; self.n_cols + 1];
        let mut row_indices = Vec::with_capacity(self.row_indices.len());
        let mut values = Vec::with_capacity(self.values.len());
        for c in 0..self.n_cols {
            for i in self.col_ptr[c]..self.col_ptr[c + 1] {
                if self.values[i] != 0.0 {
                    row_indices.push(self.row_indices[i]);
                    values.push(self.values[i]);
                }
            }
            col_ptr[c + 1] = values.len();
        }
        self.col_ptr = col_ptr;
        self.row_indices = row_indices;
        self.values = values;
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Number of stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Value at `(row, col)`; zero when nothing is stored there.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        if row >= self.n_rows {
            return 0.0;
        }
        let Some((rows, values)) = self.column(col) else {
            return 0.0;
        };
        match rows.binary_search(&row) {
            Ok(i) => values[i],
            Err(_) => 0.0,
        }
    }

    /// Row indices and values stored for column `col`, or `None` past the last column.
    pub fn column(&self, col: usize) -> Option<(&[usize], &[f64])> {
        if col >= self.n_cols {
            return None;
        }
        let start = self.col_ptr[col];
        let end = self.col_ptr[col + 1];
        Some((&self.row_indices[start..end], &self.values[start..end]))
    }

    /// Row-major (CSR) copy of the same entries.
    pub fn to_rows(&self) -> SparseRows {
        let mut row_ptr = vec![0usize; self.n_rows + 1];
        for &row in &self.row_indices {
            row_ptr[row + 1] += 1;
        }
        for r in 0..self.n_rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        let mut next = row_ptr.clone();
        let mut col_indices = vec![0usize; self.nnz()];
        let mut values = vec![0.0f64; self.nnz()];
        // Walking columns in order keeps column indices sorted inside each row.
        for c in 0..self.n_cols {
            for i in self.col_ptr[c]..self.col_ptr[c + 1] {
                let row = self.row_indices[i];
                let slot = next[row];
                col_indices[slot] = c;
                values[slot] = self.values[i];
                next[row] += 1;
            }
        }

        SparseRows {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row_ptr,
            col_indices,
            values,
        }
    }
}

/// Compressed sparse row matrix, the layout the neighbor search scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseRows {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseRows {
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Column indices and values stored for row `row`.
    pub fn row(&self, row: usize) -> (&[usize], &[f64]) {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        (&self.col_indices[start..end], &self.values[start..end])
    }

    /// Check the structural invariants after deserializing.
    pub fn validate(&self) -> Result<()> {
        if self.row_ptr.len() != self.n_rows + 1 {
            return Err(RecoError::Artifact(format!(
                "row pointer has {} entries for {} rows",
                self.row_ptr.len(),
                self.n_rows
            )));
        }
        if self.col_indices.len() != self.values.len() {
            return Err(RecoError::Artifact(
                "column index and value arrays differ in length".to_string(),
            ));
        }
        if self.row_ptr.windows(2).any(|w| w[0] > w[1])
            || self.row_ptr.last().copied() != Some(self.values.len())
        {
            return Err(RecoError::Artifact("row pointer is not monotonic".to_string()));
        }
        if self.col_indices.iter().any(|&c| c >= self.n_cols) {
            return Err(RecoError::Artifact(format!(
                "column index out of range for {} columns",
                self.n_cols
            )));
        }
        Ok(())
    }
}
