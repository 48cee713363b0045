//! Product × sale incidence (pivot) table.
//!
//! Rows are products, columns are sales, and a cell is 1 when the product was
//! bought in that sale. Absent pairs are 0, so the table has no missing cells.

use crate::config::ColumnNames;
use crate::error::{RecoError, Result};
use crate::sparse::CscMatrix;
use itertools::Itertools;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Binary incidence table keyed by product ID (rows) and sale ID (columns).
///
/// Row order defines the positional indices used by the neighbor model, so it
/// is persisted together with the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidenceTable {
    product_ids: Vec<String>,
    sale_ids: Vec<String>,
    /// Sorted sale positions per product
    purchases: Vec<Vec<usize>>,
}

impl IncidenceTable {
    /// Pivot `(product, sale)` pairs into a table.
    ///
    /// Labels are ordered ascending (numerically when every label is an
    /// integer). Repeated pairs collapse into a single 1.
    pub fn from_pairs<P, S>(pairs: impl IntoIterator<Item = (P, S)>) -> Self
    where
        P: Into<String>,
        S: Into<String>,
    {
        let pairs: Vec<(String, String)> = pairs.into_iter().map(|(p, s)| (p.into(), s.into())).collect();

        let product_ids = ordered_labels(pairs.iter().map(|(p, _)| p.as_str()));
        let sale_ids = ordered_labels(pairs.iter().map(|(_, s)| s.as_str()));

        let product_pos: HashMap<&str, usize> = product_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let sale_pos: HashMap<&str, usize> = sale_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let mut sets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); product_ids.len()];
        for (product, sale) in &pairs {
            sets[product_pos[product.as_str()]].insert(sale_pos[sale.as_str()]);
        }
        let purchases = sets.into_iter().map(|s| s.into_iter().collect()).collect();

        Self {
            product_ids,
            sale_ids,
            purchases,
        }
    }

    /// Pivot a transaction frame on its product and sale columns.
    ///
    /// Both columns must hold text (see [`crate::transactions::load_transactions`]).
    /// IDs are trimmed; a null or blank ID is a data error.
    pub fn from_transactions(df: &DataFrame, columns: &ColumnNames) -> Result<Self> {
        let products = string_column(df, &columns.product)?;
        let sales = string_column(df, &columns.sale)?;
        Ok(Self::from_pairs(products.into_iter().zip(sales)))
    }

    pub fn product_ids(&self) -> &[String] {
        &self.product_ids
    }

    pub fn sale_ids(&self) -> &[String] {
        &self.sale_ids
    }

    pub fn n_products(&self) -> usize {
        self.product_ids.len()
    }

    pub fn n_sales(&self) -> usize {
        self.sale_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }

    /// Row position of a product ID.
    pub fn position_of(&self, product_id: &str) -> Option<usize> {
        self.product_ids.iter().position(|id| id == product_id)
    }

    /// Product ID at a row position.
    pub fn product_at(&self, position: usize) -> Option<&str> {
        self.product_ids.get(position).map(String::as_str)
    }

    /// Cell value by labels; 0 for unknown labels or absent pairs.
    pub fn cell(&self, product_id: &str, sale_id: &str) -> f64 {
        let Some(row) = self.position_of(product_id) else {
            return 0.0;
        };
        let Some(col) = self.sale_ids.iter().position(|id| id == sale_id) else {
            return 0.0;
        };
        if self.purchases[row].binary_search(&col).is_ok() {
            1.0
        } else {
            0.0
        }
    }

    /// Dense row vector (one entry per sale) for the product at `position`.
    pub fn row_vector(&self, position: usize) -> Option<Vec<f64>> {
        let sales = self.purchases.get(position)?;
        let mut row = vec![0.0; self.sale_ids.len()];
        for &col in sales {
            row[col] = 1.0;
        }
        Some(row)
    }

    /// Number of 1-cells.
    pub fn nnz(&self) -> usize {
        self.purchases.iter().map(Vec::len).sum()
    }

    /// Compressed sparse column copy of the table.
    pub fn to_sparse(&self) -> Result<CscMatrix> {
        let triplets: Vec<(usize, usize, f64)> = self
            .purchases
            .iter()
            .enumerate()
            .flat_map(|(row, sales)| sales.iter().map(move |&col| (row, col, 1.0)))
            .collect();
        CscMatrix::from_triplets(self.n_products(), self.n_sales(), &triplets)
    }

    /// Check structural consistency after deserializing.
    pub fn validate(&self) -> Result<()> {
        if self.purchases.len() != self.product_ids.len() {
            return Err(RecoError::Artifact(format!(
                "matrix has {} product labels but {} rows",
                self.product_ids.len(),
                self.purchases.len()
            )));
        }
        if !self.product_ids.iter().all_unique() {
            return Err(RecoError::Artifact("matrix has duplicate product labels".to_string()));
        }
        let n_sales = self.sale_ids.len();
        for sales in &self.purchases {
            if sales.iter().any(|&c| c >= n_sales) || sales.windows(2).any(|w| w[0] >= w[1]) {
                return Err(RecoError::Artifact(
                    "matrix row references an unknown or unsorted sale".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let values = df
        .column(name)
        .map_err(|_| RecoError::Data(format!("missing column '{}'", name)))?
        .str()
        .map_err(|_| RecoError::Data(format!("column '{}' does not hold text IDs", name)))?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| RecoError::Data(format!("row {} has no value in column '{}'", row, name)))
        })
        .collect()
}

fn ordered_labels<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<String> {
    let unique: Vec<&str> = labels.unique().collect();
    let numeric: Option<Vec<i64>> = unique.iter().map(|l| l.parse::<i64>().ok()).collect();
    match numeric {
        Some(keys) => unique
            .into_iter()
            .zip(keys)
            .sorted_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(l, _)| l.to_string())
            .collect(),
        None => unique
            .into_iter()
            .sorted()
            .map(str::to_string)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pivot_scenario() {
        // (A, 1), (B, 1), (A, 2)
        let table = IncidenceTable::from_pairs([("A", "1"), ("B", "1"), ("A", "2")]);
        assert_eq!(table.product_ids(), &["A".to_string(), "B".to_string()]);
        assert_eq!(table.sale_ids(), &["1".to_string(), "2".to_string()]);
        assert_eq!(table.row_vector(0), Some(vec![1.0, 1.0]));
        assert_eq!(table.row_vector(1), Some(vec![1.0, 0.0]));
        assert_eq!(table.row_vector(2), None);
        assert_eq!(table.cell("B", "2"), 0.0);
        assert_eq!(table.cell("Z", "1"), 0.0);
    }

    #[test]
    fn test_repeated_pairs_collapse() {
        let table = IncidenceTable::from_pairs([("A", "1"), ("A", "1"), ("A", "1")]);
        assert_eq!(table.nnz(), 1);
        assert_eq!(table.cell("A", "1"), 1.0);
    }

    #[test]
    fn test_numeric_labels_sort_numerically() {
        let table = IncidenceTable::from_pairs([("10", "3"), ("2", "20"), ("1", "100")]);
        assert_eq!(table.product_ids(), &["1", "2", "10"].map(String::from));
        assert_eq!(table.sale_ids(), &["3", "20", "100"].map(String::from));
    }

    #[test]
    fn test_from_transactions() {
        let df = df![
            "id_venda" => ["1", "1", "2"],
            "id_produto" => ["A", "B", "A"]
        ]
        .unwrap();
        let table = IncidenceTable::from_transactions(&df, &ColumnNames::default()).unwrap();
        assert_eq!(table.n_products(), 2);
        assert_eq!(table.n_sales(), 2);
        assert_eq!(table.position_of("B"), Some(1));
        assert_eq!(table.product_at(0), Some("A"));
    }

    #[test]
    fn test_null_id_is_rejected() {
        let df = df![
            "id_venda" => [Some("1"), None],
            "id_produto" => ["A", "B"]
        ]
        .unwrap();
        assert!(matches!(
            IncidenceTable::from_transactions(&df, &ColumnNames::default()),
            Err(RecoError::Data(_))
        ));
    }

    #[test]
    fn test_ids_keep_their_text() {
        let df = df![
            "id_venda" => ["1", "1", "2"],
            "id_produto" => ["007", " 008", "7"]
        ]
        .unwrap();
        let table = IncidenceTable::from_transactions(&df, &ColumnNames::default()).unwrap();
        assert_eq!(table.product_ids(), &["007", "7", "008"].map(String::from));
        assert_eq!(table.position_of("008"), Some(2));

        let numeric = df![
            "id_venda" => [1, 2],
            "id_produto" => ["A", "B"]
        ]
        .unwrap();
        assert!(matches!(
            IncidenceTable::from_transactions(&numeric, &ColumnNames::default()),
            Err(RecoError::Data(_))
        ));
    }

    #[test]
    fn test_to_sparse_matches_cells() {
        let table = IncidenceTable::from_pairs([("A", "1"), ("B", "1"), ("A", "2"), ("C", "3")]);
        let matrix = table.to_sparse().unwrap();
        assert_eq!(matrix.shape(), (3, 3));
        assert_eq!(matrix.nnz(), table.nnz());
        for (r, product) in table.product_ids().iter().enumerate() {
            for (c, sale) in table.sale_ids().iter().enumerate() {
                assert_eq!(matrix.get(r, c), table.cell(product, sale));
            }
        }
    }

    #[test]
    fn test_validate_detects_corruption() {
        let mut table = IncidenceTable::from_pairs([("A", "1")]);
        assert!(table.validate().is_ok());
        table.purchases[0].push(7);
        assert!(matches!(table.validate(), Err(RecoError::Artifact(_))));
    }
}
