//! Similar-product lookup over a trained model.
//!
//! Products are addressed by their ID (the incidence table's row label). An
//! unknown ID is not an error: it simply has no similar products.

use crate::artifacts;
use crate::error::{RecoError, Result};
use crate::incidence::IncidenceTable;
use crate::neighbors::NearestNeighbors;
use std::path::Path;
use tracing::{debug, info};

pub struct Predictor {
    model: NearestNeighbors,
    table: IncidenceTable,
}

impl Predictor {
    pub fn new(model: NearestNeighbors, table: IncidenceTable) -> Self {
        Self { model, table }
    }

    /// Load the model and matrix written by one training run.
    pub fn load(model_path: impl AsRef<Path>, matrix_path: impl AsRef<Path>) -> Result<Self> {
        let model_path = model_path.as_ref();
        let matrix_path = matrix_path.as_ref();
        info!(
            "Loading model from {} and matrix from {}",
            model_path.display(),
            matrix_path.display()
        );
        let model = artifacts::load_model(model_path)?;
        let table = artifacts::load_matrix(matrix_path)?;
        Ok(Self::new(model, table))
    }

    pub fn table(&self) -> &IncidenceTable {
        &self.table
    }

    /// IDs of the products closest to `product_id`, nearest first.
    ///
    /// The product itself is never part of the result, which holds at most
    /// `n_neighbors - 1` IDs. Unknown IDs yield an empty list. Surrounding
    /// whitespace is ignored, as it is when the table is built.
    pub fn similar_products(&self, product_id: &str) -> Result<Vec<String>> {
        let product_id = product_id.trim();
        let Some(position) = self.table.position_of(product_id) else {
            debug!("Product {} is not in the matrix", product_id);
            return Ok(Vec::new());
        };

        let query = self.table.row_vector(position).ok_or_else(|| {
            RecoError::Artifact(format!("matrix has no row for product {}", product_id))
        })?;
        let neighbors = self
            .model
            .kneighbors(&query)
            .map_err(|e| RecoError::Query(format!("prediction failed for {}: {}", product_id, e)))?;

        let limit = self.model.n_neighbors().saturating_sub(1);
        let mut similar = Vec::with_capacity(limit);
        for &index in &neighbors.indices {
            let id = self.table.product_at(index).ok_or_else(|| {
                RecoError::Artifact(format!(
                    "model returned row {} but the matrix has {} products",
                    index,
                    self.table.n_products()
                ))
            })?;
            if id != product_id {
                similar.push(id.to_string());
            }
        }
        similar.truncate(limit);

        info!("Similar products found for {}: {:?}", product_id, similar);
        Ok(similar)
    }
}
