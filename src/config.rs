//! Runtime settings shared by the training and prediction binaries.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file by the binaries). Every setting has a default matching the fixed
//! hyperparameters of the similarity model.

use crate::error::{RecoError, Result};
use crate::neighbors::{Algorithm, Metric, NeighborParams};
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_N_NEIGHBORS: &str = "RECO_N_NEIGHBORS";
pub const ENV_MINKOWSKI_P: &str = "RECO_MINKOWSKI_P";
pub const ENV_PRODUCT_COLUMN: &str = "RECO_PRODUCT_COLUMN";
pub const ENV_SALE_COLUMN: &str = "RECO_SALE_COLUMN";
pub const ENV_MODELS_DIR: &str = "RECO_MODELS_DIR";

pub const DEFAULT_PRODUCT_COLUMN: &str = "id_produto";
pub const DEFAULT_SALE_COLUMN: &str = "id_venda";
pub const DEFAULT_MODELS_DIR: &str = "models";

/// Names of the CSV columns used as pivot keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    /// Column holding the product ID (pivot rows)
    pub product: String,
    /// Column holding the sale/transaction ID (pivot columns)
    pub sale: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            product: DEFAULT_PRODUCT_COLUMN.to_string(),
            sale: DEFAULT_SALE_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub columns: ColumnNames,
    pub neighbors: NeighborParams,
    /// Root of the versioned model registry
    pub models_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            neighbors: NeighborParams::default(),
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let n_neighbors = match lookup(ENV_N_NEIGHBORS) {
            Some(raw) => parse_setting::<usize>(ENV_N_NEIGHBORS, &raw)?,
            None => defaults.neighbors.n_neighbors,
        };
        let metric = match lookup(ENV_MINKOWSKI_P) {
            Some(raw) => Metric::Minkowski {
                p: parse_setting::<f64>(ENV_MINKOWSKI_P, &raw)?,
            },
            None => defaults.neighbors.metric,
        };

        let neighbors = NeighborParams {
            n_neighbors,
            algorithm: Algorithm::Brute,
            metric,
        };
        neighbors
            .validate()
            .map_err(|e| RecoError::Config(e.to_string()))?;

        let columns = ColumnNames {
            product: lookup(ENV_PRODUCT_COLUMN).unwrap_or(defaults.columns.product),
            sale: lookup(ENV_SALE_COLUMN).unwrap_or(defaults.columns.sale),
        };
        if columns.product.trim().is_empty() || columns.sale.trim().is_empty() {
            return Err(RecoError::Config("pivot column names must not be empty".to_string()));
        }
        if columns.product == columns.sale {
            return Err(RecoError::Config(format!(
                "product and sale columns must differ (both are '{}')",
                columns.product
            )));
        }

        let models_dir = lookup(ENV_MODELS_DIR)
            .map(PathBuf::from)
            .unwrap_or(defaults.models_dir);

        Ok(Self {
            columns,
            neighbors,
            models_dir,
        })
    }
}

fn parse_setting<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| RecoError::Config(format!("{} has an invalid value: '{}'", key, raw)))
}
