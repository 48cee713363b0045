//! k-nearest-neighbors model over the sparse incidence matrix.
//!
//! [`NearestNeighbors`] holds the hyperparameters and a fitted search index.
//! The search strategy sits behind [`NeighborSearch`] so the trainer and the
//! predictor never depend on how neighbors are found.

mod brute;
mod metric;

pub use brute::BruteForceIndex;
pub use metric::Metric;

use crate::error::{RecoError, Result};
use crate::sparse::CscMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of neighbors returned per query.
pub const DEFAULT_N_NEIGHBORS: usize = 5;

/// Result of a neighbor query, closest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Neighbors {
    pub distances: Vec<f64>,
    /// Row positions in the fitted matrix
    pub indices: Vec<usize>,
}

impl Neighbors {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A structure answering "which k fitted rows are closest to this vector".
pub trait NeighborSearch {
    /// Index the rows of `matrix`, replacing anything fitted before.
    fn fit(&mut self, matrix: &CscMatrix) -> Result<()>;

    /// Up to `k` nearest rows to `query`. `k` larger than the fitted row
    /// count returns every row.
    fn kneighbors(&self, query: &[f64], k: usize) -> Result<Neighbors>;

    /// Rows indexed by the last fit, `None` before fitting.
    fn n_samples(&self) -> Option<usize>;

    /// Features (columns) seen by the last fit, `None` before fitting.
    fn n_features(&self) -> Option<usize>;
}

/// Search strategy requested for the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Let the model choose; currently always brute force.
    Auto,
    #[default]
    Brute,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborParams {
    pub n_neighbors: usize,
    pub algorithm: Algorithm,
    pub metric: Metric,
}

impl Default for NeighborParams {
    fn default() -> Self {
        Self {
            n_neighbors: DEFAULT_N_NEIGHBORS,
            algorithm: Algorithm::Brute,
            metric: Metric::default(),
        }
    }
}

impl NeighborParams {
    pub fn validate(&self) -> Result<()> {
        if self.n_neighbors == 0 {
            return Err(RecoError::InvalidParameter("n_neighbors must be at least 1".to_string()));
        }
        self.metric.validate()
    }
}

/// Concrete index behind a model, serialized together with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum SearchIndex {
    Brute(BruteForceIndex),
}

impl SearchIndex {
    fn for_params(params: &NeighborParams) -> Self {
        match params.algorithm {
            Algorithm::Auto | Algorithm::Brute => SearchIndex::Brute(BruteForceIndex::new(params.metric)),
        }
    }
}

impl NeighborSearch for SearchIndex {
    fn fit(&mut self, matrix: &CscMatrix) -> Result<()> {
        match self {
            SearchIndex::Brute(index) => index.fit(matrix),
        }
    }

    fn kneighbors(&self, query: &[f64], k: usize) -> Result<Neighbors> {
        match self {
            SearchIndex::Brute(index) => index.kneighbors(query, k),
        }
    }

    fn n_samples(&self) -> Option<usize> {
        match self {
            SearchIndex::Brute(index) => index.n_samples(),
        }
    }

    fn n_features(&self) -> Option<usize> {
        match self {
            SearchIndex::Brute(index) => index.n_features(),
        }
    }
}

/// Unsupervised k-nearest-neighbors model.
///
/// # Example
///
/// ```
/// use product_similarity::neighbors::{NearestNeighbors, NeighborParams};
/// use product_similarity::sparse::CscMatrix;
///
/// // A = [1, 1], B = [1, 0]
/// let matrix = CscMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0)]).unwrap();
/// let mut model = NearestNeighbors::new(NeighborParams::default()).unwrap();
/// model.fit(&matrix).unwrap();
///
/// let found = model.kneighbors(&[1.0, 1.0]).unwrap();
/// assert_eq!(found.indices, vec![0, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestNeighbors {
    params: NeighborParams,
    index: SearchIndex,
}

impl NearestNeighbors {
    pub fn new(params: NeighborParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            index: SearchIndex::for_params(&params),
            params,
        })
    }

    pub fn params(&self) -> &NeighborParams {
        &self.params
    }

    pub fn n_neighbors(&self) -> usize {
        self.params.n_neighbors
    }

    pub fn fit(&mut self, matrix: &CscMatrix) -> Result<()> {
        debug!(
            "Fitting {:?} neighbor index on {}x{} matrix ({} non-zero)",
            self.params.algorithm,
            matrix.n_rows(),
            matrix.n_cols(),
            matrix.nnz()
        );
        self.index.fit(matrix)
    }

    /// The `n_neighbors` rows closest to `query`.
    pub fn kneighbors(&self, query: &[f64]) -> Result<Neighbors> {
        self.index.kneighbors(query, self.params.n_neighbors)
    }

    pub fn n_samples(&self) -> Option<usize> {
        self.index.n_samples()
    }

    /// Check hyperparameters and fitted structure, e.g. after loading from disk.
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        match &self.index {
            SearchIndex::Brute(index) => index.validate(),
        }
    }

    pub fn n_features(&self) -> Option<usize> {
        self.index.n_features()
    }
}
