//! Offline training pipeline: transaction CSV in, model and matrix out.

use crate::artifacts::{self, ArtifactPaths};
use crate::config::Settings;
use crate::error::Result;
use crate::incidence::IncidenceTable;
use crate::neighbors::NearestNeighbors;
use crate::transactions::{self, DuplicateReport};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Summary of a finished training run.
#[derive(Debug)]
pub struct TrainingReport {
    pub n_products: usize,
    pub n_sales: usize,
    /// Non-zero cells in the incidence matrix
    pub nnz: usize,
    pub duplicates: DuplicateReport,
    pub artifacts: ArtifactPaths,
}

/// Train a similarity model from `csv_path` and write its artifacts into `output_dir`.
///
/// Everything is validated and fitted before the first file is written, so a
/// failed run leaves `output_dir` untouched. The input file is only read.
pub fn train(csv_path: impl AsRef<Path>, output_dir: impl AsRef<Path>, settings: &Settings) -> Result<TrainingReport> {
    let csv_path = csv_path.as_ref();
    let output_dir = output_dir.as_ref();
    let started = Instant::now();
    info!("Training products similarity model from {}", csv_path.display());

    let df = transactions::load_transactions(csv_path, &settings.columns)?;
    let df = transactions::add_purchase_indicator(df)?;
    let duplicates = transactions::find_duplicates(&df)?;

    let table = IncidenceTable::from_transactions(&df, &settings.columns)?;
    let matrix = table.to_sparse()?;
    info!(
        "Incidence matrix: {} products x {} sales, {} purchases",
        matrix.n_rows(),
        matrix.n_cols(),
        matrix.nnz()
    );

    let mut model = NearestNeighbors::new(settings.neighbors)?;
    model.fit(&matrix)?;

    fs::create_dir_all(output_dir)?;
    let paths = ArtifactPaths::in_dir(output_dir);
    artifacts::save_model(&model, &paths.model)?;
    if let Err(e) = artifacts::save_matrix(&table, &paths.matrix) {
        // A model without its matrix is unusable.
        if let Err(cleanup) = fs::remove_file(&paths.model) {
            warn!("Failed to remove {}: {}", paths.model.display(), cleanup);
        }
        return Err(e);
    }

    info!(
        "Products similarity model trained in {}ms",
        started.elapsed().as_millis()
    );

    Ok(TrainingReport {
        n_products: table.n_products(),
        n_sales: table.n_sales(),
        nnz: table.nnz(),
        duplicates,
        artifacts: paths,
    })
}
