//! Loading and inspecting the transaction CSV fed to the trainer.

use crate::config::ColumnNames;
use crate::error::{RecoError, Result};
use polars::prelude::*;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Constant column marking "this product was bought in this sale".
pub const PURCHASE_INDICATOR: &str = "produto_venda";

/// Read a transaction CSV (header row required).
///
/// Fails with an input error when the file cannot be read, holds no rows, or
/// lacks one of the pivot columns.
pub fn load_transactions(path: impl AsRef<Path>, columns: &ColumnNames) -> Result<DataFrame> {
    let path = path.as_ref();
    let meta = std::fs::metadata(path)
        .map_err(|e| RecoError::Input(format!("cannot read {}: {}", path.display(), e)))?;
    if !meta.is_file() {
        return Err(RecoError::Input(format!("{} is not a file", path.display())));
    }
    if meta.len() == 0 {
        return Err(RecoError::Input(format!("{} is empty", path.display())));
    }

    let reader = || LazyCsvReader::new(path).with_has_header(true);
    let parse_error = |e: PolarsError| RecoError::Input(format!("failed to parse {}: {}", path.display(), e));

    let schema = reader().finish().and_then(|lf| lf.schema()).map_err(parse_error)?;
    let present: Vec<&str> = schema.iter_names().map(|name| name.as_str()).collect();
    for required in [&columns.product, &columns.sale] {
        if !present.contains(&required.as_str()) {
            return Err(RecoError::Input(format!(
                "{} has no '{}' column (found: {})",
                path.display(),
                required,
                present.join(", ")
            )));
        }
    }

    // IDs are labels, not numbers: "007" must stay "007".
    let id_types = Schema::from_iter([
        Field::new(&columns.product, DataType::String),
        Field::new(&columns.sale, DataType::String),
    ]);
    let df = reader()
        .with_dtype_overwrite(Some(Arc::new(id_types)))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(parse_error)?;

    if df.height() == 0 {
        return Err(RecoError::Input(format!(
            "{} contains no transactions",
            path.display()
        )));
    }

    info!(
        "Loaded {} transactions with columns [{}] from {}",
        df.height(),
        present.join(", "),
        path.display()
    );
    Ok(df)
}

/// Add the constant purchase indicator used as the pivot value.
pub fn add_purchase_indicator(df: DataFrame) -> Result<DataFrame> {
    let df = df
        .lazy()
        .with_column(lit(1i32).alias(PURCHASE_INDICATOR))
        .collect()?;
    Ok(df)
}

/// Rows that are identical across every column, all occurrences kept.
#[derive(Debug, Clone)]
pub struct DuplicateReport {
    rows: DataFrame,
}

impl DuplicateReport {
    pub fn count(&self) -> usize {
        self.rows.height()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.height() == 0
    }

    pub fn rows(&self) -> &DataFrame {
        &self.rows
    }
}

impl fmt::Display for DuplicateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "No duplicate rows found")
        } else {
            writeln!(f, "Redundant or inconsistent rows ({}):", self.count())?;
            write!(f, "{}", self.rows)
        }
    }
}

/// Find exact duplicate rows. Purely diagnostic: the caller keeps using `df`.
pub fn find_duplicates(df: &DataFrame) -> Result<DuplicateReport> {
    let mask = df.is_duplicated()?;
    let rows = df.filter(&mask)?;
    if rows.height() > 0 {
        warn!("Found {} duplicated transaction rows", rows.height());
    }
    Ok(DuplicateReport { rows })
}
