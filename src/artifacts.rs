//! Persisted model and matrix files.
//!
//! Both artifacts are JSON documents written by the trainer and read back by
//! the predictor. They carry no version or checksum; the predictor only checks
//! that their shapes agree.

use crate::error::{RecoError, Result};
use crate::incidence::IncidenceTable;
use crate::neighbors::NearestNeighbors;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const MODEL_FILE: &str = "model.json";
pub const MATRIX_FILE: &str = "matrix.json";

/// Locations of the two artifacts of one trained model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub matrix: PathBuf,
}

impl ArtifactPaths {
    /// Fixed file names inside an output directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join(MODEL_FILE),
            matrix: dir.join(MATRIX_FILE),
        }
    }

    pub fn exist(&self) -> bool {
        self.model.is_file() && self.matrix.is_file()
    }
}

pub fn save_model(model: &NearestNeighbors, path: impl AsRef<Path>) -> Result<()> {
    write_json(model, path.as_ref())
}

pub fn save_matrix(table: &IncidenceTable, path: impl AsRef<Path>) -> Result<()> {
    write_json(table, path.as_ref())
}

pub fn load_model(path: impl AsRef<Path>) -> Result<NearestNeighbors> {
    let path = path.as_ref();
    let model: NearestNeighbors = read_json(path)?;
    model
        .validate()
        .map_err(|e| RecoError::Artifact(format!("{}: {}", path.display(), e)))?;
    if model.n_samples().is_none() {
        return Err(RecoError::Artifact(format!(
            "model in {} was saved before fitting",
            path.display()
        )));
    }
    Ok(model)
}

pub fn load_matrix(path: impl AsRef<Path>) -> Result<IncidenceTable> {
    let path = path.as_ref();
    let table: IncidenceTable = read_json(path)?;
    table
        .validate()
        .map_err(|e| RecoError::Artifact(format!("{}: {}", path.display(), e)))?;
    Ok(table)
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| RecoError::Artifact(format!("cannot create {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)
        .map_err(|e| RecoError::Artifact(format!("cannot open {}: {}", path.display(), e)))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| RecoError::Artifact(format!("cannot decode {}: {}", path.display(), e)))
}
