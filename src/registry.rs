//! Versioned model directories.
//!
//! Each training run gets its own `model-<unix millis>` directory under the
//! registry root holding the exported training data and both artifacts.
//! Prediction always uses the newest version; older versions are retired once
//! a new one has been trained.

use crate::artifacts::ArtifactPaths;
use crate::error::{RecoError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const VERSION_PREFIX: &str = "model-";
pub const TRAIN_DATA_FILE: &str = "train-data.csv";

/// One order line item, as exported for training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainRecord {
    #[serde(rename = "quantidade_produto")]
    pub quantity: u32,
    #[serde(rename = "preco_unitario")]
    pub unit_price: f64,
    #[serde(rename = "id_venda")]
    pub sale_id: String,
    #[serde(rename = "id_produto")]
    pub product_id: String,
}

/// Write training records as CSV with the canonical header.
pub fn write_training_csv<I>(path: impl AsRef<Path>, records: I) -> Result<usize>
where
    I: IntoIterator<Item = TrainRecord>,
{
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;
    let mut written = 0;
    for record in records {
        writer.serialize(&record)?;
        written += 1;
    }
    if written == 0 {
        writer.write_record(["quantidade_produto", "preco_unitario", "id_venda", "id_produto"])?;
    }
    writer.flush()?;
    info!("Wrote {} training records to {}", written, path.display());
    Ok(written)
}

/// Read training records back from a CSV written by [`write_training_csv`] or
/// any file with the same header.
pub fn read_training_csv(path: impl AsRef<Path>) -> Result<Vec<TrainRecord>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| RecoError::Input(format!("cannot read {}: {}", path.display(), e)))?;
    let mut records = Vec::new();
    for record in reader.deserialize::<TrainRecord>() {
        records.push(record?);
    }
    Ok(records)
}

/// Root directory holding model versions.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    root: PathBuf,
}

/// A single trained (or in-progress) model version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelVersion {
    pub dir: PathBuf,
}

impl ModelVersion {
    pub fn artifacts(&self) -> ArtifactPaths {
        ArtifactPaths::in_dir(&self.dir)
    }

    pub fn train_data(&self) -> PathBuf {
        self.dir.join(TRAIN_DATA_FILE)
    }

    pub fn name(&self) -> String {
        self.dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl ModelRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory for a new version stamped with `now`.
    ///
    /// The stamp is bumped past any existing version so two runs in the same
    /// millisecond never share a directory.
    pub fn create_version(&self, now: DateTime<Utc>) -> Result<ModelVersion> {
        let mut stamp = now.timestamp_millis();
        let mut dir = self.root.join(format!("{}{}", VERSION_PREFIX, stamp));
        while dir.exists() {
            stamp += 1;
            dir = self.root.join(format!("{}{}", VERSION_PREFIX, stamp));
        }
        info!("Creating new model directory {}", dir.display());
        fs::create_dir_all(&dir)?;
        Ok(ModelVersion { dir })
    }

    /// All versions, oldest first. A missing root means no versions.
    pub fn versions(&self) -> Result<Vec<ModelVersion>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut stamped: Vec<(i64, PathBuf)> = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(stamp) = name
                .strip_prefix(VERSION_PREFIX)
                .and_then(|s| s.parse::<i64>().ok())
            {
                stamped.push((stamp, entry.path()));
            }
        }
        stamped.sort();
        Ok(stamped
            .into_iter()
            .map(|(_, dir)| ModelVersion { dir })
            .collect())
    }

    /// Newest version, if any.
    pub fn latest(&self) -> Result<Option<ModelVersion>> {
        Ok(self.versions()?.pop())
    }

    /// Newest version whose artifacts are both present.
    pub fn latest_trained(&self) -> Result<ModelVersion> {
        self.versions()?
            .into_iter()
            .rev()
            .find(|v| v.artifacts().exist())
            .ok_or_else(|| RecoError::ModelNotTrained(self.root.display().to_string()))
    }

    /// Delete a version directory. Failures are logged, not returned.
    pub fn retire(&self, version: &ModelVersion) {
        info!("Deleting model directory {}", version.dir.display());
        if let Err(e) = fs::remove_dir_all(&version.dir) {
            error!("Error deleting model directory {}: {}", version.dir.display(), e);
        }
    }
}
