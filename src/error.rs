use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecoError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Model is not fitted: {0}")]
    NotFitted(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("No trained model found in {0}; train a model before predicting")]
    ModelNotTrained(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl From<polars::error::PolarsError> for RecoError {
    fn from(err: polars::error::PolarsError) -> Self {
        RecoError::Polars(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RecoError>;
