pub mod artifacts;
pub mod config;
pub mod error;
pub mod incidence;
pub mod neighbors;
pub mod predictor;
pub mod registry;
pub mod sparse;
pub mod telemetry;
pub mod trainer;
pub mod transactions;

pub use error::{RecoError, Result};
