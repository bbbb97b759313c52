//! Error types for the Crivo pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur across the batch pipeline and the serving path
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input file not found: {0}")]
    MissingInput(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("No outcome column found (looked for: {0})")]
    MissingOutcome(String),

    #[error("Dataset is empty: {0}")]
    EmptyDataset(String),

    #[error("Model artifact unavailable: {0}")]
    ArtifactUnavailable(String),

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),
}
