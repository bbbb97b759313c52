//! Crivo - credit-default risk scoring pipeline
//!
//! Crivo turns a raw loan-book CSV into served default-risk predictions
//! through a deterministic pipeline: column mapping/cleaning → feature
//! engineering → leakage-aware training → single-record inference.
//!
//! ## Modules
//!
//! - **schema**: untyped CSV tables and canonical column resolution
//! - **cleaner**: type coercion, imputation, outcome derivation
//! - **features**: fixed-formula engineered features and buckets
//! - **model**: preprocessing, logistic classifier, metrics, artifact
//! - **inference**: column-aligned single-record scoring
//! - **pipeline**: stage-by-stage batch orchestration

pub mod cleaner;
pub mod error;
pub mod features;
pub mod inference;
pub mod model;
pub mod pipeline;
pub mod schema;
pub mod types;

pub use error::PipelineError;
pub use inference::{score, ApplicantInput, Assessment, Verdict};
pub use model::{ModelArtifact, TrainReport};
pub use pipeline::{run_all, PipelineConfig, StageReport};
pub use types::{CanonicalRecord, FeatureRecord};

/// Crivo version embedded in every persisted artifact
pub const CRIVO_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name stamped on persisted artifacts
pub const PRODUCER_NAME: &str = "crivo";
