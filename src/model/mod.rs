//! Leakage-aware training and the fitted model artifact
//!
//! - **preprocess**: numeric impute+scale and categorical one-hot state
//! - **logistic**: class-weighted binary logistic regression
//! - **metrics**: discrimination and business metrics on the held-out split
//! - **artifact**: the persisted preprocessing+classifier bundle
//! - **trainer**: leakage filter, stratified split, fit, evaluate, persist

pub mod artifact;
pub mod logistic;
pub mod metrics;
pub mod preprocess;
pub mod trainer;

pub use artifact::ModelArtifact;
pub use logistic::{LogisticModel, TrainOptions};
pub use metrics::MetricsSummary;
pub use preprocess::{indicator_name, CategoricalEncoder, NumericPreprocessor};
pub use trainer::{train_from_table, TrainReport, LEAKAGE_COLUMNS};
