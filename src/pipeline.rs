//! Stage orchestration
//!
//! Ties the stages to their files: each stage reads one CSV, computes in
//! memory, writes one output, and returns a report. Stages are synchronous
//! and single-threaded; `run_all` executes them in fixed order and halts at
//! the first failure. The intermediate CSVs are caches, not sources of
//! truth; the model artifact is the only durable state.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use crate::cleaner;
use crate::error::PipelineError;
use crate::features;
use crate::model::trainer;
use crate::schema::RawTable;

/// File locations and training knobs for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub raw_path: PathBuf,
    pub clean_path: PathBuf,
    pub features_path: PathBuf,
    pub model_path: PathBuf,
    pub metrics_path: PathBuf,
    pub seed: u64,
    pub test_fraction: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_path: PathBuf::from("data/raw/loan_default.csv"),
            clean_path: PathBuf::from("data/processed/loan_clean.csv"),
            features_path: PathBuf::from("data/features/loan_features.csv"),
            model_path: PathBuf::from("models/model.json"),
            metrics_path: PathBuf::from("models/metrics_summary.csv"),
            seed: 42,
            test_fraction: 0.2,
        }
    }
}

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Clean,
    Features,
    Train,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Clean => "clean",
            Stage::Features => "features",
            Stage::Train => "train",
        }
    }
}

/// Result of one completed stage
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: Stage,
    pub rows: usize,
    pub output: PathBuf,
}

/// Stage 1: raw CSV -> cleaned canonical CSV
pub fn run_clean(config: &PipelineConfig) -> Result<StageReport, PipelineError> {
    let table = RawTable::from_csv_path(&config.raw_path)?;
    let output = cleaner::clean(&table);
    write_records(&config.clean_path, &output.records)?;
    info!(
        "Cleaned {} rows -> {}",
        output.records.len(),
        config.clean_path.display()
    );
    Ok(StageReport {
        stage: Stage::Clean,
        rows: output.records.len(),
        output: config.clean_path.clone(),
    })
}

/// Stage 2: cleaned CSV -> engineered features CSV
pub fn run_features(config: &PipelineConfig) -> Result<StageReport, PipelineError> {
    let table = RawTable::from_csv_path(&config.clean_path)?;
    let records = features::canonical_rows(&table);
    let engineered = features::build_features(&records);
    write_records(&config.features_path, &engineered)?;
    info!(
        "Engineered {} rows -> {}",
        engineered.len(),
        config.features_path.display()
    );
    Ok(StageReport {
        stage: Stage::Features,
        rows: engineered.len(),
        output: config.features_path.clone(),
    })
}

/// Stage 3: features CSV -> fitted artifact + metrics summary
pub fn run_train(config: &PipelineConfig) -> Result<StageReport, PipelineError> {
    let table = RawTable::from_csv_path(&config.features_path)?;
    let report = trainer::train_from_table(&table, config.seed, config.test_fraction)?;
    report.artifact.save(&config.model_path)?;
    report.metrics.write_csv(&config.metrics_path)?;
    info!(
        "Trained artifact {} -> {} (auc: {}, ks: {}, n_train: {}, n_test: {})",
        report.artifact.artifact_id,
        config.model_path.display(),
        report
            .metrics
            .auc
            .map(|v| v.to_string())
            .unwrap_or_else(|| "NaN".to_string()),
        report
            .metrics
            .ks
            .map(|v| v.to_string())
            .unwrap_or_else(|| "NaN".to_string()),
        report.metrics.n_train,
        report.metrics.n_test,
    );
    Ok(StageReport {
        stage: Stage::Train,
        rows: report.metrics.n_train + report.metrics.n_test,
        output: config.model_path.clone(),
    })
}

/// Run every stage in order, halting at the first failure.
///
/// Missing expected files are reported up front as warnings (early
/// detection); the failing stage then aborts the remaining sequence.
pub fn run_all(config: &PipelineConfig) -> Result<Vec<StageReport>, PipelineError> {
    if !config.raw_path.exists() {
        warn!(
            "Raw input not found at {}; the clean stage will fail",
            config.raw_path.display()
        );
    }

    let mut reports = Vec::new();
    let stages: [(Stage, fn(&PipelineConfig) -> Result<StageReport, PipelineError>); 3] = [
        (Stage::Clean, run_clean),
        (Stage::Features, run_features),
        (Stage::Train, run_train),
    ];
    for (stage, run) in stages {
        info!(">>> stage {}", stage.as_str());
        match run(config) {
            Ok(report) => reports.push(report),
            Err(e) => {
                warn!("Stage {} failed: {}; halting pipeline", stage.as_str(), e);
                return Err(e);
            }
        }
    }
    Ok(reports)
}

/// Serialize records to a headered CSV, creating parent directories
fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
