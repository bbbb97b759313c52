//! Crivo CLI - batch pipeline stages and on-demand scoring
//!
//! Commands:
//! - clean: map and clean the raw CSV
//! - features: engineer modeling features
//! - train: fit and persist the model artifact
//! - run: all stages in order, halting on the first failure
//! - predict: score one applicant against the persisted artifact

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::error;

use crivo::inference::{self, ApplicantInput, Verdict};
use crivo::model::ModelArtifact;
use crivo::pipeline::{self, PipelineConfig};
use crivo::{PipelineError, CRIVO_VERSION};

/// Crivo - credit-default risk scoring pipeline
#[derive(Parser)]
#[command(name = "crivo")]
#[command(version = CRIVO_VERSION)]
#[command(about = "Clean, engineer, train and score loan-default risk", long_about = None)]
struct Cli {
    #[command(flatten)]
    paths: PathOptions,

    #[command(subcommand)]
    command: Commands,
}

/// File-location overrides shared by all commands
#[derive(Args)]
struct PathOptions {
    /// Raw input CSV
    #[arg(long, default_value = "data/raw/loan_default.csv")]
    raw: PathBuf,

    /// Cleaned CSV
    #[arg(long, default_value = "data/processed/loan_clean.csv")]
    clean: PathBuf,

    /// Engineered features CSV
    #[arg(long, default_value = "data/features/loan_features.csv")]
    features: PathBuf,

    /// Fitted model artifact
    #[arg(long, default_value = "models/model.json")]
    model: PathBuf,

    /// Metrics summary CSV
    #[arg(long, default_value = "models/metrics_summary.csv")]
    metrics: PathBuf,

    /// Split seed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Held-out test fraction
    #[arg(long, default_value = "0.2")]
    test_fraction: f64,
}

impl PathOptions {
    fn into_config(self) -> PipelineConfig {
        PipelineConfig {
            raw_path: self.raw,
            clean_path: self.clean,
            features_path: self.features,
            model_path: self.model,
            metrics_path: self.metrics,
            seed: self.seed,
            test_fraction: self.test_fraction,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Map raw columns onto the canonical schema and impute missing values
    Clean,

    /// Derive the engineered modeling features
    Features,

    /// Filter leakage, fit the classifier and persist artifact + metrics
    Train,

    /// Run clean, features and train in order; halt on the first failure
    Run,

    /// Score one applicant against the persisted artifact
    Predict {
        /// Monthly income
        #[arg(long, default_value = "2500")]
        income: f64,

        /// Age in years
        #[arg(long, default_value = "22")]
        age: f64,

        /// Credit score (0-1000)
        #[arg(long, default_value = "650")]
        credit_score: f64,

        /// Financed loan amount
        #[arg(long, default_value = "30000")]
        loan_value: f64,

        /// Months currently in arrears
        #[arg(long, default_value = "0")]
        months_overdue: f64,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    let config = cli.paths.into_config();
    match cli.command {
        Commands::Clean => {
            pipeline::run_clean(&config)?;
        }
        Commands::Features => {
            pipeline::run_features(&config)?;
        }
        Commands::Train => {
            pipeline::run_train(&config)?;
        }
        Commands::Run => {
            pipeline::run_all(&config)?;
        }
        Commands::Predict {
            income,
            age,
            credit_score,
            loan_value,
            months_overdue,
        } => {
            let artifact = ModelArtifact::load(&config.model_path)?;
            let assessment = inference::score(
                &artifact,
                &ApplicantInput {
                    income,
                    age,
                    credit_score,
                    loan_value,
                    months_overdue,
                },
            )?;
            match assessment.verdict {
                Verdict::GoodStanding => {
                    println!(
                        "GOOD STANDING (0) - low default risk (p = {:.3})",
                        assessment.probability
                    );
                }
                Verdict::Delinquent(label) => {
                    println!(
                        "LIKELY DEFAULT ({}) - high default risk (p = {:.3})",
                        label, assessment.probability
                    );
                }
                Verdict::Unexpected(label) => {
                    println!(
                        "Unexpected result: {} (p = {:.3})",
                        label, assessment.probability
                    );
                }
            }
        }
    }
    Ok(())
}
