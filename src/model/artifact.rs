//! The persisted preprocessing+classifier bundle
//!
//! Created once by the trainer, read-only thereafter. The artifact's input is
//! a row aligned to `model_cols`: raw numeric feature values first, then the
//! one-hot indicators. Numeric imputation and scaling happen inside the
//! artifact so training and serving share one code path.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::model::logistic::LogisticModel;
use crate::model::preprocess::{CategoricalEncoder, NumericPreprocessor};
use crate::{CRIVO_VERSION, PRODUCER_NAME};

/// Fitted pipeline artifact, serialized as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub artifact_id: Uuid,
    pub producer: String,
    pub version: String,
    pub trained_at: DateTime<Utc>,
    /// Expected input columns, in order: numeric columns then indicators
    pub model_cols: Vec<String>,
    pub numeric: NumericPreprocessor,
    pub categorical: CategoricalEncoder,
    pub classifier: LogisticModel,
}

impl ModelArtifact {
    pub fn new(
        numeric: NumericPreprocessor,
        categorical: CategoricalEncoder,
        classifier: LogisticModel,
    ) -> Self {
        let mut model_cols = numeric.columns.clone();
        model_cols.extend(categorical.output_columns());
        ModelArtifact {
            artifact_id: Uuid::new_v4(),
            producer: PRODUCER_NAME.to_string(),
            version: CRIVO_VERSION.to_string(),
            trained_at: Utc::now(),
            model_cols,
            numeric,
            categorical,
            classifier,
        }
    }

    /// Serialize to the given path, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously persisted artifact; a missing or unreadable file is
    /// reported as artifact-unavailable, not a panic
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::ArtifactUnavailable(format!(
                "no artifact at {}",
                path.display()
            )));
        }
        let json = fs::read_to_string(path)?;
        let artifact = serde_json::from_str(&json)
            .map_err(|e| PipelineError::ArtifactUnavailable(e.to_string()))?;
        Ok(artifact)
    }

    /// Probability of the positive class for a `model_cols`-aligned row
    pub fn predict_proba(&self, aligned: &[f64]) -> Result<f64, PipelineError> {
        let preprocessed = self.preprocess_row(aligned)?;
        Ok(self.classifier.predict_proba(&preprocessed))
    }

    /// Class label at the 0.5 threshold for a `model_cols`-aligned row
    pub fn predict_label(&self, aligned: &[f64]) -> Result<i64, PipelineError> {
        let preprocessed = self.preprocess_row(aligned)?;
        Ok(self.classifier.predict(&preprocessed))
    }

    /// Impute and scale the numeric prefix; indicators pass through
    fn preprocess_row(&self, aligned: &[f64]) -> Result<Vec<f64>, PipelineError> {
        if aligned.len() != self.model_cols.len() {
            return Err(PipelineError::PredictionFailed(format!(
                "expected {} input columns, got {}",
                self.model_cols.len(),
                aligned.len()
            )));
        }
        let n_numeric = self.numeric.columns.len();
        let mut row = Vec::with_capacity(aligned.len());
        for (i, value) in aligned.iter().enumerate() {
            if i < n_numeric {
                row.push(self.numeric.transform(i, Some(*value)));
            } else {
                row.push(*value);
            }
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn toy_artifact() -> ModelArtifact {
        let numeric = NumericPreprocessor::fit(
            vec!["income".to_string()],
            &[vec![Some(1000.0), Some(3000.0)]],
        );
        let categorical = CategoricalEncoder::fit(
            vec!["score_bucket".to_string()],
            &[vec![Some("alto".to_string()), Some("baixo".to_string())]],
        );
        let classifier = LogisticModel {
            weights: vec![1.0, 0.5, -0.5],
            intercept: 0.1,
            positive_label: 1,
        };
        ModelArtifact::new(numeric, categorical, classifier)
    }

    #[test]
    fn test_model_cols_order_is_numeric_then_indicators() {
        let artifact = toy_artifact();
        assert_eq!(
            artifact.model_cols,
            vec![
                "income".to_string(),
                "score_bucket=alto".to_string(),
                "score_bucket=baixo".to_string(),
            ]
        );
    }

    #[test]
    fn test_save_load_round_trip() {
        let artifact = toy_artifact();
        let dir = std::env::temp_dir().join(format!("crivo-artifact-{}", std::process::id()));
        let path = dir.join("model.json");
        artifact.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded, artifact);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_artifact_is_unavailable() {
        let err = ModelArtifact::load(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactUnavailable(_)));
    }

    #[test]
    fn test_predict_scales_numeric_prefix() {
        let artifact = toy_artifact();
        // income 2000 centers to 0; only indicator terms and intercept remain
        let p = artifact.predict_proba(&[2000.0, 1.0, 0.0]).unwrap();
        let expected = 1.0 / (1.0 + (-(0.5 + 0.1f64)).exp());
        assert_relative_eq!(p, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_width_mismatch_is_prediction_failure() {
        let artifact = toy_artifact();
        let err = artifact.predict_proba(&[2000.0]).unwrap_err();
        assert!(matches!(err, PipelineError::PredictionFailed(_)));
    }
}
