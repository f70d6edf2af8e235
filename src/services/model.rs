//! Classifier holder.
//!
//! The pipeline treats the model as a black box behind a narrow contract:
//! an ordered feature-name list in, a two-class probability pair out. The
//! concrete artifact is a logistic model serialized as JSON alongside its
//! metadata, loaded once at startup and shared read-only across requests.
//! Class 0 is under-2.5, class 1 is over-2.5 (fixed by training).

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("model not loaded")]
    ModelNotLoaded,
    #[error("model expects unknown feature `{0}`")]
    UnknownFeature(String),
    #[error("feature vector length {got} does not match model dimensionality {expected}")]
    DimensionMismatch { got: usize, expected: usize },
}

/// On-disk model artifact: logistic weights plus the metadata the pipeline
/// cross-checks against at request time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub version: String,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

struct LoadedModel {
    version: String,
    feature_names: Vec<String>,
    weights: DVector<f64>,
    intercept: f64,
}

/// Reported by `/health/model` and the `model-info` CLI command.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_loaded: bool,
    pub model_version: String,
    pub features_count: usize,
    pub last_prediction_at: Option<DateTime<Utc>>,
}

/// Construct-once service holding the loaded classifier. The only mutable
/// state is the load slot (written at startup) and the informational
/// last-prediction timestamp, where last-write-wins is acceptable.
pub struct ModelService {
    model: RwLock<Option<LoadedModel>>,
    last_prediction_at: RwLock<Option<DateTime<Utc>>>,
}

impl ModelService {
    pub fn new() -> Self {
        Self {
            model: RwLock::new(None),
            last_prediction_at: RwLock::new(None),
        }
    }

    /// Load the artifact from disk and install it.
    pub async fn load(&self, path: &Path) -> Result<()> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading model file {}", path.display()))?;
        let file: ModelFile =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

        self.install(file).await
    }

    /// Install an already-parsed artifact. Validates that the declared
    /// feature list and the weight vector agree before accepting it.
    pub async fn install(&self, file: ModelFile) -> Result<()> {
        if file.coefficients.len() != file.feature_names.len() {
            return Err(anyhow!(
                "model artifact declares {} features but carries {} coefficients",
                file.feature_names.len(),
                file.coefficients.len()
            ));
        }

        let loaded = LoadedModel {
            version: file.version,
            feature_names: file.feature_names,
            weights: DVector::from_vec(file.coefficients),
            intercept: file.intercept,
        };

        tracing::info!(
            "Model loaded: version {} ({} features)",
            loaded.version,
            loaded.feature_names.len()
        );

        *self.model.write().await = Some(loaded);
        Ok(())
    }

    pub async fn is_loaded(&self) -> bool {
        self.model.read().await.is_some()
    }

    pub async fn version(&self) -> Option<String> {
        self.model.read().await.as_ref().map(|m| m.version.clone())
    }

    /// The ordered feature-name list the model was trained with.
    pub async fn feature_names(&self) -> Option<Vec<String>> {
        self.model
            .read()
            .await
            .as_ref()
            .map(|m| m.feature_names.clone())
    }

    /// Class probabilities for a vector ordered per `feature_names`.
    /// Returns `(p_under, p_over)`; the pair always sums to exactly 1.0
    /// since the under probability is derived as the complement.
    pub async fn predict_proba(&self, vector: &[f64]) -> Result<(f64, f64), PredictionError> {
        let guard = self.model.read().await;
        let model = guard.as_ref().ok_or(PredictionError::ModelNotLoaded)?;

        if vector.len() != model.weights.len() {
            return Err(PredictionError::DimensionMismatch {
                got: vector.len(),
                expected: model.weights.len(),
            });
        }

        let x = DVector::from_column_slice(vector);
        let z = model.weights.dot(&x) + model.intercept;
        let p_over = 1.0 / (1.0 + (-z).exp());

        *self.last_prediction_at.write().await = Some(Utc::now());

        Ok((1.0 - p_over, p_over))
    }

    pub async fn info(&self) -> ModelInfo {
        let guard = self.model.read().await;
        ModelInfo {
            model_loaded: guard.is_some(),
            model_version: guard
                .as_ref()
                .map(|m| m.version.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            features_count: guard.as_ref().map(|m| m.feature_names.len()).unwrap_or(0),
            last_prediction_at: *self.last_prediction_at.read().await,
        }
    }
}

impl Default for ModelService {
    fn default() -> Self {
        Self::new()
    }
}
