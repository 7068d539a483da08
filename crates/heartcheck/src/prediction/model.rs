//! Portable logistic-regression classifier loaded from a JSON model file.
//!
//! The file mirrors what a fitted scikit-learn `StandardScaler` +
//! `LogisticRegression` pipeline exports:
//!
//! ```json
//! {
//!   "model_type": "LogisticRegression",
//!   "feature_names": ["Age", "RestingBP", "..."],
//!   "coefficients": [0.04, 0.01, "..."],
//!   "intercept": -1.2,
//!   "scaler": { "mean": ["..."], "scale": ["..."] },
//!   "probability": true
//! }
//! ```
//!
//! `feature_names` may be omitted; when present it must match
//! [`FEATURE_COLUMNS`] exactly.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::classifier::{Classifier, ClassifierError};
use super::features::{FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};

/// On-disk representation of a logistic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModelFile {
    #[serde(default = "default_model_type")]
    pub model_type: String,
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    /// `false` models only expose a hard label.
    #[serde(default = "default_probability")]
    pub probability: bool,
}

fn default_model_type() -> String {
    "LogisticRegression".to_string()
}

fn default_probability() -> bool {
    true
}

/// Per-column standardisation applied before the linear term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Error raised while loading a model file at startup.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("unable to read model file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model schema mismatch: {0}")]
    Schema(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticModel {
    model_type: String,
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
    scaler: Option<StandardScaler>,
    probability: bool,
}

impl LogisticModel {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ModelLoadError> {
        let file: LogisticModelFile = serde_json::from_str(raw)?;
        Self::from_file(file)
    }

    pub fn from_file(file: LogisticModelFile) -> Result<Self, ModelLoadError> {
        let LogisticModelFile {
            model_type,
            feature_names,
            coefficients,
            intercept,
            scaler,
            probability,
        } = file;

        let feature_names = if feature_names.is_empty() {
            FEATURE_COLUMNS.iter().map(|name| name.to_string()).collect()
        } else if feature_names.iter().map(String::as_str).eq(FEATURE_COLUMNS) {
            feature_names
        } else {
            return Err(ModelLoadError::Schema(format!(
                "feature_names must be {FEATURE_COLUMNS:?}, got {feature_names:?}"
            )));
        };

        expect_width("coefficients", &coefficients)?;
        if !intercept.is_finite() {
            return Err(ModelLoadError::Schema("intercept must be finite".to_string()));
        }
        if let Some(scaler) = &scaler {
            expect_width("scaler.mean", &scaler.mean)?;
            expect_width("scaler.scale", &scaler.scale)?;
            if scaler.scale.iter().any(|scale| *scale == 0.0) {
                return Err(ModelLoadError::Schema(
                    "scaler.scale entries must be non-zero".to_string(),
                ));
            }
        }

        Ok(Self {
            model_type,
            feature_names,
            coefficients,
            intercept,
            scaler,
            probability,
        })
    }

    /// Linear decision value; positive means the disease class.
    pub fn decision_function(&self, features: &FeatureVector) -> Result<f64, ClassifierError> {
        let values = features.as_slice();
        if values.len() != self.coefficients.len() {
            return Err(ClassifierError::ShapeMismatch {
                expected: self.coefficients.len(),
                actual: values.len(),
            });
        }

        let mut z = self.intercept;
        for (index, (value, weight)) in values.iter().zip(&self.coefficients).enumerate() {
            let value = match &self.scaler {
                Some(scaler) => (value - scaler.mean[index]) / scaler.scale[index],
                None => *value,
            };
            z += weight * value;
        }

        if z.is_finite() {
            Ok(z)
        } else {
            Err(ClassifierError::Internal(format!(
                "non-finite decision value {z}"
            )))
        }
    }
}

fn expect_width(field: &str, values: &[f64]) -> Result<(), ModelLoadError> {
    if values.len() != FEATURE_COUNT {
        return Err(ModelLoadError::Schema(format!(
            "{field} must have {FEATURE_COUNT} entries, got {}",
            values.len()
        )));
    }
    if values.iter().any(|value| !value.is_finite()) {
        return Err(ModelLoadError::Schema(format!("{field} must be finite")));
    }
    Ok(())
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LogisticModel {
    fn kind(&self) -> &str {
        &self.model_type
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, features: &FeatureVector) -> Result<bool, ClassifierError> {
        Ok(self.decision_function(features)? > 0.0)
    }

    fn supports_probability(&self) -> bool {
        self.probability
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ClassifierError> {
        if !self.probability {
            return Err(ClassifierError::Unsupported("predict_proba"));
        }
        Ok(sigmoid(self.decision_function(features)?))
    }
}

/// Loads the configured classifier for the process lifetime.
pub fn load_classifier(path: impl AsRef<Path>) -> Result<Arc<dyn Classifier>, ModelLoadError> {
    let model = LogisticModel::load(path)?;
    Ok(Arc::new(model))
}
