use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;

use super::features::FeatureVector;

/// Score substituted when a classifier only reports a label.
pub const POSITIVE_LABEL_SCORE: u8 = 75;
pub const NEGATIVE_LABEL_SCORE: u8 = 25;

/// Trained model capable of labelling a feature vector.
///
/// `predict` is required. Probability estimates are optional and advertised
/// through `supports_probability`; the adapter never calls `predict_proba`
/// on a classifier that does not advertise it.
pub trait Classifier: Send + Sync {
    /// Model family name reported to operators (e.g. `LogisticRegression`).
    fn kind(&self) -> &str;

    /// Column names the model was fitted against, when known.
    fn feature_names(&self) -> &[String] {
        &[]
    }

    fn predict(&self, features: &FeatureVector) -> Result<bool, ClassifierError>;

    fn supports_probability(&self) -> bool {
        false
    }

    /// Probability of the positive class.
    fn predict_proba(&self, _features: &FeatureVector) -> Result<f64, ClassifierError> {
        Err(ClassifierError::Unsupported("predict_proba"))
    }
}

/// Failure raised by a classifier implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("capability '{0}' is not supported")]
    Unsupported(&'static str),
    #[error("{0}")]
    Internal(String),
}

/// The adapter could not produce a verdict; callers fall back to the heuristic path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdapterFailure {
    #[error("classifier '{classifier}' failed: {source}")]
    Classifier {
        classifier: String,
        #[source]
        source: ClassifierError,
    },
    #[error("classifier '{classifier}' returned invalid probability {probability}")]
    InvalidProbability { classifier: String, probability: f64 },
    #[error("classifier '{classifier}' panicked: {detail}")]
    Panicked { classifier: String, detail: String },
}

/// Score and label derived from a classifier call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelVerdict {
    pub risk_score: u8,
    pub has_heart_disease: bool,
    pub probability: Option<f64>,
}

/// Metadata exposed by the model info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDescription {
    pub model_type: String,
    pub has_probability: bool,
    pub feature_names: Vec<String>,
}

/// Uniform scoring front for an optional trained classifier.
#[derive(Clone)]
pub struct ClassifierAdapter {
    classifier: Arc<dyn Classifier>,
}

impl ClassifierAdapter {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn describe(&self) -> ModelDescription {
        ModelDescription {
            model_type: self.classifier.kind().to_string(),
            has_probability: self.classifier.supports_probability(),
            feature_names: self.classifier.feature_names().to_vec(),
        }
    }

    /// Scores the vector, converting classifier errors and panics into [`AdapterFailure`].
    pub fn assess(&self, features: &FeatureVector) -> Result<ModelVerdict, AdapterFailure> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.invoke(features))) {
            Ok(result) => result,
            Err(payload) => Err(AdapterFailure::Panicked {
                classifier: self.classifier.kind().to_string(),
                detail: panic_detail(payload.as_ref()),
            }),
        }
    }

    fn invoke(&self, features: &FeatureVector) -> Result<ModelVerdict, AdapterFailure> {
        if !self.classifier.supports_probability() {
            let positive = self
                .classifier
                .predict(features)
                .map_err(|source| self.failure(source))?;
            let risk_score = if positive {
                POSITIVE_LABEL_SCORE
            } else {
                NEGATIVE_LABEL_SCORE
            };
            return Ok(ModelVerdict {
                risk_score,
                has_heart_disease: positive,
                probability: None,
            });
        }

        let probability = self
            .classifier
            .predict_proba(features)
            .map_err(|source| self.failure(source))?;
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(AdapterFailure::InvalidProbability {
                classifier: self.classifier.kind().to_string(),
                probability,
            });
        }

        Ok(ModelVerdict {
            risk_score: (probability * 100.0).round() as u8,
            has_heart_disease: probability > 0.5,
            probability: Some(probability),
        })
    }

    fn failure(&self, source: ClassifierError) -> AdapterFailure {
        AdapterFailure::Classifier {
            classifier: self.classifier.kind().to_string(),
            source,
        }
    }
}

impl fmt::Debug for ClassifierAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierAdapter")
            .field("kind", &self.classifier.kind())
            .field("probability", &self.classifier.supports_probability())
            .finish()
    }
}

pub(crate) fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
