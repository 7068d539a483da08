use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::assessment::{PredictionResponse, RiskAssessment, HEURISTIC_MESSAGE, MODEL_MESSAGE};
use super::classifier::{panic_detail, AdapterFailure, Classifier, ClassifierAdapter};
use super::features::FeatureEncoder;
use super::heuristic::{HeuristicScorer, RuleProfile};
use super::model::load_classifier;
use super::record::{ClinicalSnapshot, PatientRecord, ValidationError};

/// Immutable pipeline settings resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    classifier: Option<ClassifierAdapter>,
    profile: RuleProfile,
}

impl Configuration {
    pub fn heuristic_only(profile: RuleProfile) -> Self {
        Self {
            classifier: None,
            profile,
        }
    }

    pub fn with_classifier(classifier: Arc<dyn Classifier>, profile: RuleProfile) -> Self {
        Self {
            classifier: Some(ClassifierAdapter::new(classifier)),
            profile,
        }
    }

    /// Loads the classifier at `model_path`, downgrading to heuristic-only
    /// scoring for the process lifetime when the file cannot be used.
    pub fn load(profile: RuleProfile, model_path: Option<&Path>) -> Self {
        let Some(path) = model_path else {
            info!(%profile, "no classifier configured; using heuristic rules");
            return Self::heuristic_only(profile);
        };

        match load_classifier(path) {
            Ok(classifier) => {
                info!(
                    path = %path.display(),
                    model_type = classifier.kind(),
                    has_probability = classifier.supports_probability(),
                    %profile,
                    "classifier loaded"
                );
                Self::with_classifier(classifier, profile)
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    %profile,
                    "classifier unavailable; falling back to heuristic rules"
                );
                Self::heuristic_only(profile)
            }
        }
    }

    pub fn profile(&self) -> RuleProfile {
        self.profile
    }

    pub fn classifier(&self) -> Option<&ClassifierAdapter> {
        self.classifier.as_ref()
    }

    pub fn model_loaded(&self) -> bool {
        self.classifier.is_some()
    }
}

/// Which stage produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionPath {
    Model,
    Heuristic,
    FailSafe,
}

impl PredictionPath {
    pub fn label(self) -> &'static str {
        match self {
            PredictionPath::Model => "model",
            PredictionPath::Heuristic => "heuristic",
            PredictionPath::FailSafe => "fail_safe",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineFailure {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Adapter(#[from] AdapterFailure),
    #[error("request body must be a JSON object: {0}")]
    Payload(String),
    #[error("unexpected failure: {0}")]
    Unhandled(String),
}

/// Result of one routed prediction.
///
/// `failure` is the cause of a fail-safe result, or the model failure that
/// pushed a request onto the heuristic path.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub path: PredictionPath,
    pub assessment: RiskAssessment,
    pub failure: Option<PipelineFailure>,
}

impl Prediction {
    pub fn fail_safe(failure: PipelineFailure) -> Self {
        Self {
            path: PredictionPath::FailSafe,
            assessment: RiskAssessment::fail_safe(),
            failure: Some(failure),
        }
    }

    pub fn is_fail_safe(&self) -> bool {
        self.path == PredictionPath::FailSafe
    }

    pub fn message(&self) -> Option<&'static str> {
        match self.path {
            PredictionPath::Model => Some(MODEL_MESSAGE),
            PredictionPath::Heuristic => Some(HEURISTIC_MESSAGE),
            PredictionPath::FailSafe => None,
        }
    }

    pub fn into_payload(self) -> PredictionResponse {
        let message = self.message().map(str::to_string);
        let error = match self.path {
            PredictionPath::FailSafe => self.failure.map(|failure| failure.to_string()),
            PredictionPath::Model | PredictionPath::Heuristic => None,
        };
        PredictionResponse {
            assessment: self.assessment,
            message,
            error,
        }
    }
}

/// Position in the fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Classifier,
    Heuristic { fallback: Option<PipelineFailure> },
    FailSafe(PipelineFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Next(Stage),
    Finished(Prediction),
}

/// Routes each record through classifier, heuristic and fail-safe stages.
#[derive(Debug, Clone)]
pub struct DecisionRouter {
    configuration: Arc<Configuration>,
    encoder: FeatureEncoder,
    scorer: HeuristicScorer,
}

impl DecisionRouter {
    pub fn new(configuration: Arc<Configuration>) -> Self {
        let scorer = HeuristicScorer::new(configuration.profile());
        Self {
            configuration,
            encoder: FeatureEncoder::new(),
            scorer,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn scorer(&self) -> &HeuristicScorer {
        &self.scorer
    }

    pub fn initial_stage(&self) -> Stage {
        if self.configuration.model_loaded() {
            Stage::Classifier
        } else {
            Stage::Heuristic { fallback: None }
        }
    }

    /// Runs one stage. Every stage either finishes or moves strictly later in
    /// the chain, so repeated application terminates.
    pub fn advance(&self, stage: Stage, record: &PatientRecord) -> Transition {
        match stage {
            Stage::Classifier => {
                let Some(adapter) = self.configuration.classifier() else {
                    return Transition::Next(Stage::Heuristic { fallback: None });
                };
                match self.model_assessment(adapter, record) {
                    Ok(assessment) => Transition::Finished(Prediction {
                        path: PredictionPath::Model,
                        assessment,
                        failure: None,
                    }),
                    Err(failure) => {
                        warn!(error = %failure, "classifier path failed; using heuristic rules");
                        Transition::Next(Stage::Heuristic {
                            fallback: Some(failure),
                        })
                    }
                }
            }
            Stage::Heuristic { fallback } => match self.scorer.score(record) {
                Ok(outcome) => Transition::Finished(Prediction {
                    path: PredictionPath::Heuristic,
                    assessment: outcome.into_assessment(),
                    failure: fallback,
                }),
                Err(err) => Transition::Next(Stage::FailSafe(err.into())),
            },
            Stage::FailSafe(failure) => {
                error!(error = %failure, "prediction failed; returning fail-safe assessment");
                Transition::Finished(Prediction::fail_safe(failure))
            }
        }
    }

    fn model_assessment(
        &self,
        adapter: &ClassifierAdapter,
        record: &PatientRecord,
    ) -> Result<RiskAssessment, PipelineFailure> {
        let snapshot = ClinicalSnapshot::from_record(record)?;
        let features = self.encoder.encode_snapshot(&snapshot);
        let verdict = adapter.assess(&features)?;
        debug!(
            risk_score = verdict.risk_score,
            probability = ?verdict.probability,
            "classifier verdict"
        );
        let risk_factors = self.scorer.score_snapshot(&snapshot).risk_factors;
        Ok(RiskAssessment::new(
            verdict.risk_score,
            verdict.has_heart_disease,
            risk_factors,
            true,
        ))
    }

    /// Never panics and never fails; unexpected errors yield the fail-safe assessment.
    pub fn predict(&self, record: &PatientRecord) -> Prediction {
        let routed = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut stage = self.initial_stage();
            loop {
                match self.advance(stage, record) {
                    Transition::Next(next) => stage = next,
                    Transition::Finished(prediction) => return prediction,
                }
            }
        }));

        match routed {
            Ok(prediction) => prediction,
            Err(payload) => {
                let failure = PipelineFailure::Unhandled(panic_detail(payload.as_ref()));
                error!(error = %failure, "prediction panicked; returning fail-safe assessment");
                Prediction::fail_safe(failure)
            }
        }
    }

    /// Any JSON object is accepted; other values route to the fail-safe.
    pub fn predict_value(&self, value: Value) -> Prediction {
        if !value.is_object() {
            return self.reject(format!("found {}", json_kind(&value)));
        }
        match serde_json::from_value::<PatientRecord>(value) {
            Ok(record) => self.predict(&record),
            Err(err) => self.reject(err.to_string()),
        }
    }

    pub fn predict_payload(&self, body: &[u8]) -> Prediction {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.predict_value(value),
            Err(err) => self.reject(err.to_string()),
        }
    }

    fn reject(&self, detail: String) -> Prediction {
        let failure = PipelineFailure::Payload(detail);
        error!(error = %failure, "rejected prediction payload");
        Prediction::fail_safe(failure)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
