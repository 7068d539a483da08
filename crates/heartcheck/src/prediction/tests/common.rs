use std::sync::Arc;

use axum::response::Response;
use serde_json::{json, Value};

use crate::prediction::{
    Attribute, Classifier, ClassifierError, Configuration, DecisionRouter, FeatureVector,
    PatientRecord, RuleProfile,
};

/// Record that fires the top tier of every full-profile group.
pub(super) fn high_risk_record() -> PatientRecord {
    record(json!({
        "Age": 70,
        "Sex": "M",
        "ChestPainType": "TA",
        "RestingBP": 170,
        "Cholesterol": 300,
        "FastingBS": 1,
        "RestingECG": "LVH",
        "MaxHR": 90,
        "ExerciseAngina": "Y",
        "Oldpeak": 3.5,
        "ST_Slope": "Down"
    }))
}

pub(super) fn low_risk_record() -> PatientRecord {
    record(json!({
        "Age": 30,
        "Sex": "F",
        "ChestPainType": "NAP",
        "RestingBP": 110,
        "Cholesterol": 180,
        "FastingBS": 0,
        "RestingECG": "Normal",
        "MaxHR": 185,
        "ExerciseAngina": "N",
        "Oldpeak": 0.0,
        "ST_Slope": "Up"
    }))
}

pub(super) fn record(value: Value) -> PatientRecord {
    serde_json::from_value(value).expect("record fixture parses")
}

pub(super) fn heuristic_router(profile: RuleProfile) -> DecisionRouter {
    DecisionRouter::new(Arc::new(Configuration::heuristic_only(profile)))
}

pub(super) fn model_router(
    classifier: impl Classifier + 'static,
    profile: RuleProfile,
) -> DecisionRouter {
    DecisionRouter::new(Arc::new(Configuration::with_classifier(
        Arc::new(classifier),
        profile,
    )))
}

pub(super) fn age_only(age: f64) -> PatientRecord {
    PatientRecord::default().with(Attribute::Age, age)
}

/// Reports the same positive-class probability for every vector.
pub(super) struct FixedProbability(pub f64);

impl Classifier for FixedProbability {
    fn kind(&self) -> &str {
        "FixedProbability"
    }

    fn predict(&self, _features: &FeatureVector) -> Result<bool, ClassifierError> {
        Ok(self.0 > 0.5)
    }

    fn supports_probability(&self) -> bool {
        true
    }

    fn predict_proba(&self, _features: &FeatureVector) -> Result<f64, ClassifierError> {
        Ok(self.0)
    }
}

/// Label-only classifier.
pub(super) struct LabelOnly(pub bool);

impl Classifier for LabelOnly {
    fn kind(&self) -> &str {
        "LabelOnly"
    }

    fn predict(&self, _features: &FeatureVector) -> Result<bool, ClassifierError> {
        Ok(self.0)
    }
}

pub(super) struct Failing;

impl Classifier for Failing {
    fn kind(&self) -> &str {
        "Failing"
    }

    fn predict(&self, features: &FeatureVector) -> Result<bool, ClassifierError> {
        Err(ClassifierError::ShapeMismatch {
            expected: 13,
            actual: features.len(),
        })
    }

    fn supports_probability(&self) -> bool {
        true
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ClassifierError> {
        Err(ClassifierError::ShapeMismatch {
            expected: 13,
            actual: features.len(),
        })
    }
}

pub(super) struct Panicking;

impl Classifier for Panicking {
    fn kind(&self) -> &str {
        "Panicking"
    }

    fn predict(&self, _features: &FeatureVector) -> Result<bool, ClassifierError> {
        panic!("classifier exploded");
    }
}

/// Advertises probabilities but only ever returns the wrapped value.
pub(super) struct BadProbability(pub f64);

impl Classifier for BadProbability {
    fn kind(&self) -> &str {
        "BadProbability"
    }

    fn predict(&self, _features: &FeatureVector) -> Result<bool, ClassifierError> {
        Ok(true)
    }

    fn supports_probability(&self) -> bool {
        true
    }

    fn predict_proba(&self, _features: &FeatureVector) -> Result<f64, ClassifierError> {
        Ok(self.0)
    }
}

/// Keeps the last vector it saw so tests can inspect the encoding.
#[derive(Default)]
pub(super) struct Recording {
    pub seen: std::sync::Mutex<Option<FeatureVector>>,
}

impl Classifier for Recording {
    fn kind(&self) -> &str {
        "Recording"
    }

    fn predict(&self, features: &FeatureVector) -> Result<bool, ClassifierError> {
        *self.seen.lock().expect("recording mutex poisoned") = Some(features.clone());
        Ok(false)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn keys(value: &Value) -> Vec<String> {
    let mut keys: Vec<String> = value
        .as_object()
        .expect("json object")
        .keys()
        .cloned()
        .collect();
    keys.sort();
    keys
}
