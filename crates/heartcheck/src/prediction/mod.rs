//! Cardiac risk scoring pipeline.
//!
//! A [`PatientRecord`] is encoded into a [`FeatureVector`] for an optional
//! trained classifier; when no classifier is usable the additive
//! [`HeuristicScorer`] answers instead. [`DecisionRouter`] owns that fallback
//! chain and always produces a [`RiskAssessment`].

pub mod assessment;
pub mod classifier;
pub mod decision;
pub mod features;
pub mod heuristic;
pub mod model;
pub mod record;
pub mod router;

pub use assessment::{
    PredictionResponse, RiskAssessment, FAIL_SAFE_FACTOR, FAIL_SAFE_SCORE, HEURISTIC_MESSAGE,
    MODEL_MESSAGE,
};
pub use classifier::{
    AdapterFailure, Classifier, ClassifierAdapter, ClassifierError, ModelDescription,
    ModelVerdict, NEGATIVE_LABEL_SCORE, POSITIVE_LABEL_SCORE,
};
pub use decision::{
    Configuration, DecisionRouter, PipelineFailure, Prediction, PredictionPath, Stage, Transition,
};
pub use features::{column_index, FeatureEncoder, FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};
pub use heuristic::{
    HeuristicOutcome, HeuristicScorer, RuleContribution, RuleProfile, UnknownRuleProfile,
};
pub use model::{load_classifier, LogisticModel, LogisticModelFile, ModelLoadError, StandardScaler};
pub use record::{
    Attribute, Category, ChestPainType, ClinicalSnapshot, ExerciseAngina, Observed,
    PatientRecord, RestingEcg, Sex, StSlope, ValidationError,
};
pub use router::prediction_router;

#[cfg(test)]
mod tests;
