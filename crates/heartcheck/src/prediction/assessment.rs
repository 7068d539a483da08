use serde::{Deserialize, Serialize};

pub const FAIL_SAFE_SCORE: u8 = 50;
pub const FAIL_SAFE_FACTOR: &str = "Error occurred during prediction";

pub const MODEL_MESSAGE: &str = "Prediction from trained model";
pub const HEURISTIC_MESSAGE: &str = "Prediction from heuristic rules (model not available)";

/// Scored result returned for every prediction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub risk_score: u8,
    pub has_heart_disease: bool,
    pub risk_factors: Vec<String>,
    pub model_used: bool,
}

impl RiskAssessment {
    /// Scores above 100 are clamped.
    pub fn new(
        risk_score: u8,
        has_heart_disease: bool,
        risk_factors: Vec<String>,
        model_used: bool,
    ) -> Self {
        Self {
            risk_score: risk_score.min(100),
            has_heart_disease,
            risk_factors,
            model_used,
        }
    }

    pub fn fail_safe() -> Self {
        Self::new(
            FAIL_SAFE_SCORE,
            false,
            vec![FAIL_SAFE_FACTOR.to_string()],
            false,
        )
    }
}

/// Wire payload: the assessment plus which path produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(flatten)]
    pub assessment: RiskAssessment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
