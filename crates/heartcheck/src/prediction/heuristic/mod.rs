mod profile;
mod rules;

pub use profile::{RuleProfile, UnknownRuleProfile};

use super::assessment::RiskAssessment;
use super::record::{Attribute, ClinicalSnapshot, PatientRecord, ValidationError};
use rules::RULE_TABLE;
use serde::Serialize;

/// Stateless additive scorer over the rule table for one profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer {
    profile: RuleProfile,
}

impl HeuristicScorer {
    pub fn new(profile: RuleProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> RuleProfile {
        self.profile
    }

    pub fn score(&self, record: &PatientRecord) -> Result<HeuristicOutcome, ValidationError> {
        let snapshot = ClinicalSnapshot::from_record(record)?;
        Ok(self.score_snapshot(&snapshot))
    }

    pub fn score_snapshot(&self, snapshot: &ClinicalSnapshot) -> HeuristicOutcome {
        let contributions: Vec<RuleContribution> = RULE_TABLE
            .iter()
            .filter_map(|group| {
                group
                    .evaluate(self.profile, snapshot)
                    .map(|tier| RuleContribution {
                        attribute: group.attribute,
                        points: tier.points,
                        label: tier.label,
                    })
            })
            .collect();

        let total: u32 = contributions
            .iter()
            .map(|contribution| u32::from(contribution.points))
            .sum();
        let risk_score = total.min(100) as u8;

        HeuristicOutcome {
            profile: self.profile,
            risk_score,
            has_heart_disease: self.profile.classify(risk_score),
            risk_factors: contributions
                .iter()
                .filter_map(|contribution| contribution.label)
                .map(str::to_string)
                .collect(),
            contributions,
        }
    }
}

/// The tier that fired for one rule group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleContribution {
    pub attribute: Attribute,
    pub points: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'static str>,
}

/// Heuristic score plus the audit trail that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeuristicOutcome {
    pub profile: RuleProfile,
    pub risk_score: u8,
    pub has_heart_disease: bool,
    pub risk_factors: Vec<String>,
    pub contributions: Vec<RuleContribution>,
}

impl HeuristicOutcome {
    pub fn into_assessment(self) -> RiskAssessment {
        RiskAssessment::new(
            self.risk_score,
            self.has_heart_disease,
            self.risk_factors,
            false,
        )
    }
}
