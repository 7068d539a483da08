use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Selects which column of the rule table the heuristic scorer applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleProfile {
    /// Granular deltas, age-relative heart rate rule, threshold 60.
    #[default]
    Full,
    /// Smaller deltas, fixed heart rate cut-off, threshold 50.
    Lite,
}

impl RuleProfile {
    pub const FULL_THRESHOLD: u8 = 60;
    pub const LITE_THRESHOLD: u8 = 50;

    pub fn threshold(self) -> u8 {
        match self {
            RuleProfile::Full => Self::FULL_THRESHOLD,
            RuleProfile::Lite => Self::LITE_THRESHOLD,
        }
    }

    /// Positive classification requires a score strictly above the threshold.
    pub fn classify(self, risk_score: u8) -> bool {
        risk_score > self.threshold()
    }

    pub fn label(self) -> &'static str {
        match self {
            RuleProfile::Full => "full",
            RuleProfile::Lite => "lite",
        }
    }
}

impl fmt::Display for RuleProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rule profile '{0}' (expected 'full' or 'lite')")]
pub struct UnknownRuleProfile(pub String);

impl FromStr for RuleProfile {
    type Err = UnknownRuleProfile;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(RuleProfile::Full),
            "lite" => Ok(RuleProfile::Lite),
            _ => Err(UnknownRuleProfile(value.to_string())),
        }
    }
}
