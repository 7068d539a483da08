use super::super::record::{Attribute, ClinicalSnapshot};
use super::profile::RuleProfile;

/// Predicate over the reading of a group's attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Condition {
    Above(f64),
    AtLeast(f64),
    Below(f64),
    Equals(f64),
    Is(&'static str),
    /// Reading below a fraction of the age-predicted maximum, `220 - age`.
    BelowPredictedMaxHr(f64),
}

impl Condition {
    fn holds(&self, attribute: Attribute, snapshot: &ClinicalSnapshot) -> bool {
        let reading = snapshot.numeric(attribute);
        match *self {
            Condition::Above(limit) => reading.is_some_and(|value| value > limit),
            Condition::AtLeast(limit) => reading.is_some_and(|value| value >= limit),
            Condition::Below(limit) => reading.is_some_and(|value| value < limit),
            Condition::Equals(expected) => reading.is_some_and(|value| value == expected),
            Condition::Is(code) => snapshot.category_code(attribute) == Some(code),
            Condition::BelowPredictedMaxHr(fraction) => {
                let predicted = 220.0 - snapshot.age;
                reading.is_some_and(|value| value < predicted * fraction)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Tier {
    pub condition: Condition,
    pub points: u8,
    pub label: Option<&'static str>,
}

const fn tier(condition: Condition, points: u8, label: &'static str) -> Tier {
    Tier {
        condition,
        points,
        label: Some(label),
    }
}

const fn unlabeled(condition: Condition, points: u8) -> Tier {
    Tier {
        condition,
        points,
        label: None,
    }
}

/// Tiers for one attribute, most severe first, per profile.
#[derive(Debug)]
pub(crate) struct RuleGroup {
    pub attribute: Attribute,
    full: &'static [Tier],
    lite: &'static [Tier],
}

impl RuleGroup {
    pub fn tiers(&self, profile: RuleProfile) -> &'static [Tier] {
        match profile {
            RuleProfile::Full => self.full,
            RuleProfile::Lite => self.lite,
        }
    }

    /// First matching tier; later tiers are never consulted once one fires.
    pub fn evaluate(
        &self,
        profile: RuleProfile,
        snapshot: &ClinicalSnapshot,
    ) -> Option<&'static Tier> {
        self.tiers(profile)
            .iter()
            .find(|tier| tier.condition.holds(self.attribute, snapshot))
    }
}

use Condition::{Above, AtLeast, Below, BelowPredictedMaxHr, Equals, Is};

pub(crate) static RULE_TABLE: [RuleGroup; 11] = [
    RuleGroup {
        attribute: Attribute::Age,
        full: &[
            tier(Above(65.0), 20, "Advanced age (>65)"),
            tier(Above(55.0), 12, "Older age (>55)"),
            unlabeled(Above(45.0), 6),
        ],
        lite: &[
            tier(Above(65.0), 15, "Advanced age"),
            unlabeled(Above(50.0), 8),
        ],
    },
    RuleGroup {
        attribute: Attribute::Sex,
        full: &[tier(Is("M"), 8, "Male gender")],
        lite: &[unlabeled(Is("M"), 5)],
    },
    RuleGroup {
        attribute: Attribute::ChestPainType,
        full: &[
            tier(Is("TA"), 25, "Typical angina symptoms"),
            tier(Is("ATA"), 15, "Atypical chest pain"),
            tier(Is("ASY"), 10, "Asymptomatic presentation"),
        ],
        lite: &[
            tier(Is("TA"), 20, "Typical angina symptoms"),
            tier(Is("ATA"), 10, "Atypical chest pain"),
            unlabeled(Is("ASY"), 5),
        ],
    },
    RuleGroup {
        attribute: Attribute::RestingBp,
        full: &[
            tier(AtLeast(160.0), 18, "Very high blood pressure"),
            tier(AtLeast(140.0), 12, "High blood pressure"),
            tier(AtLeast(130.0), 6, "Elevated blood pressure"),
        ],
        lite: &[
            tier(Above(140.0), 15, "High blood pressure"),
            unlabeled(Above(130.0), 8),
        ],
    },
    RuleGroup {
        attribute: Attribute::Cholesterol,
        full: &[
            tier(AtLeast(280.0), 18, "Very high cholesterol"),
            tier(AtLeast(240.0), 12, "High cholesterol"),
            tier(AtLeast(200.0), 6, "Borderline high cholesterol"),
        ],
        lite: &[
            tier(Above(240.0), 15, "High cholesterol"),
            unlabeled(Above(200.0), 8),
        ],
    },
    RuleGroup {
        attribute: Attribute::FastingBs,
        full: &[tier(Equals(1.0), 12, "Elevated fasting blood sugar")],
        lite: &[tier(Equals(1.0), 10, "Elevated fasting blood sugar")],
    },
    RuleGroup {
        attribute: Attribute::RestingEcg,
        full: &[
            tier(Is("LVH"), 15, "Left ventricular hypertrophy"),
            tier(Is("ST"), 10, "ECG abnormalities"),
        ],
        lite: &[
            tier(Is("LVH"), 12, "Left ventricular hypertrophy"),
            tier(Is("ST"), 8, "ECG abnormalities"),
        ],
    },
    RuleGroup {
        attribute: Attribute::MaxHr,
        full: &[
            tier(BelowPredictedMaxHr(0.7), 15, "Poor exercise capacity"),
            tier(BelowPredictedMaxHr(0.8), 8, "Reduced exercise capacity"),
        ],
        lite: &[tier(Below(100.0), 12, "Low maximum heart rate")],
    },
    RuleGroup {
        attribute: Attribute::ExerciseAngina,
        full: &[tier(Is("Y"), 20, "Exercise-induced chest pain")],
        lite: &[tier(Is("Y"), 15, "Exercise-induced chest pain")],
    },
    RuleGroup {
        attribute: Attribute::Oldpeak,
        full: &[
            tier(AtLeast(3.0), 20, "Severe ST depression"),
            tier(AtLeast(2.0), 15, "Significant ST depression"),
            tier(AtLeast(1.0), 8, "Mild ST depression"),
        ],
        lite: &[
            tier(Above(2.0), 15, "Significant ST depression"),
            unlabeled(Above(1.0), 8),
        ],
    },
    RuleGroup {
        attribute: Attribute::StSlope,
        full: &[
            tier(Is("Down"), 15, "Downsloping ST segment"),
            tier(Is("Flat"), 8, "Flat ST segment"),
        ],
        lite: &[
            tier(Is("Down"), 12, "Downsloping ST segment"),
            unlabeled(Is("Flat"), 6),
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_follows_attribute_order() {
        let order: Vec<Attribute> = RULE_TABLE.iter().map(|group| group.attribute).collect();
        assert_eq!(order, Attribute::ALL);
    }

    #[test]
    fn tiers_are_ordered_by_descending_points() {
        for profile in [RuleProfile::Full, RuleProfile::Lite] {
            for group in &RULE_TABLE {
                let points: Vec<u8> = group.tiers(profile).iter().map(|tier| tier.points).collect();
                let mut sorted = points.clone();
                sorted.sort_unstable_by(|a, b| b.cmp(a));
                assert_eq!(
                    points, sorted,
                    "{} tiers out of order for {profile}",
                    group.attribute
                );
            }
        }
    }

    #[test]
    fn full_profile_labels_every_top_tier() {
        for group in &RULE_TABLE {
            let top = group.tiers(RuleProfile::Full).first().expect("group has tiers");
            assert!(top.label.is_some(), "{} top tier lacks a label", group.attribute);
        }
    }
}
