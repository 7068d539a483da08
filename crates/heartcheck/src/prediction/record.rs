use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Clinical attributes carried by a patient record, in rule evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Age,
    Sex,
    ChestPainType,
    #[serde(rename = "RestingBP")]
    RestingBp,
    Cholesterol,
    #[serde(rename = "FastingBS")]
    FastingBs,
    #[serde(rename = "RestingECG")]
    RestingEcg,
    #[serde(rename = "MaxHR")]
    MaxHr,
    ExerciseAngina,
    Oldpeak,
    #[serde(rename = "ST_Slope")]
    StSlope,
}

impl Attribute {
    pub const ALL: [Attribute; 11] = [
        Attribute::Age,
        Attribute::Sex,
        Attribute::ChestPainType,
        Attribute::RestingBp,
        Attribute::Cholesterol,
        Attribute::FastingBs,
        Attribute::RestingEcg,
        Attribute::MaxHr,
        Attribute::ExerciseAngina,
        Attribute::Oldpeak,
        Attribute::StSlope,
    ];

    /// Key used for this attribute in request payloads.
    pub fn key(self) -> &'static str {
        match self {
            Attribute::Age => "Age",
            Attribute::Sex => "Sex",
            Attribute::ChestPainType => "ChestPainType",
            Attribute::RestingBp => "RestingBP",
            Attribute::Cholesterol => "Cholesterol",
            Attribute::FastingBs => "FastingBS",
            Attribute::RestingEcg => "RestingECG",
            Attribute::MaxHr => "MaxHR",
            Attribute::ExerciseAngina => "ExerciseAngina",
            Attribute::Oldpeak => "Oldpeak",
            Attribute::StSlope => "ST_Slope",
        }
    }

    pub fn is_categorical(self) -> bool {
        matches!(
            self,
            Attribute::Sex
                | Attribute::ChestPainType
                | Attribute::RestingEcg
                | Attribute::ExerciseAngina
                | Attribute::StSlope
        )
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Caller supplied attribute mapping.
///
/// Every field keeps the raw JSON value so malformed input reaches the
/// pipeline instead of being rejected by the transport. A key that is present
/// with `null` is kept as `Some(Value::Null)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientRecord {
    #[serde(
        rename = "Age",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub age: Option<Value>,
    #[serde(
        rename = "Sex",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub sex: Option<Value>,
    #[serde(
        rename = "ChestPainType",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub chest_pain_type: Option<Value>,
    #[serde(
        rename = "RestingBP",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub resting_bp: Option<Value>,
    #[serde(
        rename = "Cholesterol",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub cholesterol: Option<Value>,
    #[serde(
        rename = "FastingBS",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub fasting_bs: Option<Value>,
    #[serde(
        rename = "RestingECG",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub resting_ecg: Option<Value>,
    #[serde(
        rename = "MaxHR",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_hr: Option<Value>,
    #[serde(
        rename = "ExerciseAngina",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub exercise_angina: Option<Value>,
    #[serde(
        rename = "Oldpeak",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub oldpeak: Option<Value>,
    #[serde(
        rename = "ST_Slope",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub st_slope: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl PatientRecord {
    pub fn field(&self, attribute: Attribute) -> Option<&Value> {
        self.slot(attribute).as_ref()
    }

    /// Builder-style setter, mostly useful for tests and the CLI.
    pub fn with(mut self, attribute: Attribute, value: impl Into<Value>) -> Self {
        *self.slot_mut(attribute) = Some(value.into());
        self
    }

    pub fn without(mut self, attribute: Attribute) -> Self {
        *self.slot_mut(attribute) = None;
        self
    }

    fn slot(&self, attribute: Attribute) -> &Option<Value> {
        match attribute {
            Attribute::Age => &self.age,
            Attribute::Sex => &self.sex,
            Attribute::ChestPainType => &self.chest_pain_type,
            Attribute::RestingBp => &self.resting_bp,
            Attribute::Cholesterol => &self.cholesterol,
            Attribute::FastingBs => &self.fasting_bs,
            Attribute::RestingEcg => &self.resting_ecg,
            Attribute::MaxHr => &self.max_hr,
            Attribute::ExerciseAngina => &self.exercise_angina,
            Attribute::Oldpeak => &self.oldpeak,
            Attribute::StSlope => &self.st_slope,
        }
    }

    fn slot_mut(&mut self, attribute: Attribute) -> &mut Option<Value> {
        match attribute {
            Attribute::Age => &mut self.age,
            Attribute::Sex => &mut self.sex,
            Attribute::ChestPainType => &mut self.chest_pain_type,
            Attribute::RestingBp => &mut self.resting_bp,
            Attribute::Cholesterol => &mut self.cholesterol,
            Attribute::FastingBs => &mut self.fasting_bs,
            Attribute::RestingEcg => &mut self.resting_ecg,
            Attribute::MaxHr => &mut self.max_hr,
            Attribute::ExerciseAngina => &mut self.exercise_angina,
            Attribute::Oldpeak => &mut self.oldpeak,
            Attribute::StSlope => &mut self.st_slope,
        }
    }
}

/// A present field that cannot be read as its declared type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{attribute} must be numeric, got {found}")]
    NotNumeric { attribute: Attribute, found: String },
    #[error("{attribute} must not be null")]
    Null { attribute: Attribute },
}

impl ValidationError {
    pub fn attribute(&self) -> Attribute {
        match self {
            ValidationError::NotNumeric { attribute, .. } | ValidationError::Null { attribute } => {
                *attribute
            }
        }
    }
}

/// Closed category list for one categorical attribute.
pub trait Category: Copy + Eq + fmt::Debug + 'static {
    const ATTRIBUTE: Attribute;
    /// Variants in one-hot column order.
    const VARIANTS: &'static [Self];
    /// Substituted by the encoder when the field is absent.
    const BASELINE: Self;

    fn code(self) -> &'static str;

    fn from_code(code: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|variant| variant.code() == code)
    }
}

macro_rules! clinical_category {
    (
        $(#[$meta:meta])*
        $name:ident for $attribute:ident, baseline $baseline:ident {
            $($variant:ident => $code:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $code)] $variant),+
        }

        impl Category for $name {
            const ATTRIBUTE: Attribute = Attribute::$attribute;
            const VARIANTS: &'static [Self] = &[$(Self::$variant),+];
            const BASELINE: Self = Self::$baseline;

            fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }
    };
}

clinical_category! {
    Sex for Sex, baseline Male {
        Female => "F",
        Male => "M",
    }
}

clinical_category! {
    ChestPainType for ChestPainType, baseline Asymptomatic {
        Asymptomatic => "ASY",
        AtypicalAngina => "ATA",
        NonAnginalPain => "NAP",
        TypicalAngina => "TA",
    }
}

clinical_category! {
    /// Resting electrocardiogram result.
    RestingEcg for RestingEcg, baseline Normal {
        LeftVentricularHypertrophy => "LVH",
        Normal => "Normal",
        StTAbnormality => "ST",
    }
}

clinical_category! {
    ExerciseAngina for ExerciseAngina, baseline No {
        No => "N",
        Yes => "Y",
    }
}

clinical_category! {
    /// Slope of the peak exercise ST segment.
    StSlope for StSlope, baseline Flat {
        Down => "Down",
        Flat => "Flat",
        Up => "Up",
    }
}

/// Outcome of reading a categorical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observed<T> {
    Missing,
    Known(T),
    Unrecognized,
}

impl<T: Category> Observed<T> {
    fn read(record: &PatientRecord) -> Self {
        match record.field(T::ATTRIBUTE) {
            None => Observed::Missing,
            Some(Value::String(code)) => match T::from_code(code) {
                Some(variant) => Observed::Known(variant),
                None => Self::unrecognized(code),
            },
            Some(other) => Self::unrecognized(&other.to_string()),
        }
    }

    fn unrecognized(raw: &str) -> Self {
        tracing::debug!(
            attribute = %T::ATTRIBUTE,
            value = raw,
            "unrecognized category contributes nothing"
        );
        Observed::Unrecognized
    }

    pub fn known(self) -> Option<T> {
        match self {
            Observed::Known(variant) => Some(variant),
            Observed::Missing | Observed::Unrecognized => None,
        }
    }

    /// Category the encoder expands: baseline when absent, none when unrecognized.
    pub fn or_baseline(self) -> Option<T> {
        match self {
            Observed::Missing => Some(T::BASELINE),
            Observed::Known(variant) => Some(variant),
            Observed::Unrecognized => None,
        }
    }
}

/// Typed view of a patient record shared by the encoder and the heuristic scorer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClinicalSnapshot {
    pub age: f64,
    pub sex: Observed<Sex>,
    pub chest_pain_type: Observed<ChestPainType>,
    pub resting_bp: f64,
    pub cholesterol: f64,
    pub fasting_bs: f64,
    pub resting_ecg: Observed<RestingEcg>,
    pub max_hr: f64,
    pub exercise_angina: Observed<ExerciseAngina>,
    pub oldpeak: f64,
    pub st_slope: Observed<StSlope>,
}

impl ClinicalSnapshot {
    /// Absent numeric fields read as 0; present but unreadable ones are rejected.
    pub fn from_record(record: &PatientRecord) -> Result<Self, ValidationError> {
        Ok(Self {
            age: numeric(record, Attribute::Age)?,
            sex: Observed::read(record),
            chest_pain_type: Observed::read(record),
            resting_bp: numeric(record, Attribute::RestingBp)?,
            cholesterol: numeric(record, Attribute::Cholesterol)?,
            fasting_bs: numeric(record, Attribute::FastingBs)?,
            resting_ecg: Observed::read(record),
            max_hr: numeric(record, Attribute::MaxHr)?,
            exercise_angina: Observed::read(record),
            oldpeak: numeric(record, Attribute::Oldpeak)?,
            st_slope: Observed::read(record),
        })
    }

    /// Numeric reading for a numeric attribute, `None` for categorical ones.
    pub fn numeric(&self, attribute: Attribute) -> Option<f64> {
        match attribute {
            Attribute::Age => Some(self.age),
            Attribute::RestingBp => Some(self.resting_bp),
            Attribute::Cholesterol => Some(self.cholesterol),
            Attribute::FastingBs => Some(self.fasting_bs),
            Attribute::MaxHr => Some(self.max_hr),
            Attribute::Oldpeak => Some(self.oldpeak),
            _ => None,
        }
    }

    /// Code of a recognized category; absent and unrecognized values yield `None`.
    pub fn category_code(&self, attribute: Attribute) -> Option<&'static str> {
        match attribute {
            Attribute::Sex => self.sex.known().map(Category::code),
            Attribute::ChestPainType => self.chest_pain_type.known().map(Category::code),
            Attribute::RestingEcg => self.resting_ecg.known().map(Category::code),
            Attribute::ExerciseAngina => self.exercise_angina.known().map(Category::code),
            Attribute::StSlope => self.st_slope.known().map(Category::code),
            _ => None,
        }
    }
}

fn numeric(record: &PatientRecord, attribute: Attribute) -> Result<f64, ValidationError> {
    match record.field(attribute) {
        None => Ok(0.0),
        Some(Value::Number(number)) => {
            number
                .as_f64()
                .ok_or_else(|| ValidationError::NotNumeric {
                    attribute,
                    found: number.to_string(),
                })
        }
        Some(Value::String(raw)) => {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| ValidationError::NotNumeric {
                    attribute,
                    found: format!("{raw:?}"),
                })
        }
        Some(Value::Bool(flag)) => Ok(if *flag { 1.0 } else { 0.0 }),
        Some(Value::Null) => Err(ValidationError::Null { attribute }),
        Some(other) => Err(ValidationError::NotNumeric {
            attribute,
            found: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_fields_are_kept_distinct_from_absent_ones() {
        let record: PatientRecord =
            serde_json::from_value(json!({ "Age": null, "Sex": "F" })).expect("record parses");

        assert_eq!(record.field(Attribute::Age), Some(&Value::Null));
        assert_eq!(record.field(Attribute::Cholesterol), None);
        assert_eq!(
            ClinicalSnapshot::from_record(&record),
            Err(ValidationError::Null {
                attribute: Attribute::Age
            })
        );
    }

    #[test]
    fn numeric_strings_and_booleans_are_accepted() {
        let record = PatientRecord::default()
            .with(Attribute::Age, " 54 ")
            .with(Attribute::FastingBs, true)
            .with(Attribute::Oldpeak, 1.5);

        let snapshot = ClinicalSnapshot::from_record(&record).expect("snapshot builds");

        assert_eq!(snapshot.age, 54.0);
        assert_eq!(snapshot.fasting_bs, 1.0);
        assert_eq!(snapshot.oldpeak, 1.5);
        assert_eq!(snapshot.max_hr, 0.0);
    }

    #[test]
    fn unreadable_numbers_name_the_attribute() {
        let record = PatientRecord::default().with(Attribute::Cholesterol, "high");

        let error = ClinicalSnapshot::from_record(&record).expect_err("cholesterol rejected");

        assert_eq!(error.attribute(), Attribute::Cholesterol);
        assert!(error.to_string().contains("Cholesterol"));
    }

    #[test]
    fn categories_distinguish_missing_known_and_unrecognized() {
        let record = PatientRecord::default()
            .with(Attribute::ChestPainType, "TA")
            .with(Attribute::RestingEcg, "normal")
            .with(Attribute::StSlope, 2);

        let snapshot = ClinicalSnapshot::from_record(&record).expect("snapshot builds");

        assert_eq!(snapshot.sex, Observed::Missing);
        assert_eq!(
            snapshot.chest_pain_type,
            Observed::Known(ChestPainType::TypicalAngina)
        );
        assert_eq!(snapshot.resting_ecg, Observed::Unrecognized);
        assert_eq!(snapshot.st_slope, Observed::Unrecognized);
        assert_eq!(snapshot.sex.or_baseline(), Some(Sex::Male));
        assert_eq!(snapshot.resting_ecg.or_baseline(), None);
    }

    #[test]
    fn attribute_keys_match_payload_names() {
        let keys: Vec<&str> = Attribute::ALL.iter().map(|attribute| attribute.key()).collect();
        assert_eq!(
            keys,
            [
                "Age",
                "Sex",
                "ChestPainType",
                "RestingBP",
                "Cholesterol",
                "FastingBS",
                "RestingECG",
                "MaxHR",
                "ExerciseAngina",
                "Oldpeak",
                "ST_Slope"
            ]
        );
        assert_eq!(
            serde_json::to_value(Attribute::StSlope).expect("serializes"),
            json!("ST_Slope")
        );
    }
}
