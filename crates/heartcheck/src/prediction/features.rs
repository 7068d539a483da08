use serde::Serialize;

use super::record::{
    Category, ChestPainType, ClinicalSnapshot, ExerciseAngina, Observed, PatientRecord,
    RestingEcg, Sex, StSlope, ValidationError,
};

pub const FEATURE_COUNT: usize = 20;

/// Column schema the classifier was trained on.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "Age",
    "RestingBP",
    "Cholesterol",
    "FastingBS",
    "MaxHR",
    "Oldpeak",
    "Sex_F",
    "Sex_M",
    "ChestPainType_ASY",
    "ChestPainType_ATA",
    "ChestPainType_NAP",
    "ChestPainType_TA",
    "RestingECG_LVH",
    "RestingECG_Normal",
    "RestingECG_ST",
    "ExerciseAngina_N",
    "ExerciseAngina_Y",
    "ST_Slope_Down",
    "ST_Slope_Flat",
    "ST_Slope_Up",
];

/// Fixed-order numeric encoding of one patient record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        column_index(column).map(|index| self.values[index])
    }

    pub fn columns(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_COLUMNS.iter().copied().zip(self.values.iter().copied())
    }
}

pub fn column_index(column: &str) -> Option<usize> {
    FEATURE_COLUMNS.iter().position(|name| *name == column)
}

/// Stateless encoder producing [`FeatureVector`]s in [`FEATURE_COLUMNS`] order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, record: &PatientRecord) -> Result<FeatureVector, ValidationError> {
        let snapshot = ClinicalSnapshot::from_record(record)?;
        Ok(self.encode_snapshot(&snapshot))
    }

    pub fn encode_snapshot(&self, snapshot: &ClinicalSnapshot) -> FeatureVector {
        let mut values = [0.0; FEATURE_COUNT];
        let mut cursor = Cursor::new(&mut values);

        cursor.push(snapshot.age);
        cursor.push(snapshot.resting_bp);
        cursor.push(snapshot.cholesterol);
        cursor.push(snapshot.fasting_bs.trunc());
        cursor.push(snapshot.max_hr);
        cursor.push(snapshot.oldpeak);
        cursor.one_hot::<Sex>(snapshot.sex);
        cursor.one_hot::<ChestPainType>(snapshot.chest_pain_type);
        cursor.one_hot::<RestingEcg>(snapshot.resting_ecg);
        cursor.one_hot::<ExerciseAngina>(snapshot.exercise_angina);
        cursor.one_hot::<StSlope>(snapshot.st_slope);
        debug_assert_eq!(cursor.position, FEATURE_COUNT);

        FeatureVector { values }
    }
}

struct Cursor<'a> {
    values: &'a mut [f64; FEATURE_COUNT],
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(values: &'a mut [f64; FEATURE_COUNT]) -> Self {
        Self {
            values,
            position: 0,
        }
    }

    fn push(&mut self, value: f64) {
        self.values[self.position] = value;
        self.position += 1;
    }

    // Every variant gets a column, so an unrecognized value leaves an all-zero row.
    fn one_hot<T: Category>(&mut self, observed: Observed<T>) {
        let selected = observed.or_baseline();
        for variant in T::VARIANTS {
            self.push(if Some(*variant) == selected { 1.0 } else { 0.0 });
        }
    }
}
