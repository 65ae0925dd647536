use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Unit for an extracted patient age.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgeUnit {
    Years,
    Months,
}

/// Patient age normalized to a single unit-tagged value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Age {
    pub value: u32,
    pub unit: AgeUnit,
}

impl Age {
    pub fn years(value: u32) -> Self {
        Self { value, unit: AgeUnit::Years }
    }

    pub fn months(value: u32) -> Self {
        Self { value, unit: AgeUnit::Months }
    }

    /// Age in whole months, the unit all applicability ranges use.
    pub fn in_months(&self) -> u32 {
        match self.unit {
            AgeUnit::Years => self.value * 12,
            AgeUnit::Months => self.value,
        }
    }
}

/// Patient gender as recorded on the note. Only extracted when the note
/// states it; never inferred.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Structured facts extracted from one clinical note.
///
/// Created once per pipeline run by the parser and never mutated afterward.
/// Every field degrades softly: an absent value is `None`/empty plus an entry
/// in `missing_fields`, never a parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientFacts {
    /// Name following a "Patient:" label. Never fabricated.
    pub name: Option<String>,
    pub age: Option<Age>,
    pub dob: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub gender: Option<Gender>,
    /// Controlled-vocabulary symptom hits, in vocabulary order (not note order).
    pub symptoms: Vec<String>,
    /// Raw vital readings keyed by vital name ("temperature", "heart_rate", ...).
    /// Values are kept as matched text so compound readings like "120/80" survive.
    pub vitals: BTreeMap<String, String>,
    pub presenting_complaint: Option<String>,
    pub history: Option<String>,
    pub examination: Option<String>,
    /// Span of the assessment section; empty string when no header was found.
    pub assessment: String,
    /// Span of the plan section; empty string when no header was found.
    pub plan: String,
    /// Fields the parser looked for but could not find, in a fixed order.
    pub missing_fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_years_to_months() {
        assert_eq!(Age::years(3).in_months(), 36);
    }

    #[test]
    fn age_months_passthrough() {
        assert_eq!(Age::months(8).in_months(), 8);
    }
}
