use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The sole axis along which diagnostic criteria, dosing, and guideline
/// protocols vary. Unknown severity strings fail closed at the `FromStr`
/// boundary rather than silently defaulting to mild.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized severity tier: {0}")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mild" => Ok(Self::Mild),
            "moderate" => Ok(Self::Moderate),
            "severe" => Ok(Self::Severe),
            other => Err(UnknownSeverity(other.to_string())),
        }
    }
}

/// Inclusive age applicability window in whole months.
/// A missing bound is open on that side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgeRange {
    #[serde(default)]
    pub min_months: Option<u32>,
    #[serde(default)]
    pub max_months: Option<u32>,
}

impl AgeRange {
    pub fn contains(&self, age_months: u32) -> bool {
        if let Some(min) = self.min_months {
            if age_months < min {
                return false;
            }
        }
        if let Some(max) = self.max_months {
            if age_months > max {
                return false;
            }
        }
        true
    }
}

/// Inclusive patient weight window in kilograms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightRange {
    #[serde(default)]
    pub min_kg: Option<f64>,
    #[serde(default)]
    pub max_kg: Option<f64>,
}

impl WeightRange {
    pub fn contains(&self, weight_kg: f64) -> bool {
        if let Some(min) = self.min_kg {
            if weight_kg < min {
                return false;
            }
        }
        if let Some(max) = self.max_kg {
            if weight_kg > max {
                return false;
            }
        }
        true
    }
}

/// Weight-based dosing rule embedded in its owning condition.
/// Deliberately denormalized: treatment data travels with its condition,
/// so a rule is never addressed outside that context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationRule {
    pub name: String,
    pub dose_per_kg: f64,
    /// Dose unit per kilogram, e.g. "mg".
    pub unit: String,
    pub route: String,
    pub frequency: String,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub min_dose: Option<f64>,
    #[serde(default)]
    pub max_dose: Option<f64>,
    #[serde(default)]
    pub age_restriction: Option<AgeRange>,
    #[serde(default)]
    pub weight_restriction: Option<WeightRange>,
    #[serde(default)]
    pub contraindications: Vec<String>,
}

/// A named clinical diagnosis with its diagnostic phrases, embedded
/// medication rules, supportive care, pearls, and red flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionRecord {
    pub condition_id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub age_applicability: AgeRange,
    /// Ordered symptom phrases keyed by severity tier.
    pub diagnostic_criteria: BTreeMap<Severity, Vec<String>>,
    #[serde(default)]
    pub medications: Vec<MedicationRule>,
    /// Non-medication actions appended to the plan for each tier.
    #[serde(default)]
    pub supportive_care: BTreeMap<Severity, Vec<String>>,
    #[serde(default)]
    pub clinical_pearls: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
}

impl ConditionRecord {
    /// Union of diagnostic phrases across all severity tiers, lowercased,
    /// deduplicated, first occurrence wins. Tier order is fixed
    /// (mild, moderate, severe) so the result is deterministic.
    pub fn distinct_criteria_phrases(&self) -> Vec<String> {
        let mut phrases: Vec<String> = Vec::new();
        for tier in self.diagnostic_criteria.values() {
            for phrase in tier {
                let lower = phrase.to_lowercase();
                if !phrases.contains(&lower) {
                    phrases.push(lower);
                }
            }
        }
        phrases
    }

    /// True when the text mentions the condition's display name or any alias.
    pub fn named_in(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        if lower.contains(&self.name.to_lowercase()) {
            return true;
        }
        self.aliases
            .iter()
            .any(|alias| lower.contains(&alias.to_lowercase()))
    }
}
