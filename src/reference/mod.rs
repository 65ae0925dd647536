//! Read-only reference data: condition and guideline records.
//!
//! Loaded once from bundled JSON files (or built in-memory for tests),
//! validated at load time, then shared freely across pipeline invocations.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use thiserror::Error;

use crate::models::{ConditionRecord, GuidelineRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cannot read reference data file {0}: {1}")]
    Read(String, String),

    #[error("invalid JSON in {0}: {1}")]
    Parse(String, String),

    #[error("reference data integrity violation: {0}")]
    Integrity(String),
}

/// Loaded condition and guideline tables, keyed by id.
/// Read-only after construction; safe to share across threads.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    conditions: BTreeMap<String, ConditionRecord>,
    guidelines: BTreeMap<String, GuidelineRecord>,
}

static SHARED: OnceLock<ReferenceData> = OnceLock::new();

impl ReferenceData {
    /// Load reference data from `conditions.json` and `guidelines.json`
    /// under `data_dir`, validating integrity before returning.
    pub fn load(data_dir: &Path) -> Result<Self, StoreError> {
        let conditions_path = data_dir.join("conditions.json");
        let guidelines_path = data_dir.join("guidelines.json");

        let conditions_json = std::fs::read_to_string(&conditions_path).map_err(|e| {
            StoreError::Read(conditions_path.display().to_string(), e.to_string())
        })?;
        let conditions: Vec<ConditionRecord> = serde_json::from_str(&conditions_json)
            .map_err(|e| StoreError::Parse("conditions.json".into(), e.to_string()))?;

        let guidelines_json = std::fs::read_to_string(&guidelines_path).map_err(|e| {
            StoreError::Read(guidelines_path.display().to_string(), e.to_string())
        })?;
        let guidelines: Vec<GuidelineRecord> = serde_json::from_str(&guidelines_json)
            .map_err(|e| StoreError::Parse("guidelines.json".into(), e.to_string()))?;

        Self::build(conditions, guidelines)
    }

    /// Build and validate a store from in-memory records.
    pub fn build(
        conditions: Vec<ConditionRecord>,
        guidelines: Vec<GuidelineRecord>,
    ) -> Result<Self, StoreError> {
        let mut condition_map = BTreeMap::new();
        for condition in conditions {
            let id = condition.condition_id.clone();
            if condition_map.insert(id.clone(), condition).is_some() {
                return Err(StoreError::Integrity(format!(
                    "duplicate condition_id: {id}"
                )));
            }
        }

        let mut guideline_map = BTreeMap::new();
        for guideline in guidelines {
            let id = guideline.guideline_id.clone();
            if guideline_map.insert(id.clone(), guideline).is_some() {
                return Err(StoreError::Integrity(format!(
                    "duplicate guideline_id: {id}"
                )));
            }
        }

        let store = Self {
            conditions: condition_map,
            guidelines: guideline_map,
        };
        store.validate()?;
        Ok(store)
    }

    /// Build a store without integrity validation, so tests can exercise
    /// the pipeline-level guards against records no public constructor
    /// would admit.
    #[cfg(test)]
    pub(crate) fn build_unvalidated(
        conditions: Vec<ConditionRecord>,
        guidelines: Vec<GuidelineRecord>,
    ) -> Self {
        Self {
            conditions: conditions
                .into_iter()
                .map(|c| (c.condition_id.clone(), c))
                .collect(),
            guidelines: guidelines
                .into_iter()
                .map(|g| (g.guideline_id.clone(), g))
                .collect(),
        }
    }

    /// Load once per process. Concurrent first calls each perform an
    /// idempotent load; exactly one result is kept.
    pub fn shared(data_dir: &Path) -> Result<&'static ReferenceData, StoreError> {
        if let Some(store) = SHARED.get() {
            return Ok(store);
        }
        let loaded = Self::load(data_dir)?;
        Ok(SHARED.get_or_init(|| loaded))
    }

    /// Integrity checks the pipeline relies on. Catching these here means a
    /// request never has to reason about malformed reference records.
    fn validate(&self) -> Result<(), StoreError> {
        for (id, condition) in &self.conditions {
            if condition.distinct_criteria_phrases().is_empty() {
                return Err(StoreError::Integrity(format!(
                    "condition '{id}' has no diagnostic criteria phrases"
                )));
            }
            for rule in &condition.medications {
                if !rule.dose_per_kg.is_finite() || rule.dose_per_kg <= 0.0 {
                    return Err(StoreError::Integrity(format!(
                        "condition '{id}' medication '{}' has invalid dose_per_kg {}",
                        rule.name, rule.dose_per_kg
                    )));
                }
                if let (Some(min), Some(max)) = (rule.min_dose, rule.max_dose) {
                    if min > max {
                        return Err(StoreError::Integrity(format!(
                            "condition '{id}' medication '{}' has min_dose {min} > max_dose {max}",
                            rule.name
                        )));
                    }
                }
            }
        }

        for (id, guideline) in &self.guidelines {
            for condition_id in &guideline.condition_ids {
                if !self.conditions.contains_key(condition_id) {
                    tracing::warn!(
                        guideline_id = %id,
                        condition_id = %condition_id,
                        "guideline references unknown condition"
                    );
                }
            }
        }

        Ok(())
    }

    pub fn conditions(&self) -> &BTreeMap<String, ConditionRecord> {
        &self.conditions
    }

    pub fn condition(&self, condition_id: &str) -> Option<&ConditionRecord> {
        self.conditions.get(condition_id)
    }

    /// First guideline (in guideline_id order) covering the condition.
    pub fn guideline_for(&self, condition_id: &str) -> Option<&GuidelineRecord> {
        self.guidelines.values().find(|g| g.covers(condition_id))
    }

    /// In-memory fixture data for tests (no file I/O). Mirrors the shape of
    /// the bundled data files: croup fully worked, plus neighbors that
    /// exercise ranking and the age filter.
    pub fn load_test() -> Self {
        let conditions = fixtures::conditions();
        let guidelines = fixtures::guidelines();
        Self::build(conditions, guidelines).expect("test fixture must validate")
    }
}

pub mod fixtures {
    use std::collections::BTreeMap;

    use crate::models::{
        AgeRange, ConditionRecord, FollowUpProtocol, GuidelineRecord, MedicationRule,
        MonitoringProtocol, Severity, SeverityProtocol,
    };

    fn tiers(
        mild: &[&str],
        moderate: &[&str],
        severe: &[&str],
    ) -> BTreeMap<Severity, Vec<String>> {
        let mut map = BTreeMap::new();
        map.insert(Severity::Mild, mild.iter().map(|s| s.to_string()).collect());
        map.insert(
            Severity::Moderate,
            moderate.iter().map(|s| s.to_string()).collect(),
        );
        map.insert(
            Severity::Severe,
            severe.iter().map(|s| s.to_string()).collect(),
        );
        map
    }

    pub fn conditions() -> Vec<ConditionRecord> {
        vec![
            ConditionRecord {
                condition_id: "croup".into(),
                name: "Croup".into(),
                aliases: vec!["Laryngotracheobronchitis".into()],
                age_applicability: AgeRange {
                    min_months: Some(6),
                    max_months: Some(72),
                },
                diagnostic_criteria: tiers(
                    &["barky cough", "hoarse voice"],
                    &["barky cough", "hoarse voice", "stridor"],
                    &["stridor", "recession", "cyanosis"],
                ),
                medications: vec![
                    MedicationRule {
                        name: "dexamethasone".into(),
                        dose_per_kg: 0.15,
                        unit: "mg".into(),
                        route: "oral".into(),
                        frequency: "single dose".into(),
                        duration: Some("once".into()),
                        min_dose: Some(0.6),
                        max_dose: Some(10.0),
                        age_restriction: None,
                        weight_restriction: None,
                        contraindications: vec!["known hypersensitivity".into()],
                    },
                    MedicationRule {
                        name: "prednisolone".into(),
                        dose_per_kg: 1.0,
                        unit: "mg".into(),
                        route: "oral".into(),
                        frequency: "single dose".into(),
                        duration: Some("once".into()),
                        min_dose: None,
                        max_dose: Some(20.0),
                        age_restriction: None,
                        weight_restriction: None,
                        contraindications: vec![],
                    },
                ],
                supportive_care: {
                    let mut map = BTreeMap::new();
                    map.insert(
                        Severity::Mild,
                        vec!["Keep the child calm".into(), "Encourage oral fluids".into()],
                    );
                    map.insert(
                        Severity::Moderate,
                        vec![
                            "Keep the child calm and on the parent's lap".into(),
                            "Observe for stridor at rest".into(),
                        ],
                    );
                    map.insert(
                        Severity::Severe,
                        vec![
                            "Call for senior help".into(),
                            "Prepare nebulized adrenaline".into(),
                        ],
                    );
                    map
                },
                clinical_pearls: vec![
                    "Symptoms are typically worse at night".into(),
                    "Steroids reduce return visits even in mild cases".into(),
                ],
                red_flags: vec![
                    "Stridor at rest".into(),
                    "Cyanosis".into(),
                    "Drooling or inability to swallow".into(),
                ],
            },
            ConditionRecord {
                condition_id: "bronchiolitis".into(),
                name: "Bronchiolitis".into(),
                aliases: vec![],
                age_applicability: AgeRange {
                    min_months: None,
                    max_months: Some(24),
                },
                diagnostic_criteria: tiers(
                    &["runny nose", "cough"],
                    &["cough", "wheeze", "difficulty breathing"],
                    &["recession", "poor feeding", "apnea"],
                ),
                medications: vec![],
                supportive_care: {
                    let mut map = BTreeMap::new();
                    map.insert(
                        Severity::Moderate,
                        vec!["Small frequent feeds".into(), "Nasal saline drops".into()],
                    );
                    map
                },
                clinical_pearls: vec![
                    "Bronchodilators and steroids are not effective".into(),
                ],
                red_flags: vec!["Apnea".into(), "Oxygen saturation below 92%".into()],
            },
            ConditionRecord {
                condition_id: "pharyngitis".into(),
                name: "Pharyngitis".into(),
                aliases: vec!["Sore throat".into()],
                age_applicability: AgeRange::default(),
                diagnostic_criteria: tiers(
                    &["sore throat"],
                    &["sore throat", "fever"],
                    &["sore throat", "fever", "difficulty breathing"],
                ),
                medications: vec![MedicationRule {
                    name: "paracetamol".into(),
                    dose_per_kg: 15.0,
                    unit: "mg".into(),
                    route: "oral".into(),
                    frequency: "every 6 hours".into(),
                    duration: Some("as needed".into()),
                    min_dose: None,
                    max_dose: Some(1000.0),
                    age_restriction: None,
                    weight_restriction: None,
                    contraindications: vec!["hepatic impairment".into()],
                }],
                supportive_care: BTreeMap::new(),
                clinical_pearls: vec!["Most cases are viral".into()],
                red_flags: vec!["Drooling".into(), "Trismus".into()],
            },
            ConditionRecord {
                condition_id: "viral_wheeze".into(),
                name: "Viral wheeze".into(),
                aliases: vec!["Viral-induced wheeze".into()],
                age_applicability: AgeRange {
                    min_months: Some(12),
                    max_months: Some(60),
                },
                diagnostic_criteria: tiers(
                    &["wheeze", "cough"],
                    &["wheeze", "cough", "shortness of breath"],
                    &["wheeze", "recession", "difficulty breathing"],
                ),
                medications: vec![MedicationRule {
                    name: "salbutamol".into(),
                    dose_per_kg: 0.15,
                    unit: "mg".into(),
                    route: "nebulized".into(),
                    frequency: "every 20 minutes up to 3 doses".into(),
                    duration: None,
                    min_dose: Some(2.5),
                    max_dose: Some(5.0),
                    age_restriction: Some(AgeRange {
                        min_months: Some(12),
                        max_months: None,
                    }),
                    weight_restriction: None,
                    contraindications: vec![],
                }],
                supportive_care: BTreeMap::new(),
                clinical_pearls: vec!["Response to bronchodilator supports the diagnosis".into()],
                red_flags: vec!["Silent chest".into(), "Exhaustion".into()],
            },
        ]
    }

    pub fn guidelines() -> Vec<GuidelineRecord> {
        vec![GuidelineRecord {
            guideline_id: "croup_pathway".into(),
            name: "Croup clinical pathway".into(),
            source: Some("Paediatric acute care guideline".into()),
            condition_ids: vec!["croup".into()],
            treatment_algorithm: {
                let mut map = BTreeMap::new();
                map.insert(
                    Severity::Mild,
                    SeverityProtocol {
                        monitoring: MonitoringProtocol {
                            frequency: "at each feed".into(),
                            parameters: vec!["work of breathing".into(), "stridor".into()],
                            duration: "24 hours".into(),
                            location: Some("home".into()),
                        },
                        follow_up: FollowUpProtocol {
                            timeline: "routine".into(),
                            instructions: vec!["Review by GP if not settling in 48 hours".into()],
                            parent_education: vec![
                                "Symptoms often worsen at night".into(),
                                "Return if stridor occurs at rest".into(),
                            ],
                        },
                        discharge_criteria: vec![
                            "No stridor at rest".into(),
                            "Parents confident with safety advice".into(),
                        ],
                    },
                );
                map.insert(
                    Severity::Moderate,
                    SeverityProtocol {
                        monitoring: MonitoringProtocol {
                            frequency: "every 30 minutes".into(),
                            parameters: vec![
                                "stridor at rest".into(),
                                "recession".into(),
                                "oxygen saturation".into(),
                            ],
                            duration: "until 2 hours post steroid".into(),
                            location: Some("emergency department".into()),
                        },
                        follow_up: FollowUpProtocol {
                            timeline: "review in 24-48 hours".into(),
                            instructions: vec![
                                "Discharge when stridor-free at rest".into(),
                                "GP review within 48 hours".into(),
                            ],
                            parent_education: vec![
                                "Keep the child calm; agitation worsens stridor".into(),
                            ],
                        },
                        discharge_criteria: vec![
                            "Stridor-free at rest for 2 hours post steroid".into(),
                            "Oxygen saturation above 94% on air".into(),
                        ],
                    },
                );
                map.insert(
                    Severity::Severe,
                    SeverityProtocol {
                        monitoring: MonitoringProtocol {
                            frequency: "continuous".into(),
                            parameters: vec![
                                "oxygen saturation".into(),
                                "heart rate".into(),
                                "respiratory rate".into(),
                            ],
                            duration: "until stable".into(),
                            location: Some("resuscitation bay".into()),
                        },
                        follow_up: FollowUpProtocol {
                            timeline: "inpatient monitoring".into(),
                            instructions: vec!["Admit under paediatrics".into()],
                            parent_education: vec![],
                        },
                        discharge_criteria: vec![
                            "Stepped down from continuous monitoring".into(),
                            "Senior review completed".into(),
                        ],
                    },
                );
                map
            },
        }]
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::models::MedicationRule;

    #[test]
    fn load_test_fixture_validates() {
        let store = ReferenceData::load_test();
        assert!(store.condition("croup").is_some());
        assert!(store.condition("unknown").is_none());
    }

    #[test]
    fn guideline_lookup_by_condition() {
        let store = ReferenceData::load_test();
        let guideline = store.guideline_for("croup").unwrap();
        assert_eq!(guideline.guideline_id, "croup_pathway");
        assert!(store.guideline_for("bronchiolitis").is_none());
    }

    #[test]
    fn duplicate_condition_id_rejected() {
        let mut conditions = fixtures::conditions();
        let dup = conditions[0].clone();
        conditions.push(dup);
        let err = ReferenceData::build(conditions, vec![]).unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));
    }

    #[test]
    fn invalid_dose_per_kg_rejected() {
        let mut conditions = fixtures::conditions();
        conditions[0].medications.push(MedicationRule {
            name: "broken".into(),
            dose_per_kg: 0.0,
            unit: "mg".into(),
            route: "oral".into(),
            frequency: "daily".into(),
            duration: None,
            min_dose: None,
            max_dose: None,
            age_restriction: None,
            weight_restriction: None,
            contraindications: vec![],
        });
        let err = ReferenceData::build(conditions, vec![]).unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));
    }

    #[test]
    fn min_above_max_rejected() {
        let mut conditions = fixtures::conditions();
        conditions[0].medications[0].min_dose = Some(50.0);
        conditions[0].medications[0].max_dose = Some(10.0);
        let err = ReferenceData::build(conditions, vec![]).unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));
    }

    #[test]
    fn load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let conditions_json =
            serde_json::to_string(&fixtures::conditions()).unwrap();
        let guidelines_json =
            serde_json::to_string(&fixtures::guidelines()).unwrap();

        let mut f = std::fs::File::create(dir.path().join("conditions.json")).unwrap();
        f.write_all(conditions_json.as_bytes()).unwrap();
        let mut f = std::fs::File::create(dir.path().join("guidelines.json")).unwrap();
        f.write_all(guidelines_json.as_bytes()).unwrap();

        let store = ReferenceData::load(dir.path()).unwrap();
        assert_eq!(store.conditions().len(), 4);
        assert!(store.guideline_for("croup").is_some());
    }

    #[test]
    fn load_missing_dir_is_read_error() {
        let err = ReferenceData::load(std::path::Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, StoreError::Read(_, _)));
    }
}
