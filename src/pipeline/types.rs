use serde::{Deserialize, Serialize};

use crate::models::{Age, FollowUpProtocol, MonitoringProtocol, PatientFacts, Severity};

use super::error::PipelineError;

/// One ranked candidate condition with its supporting evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionMatch {
    pub condition_id: String,
    pub condition_name: String,
    /// Score in [0,1], monotonic in matched-symptom evidence.
    pub confidence: f64,
    /// Symptom mentions that supported this match, in mention order.
    pub matched_symptoms: Vec<String>,
}

/// Outcome of evaluating one medication rule against the patient facts.
///
/// `calculated_dose` is the pre-clamp value and is preserved for audit even
/// when clamping changed `final_dose`. On failure both dose fields are absent
/// and `failure_reason` says why; a failed dose never aborts the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatedDose {
    pub success: bool,
    pub medication_name: String,
    pub dose_per_kg: f64,
    pub unit: String,
    pub patient_weight_kg: Option<f64>,
    pub calculated_dose: Option<f64>,
    pub final_dose: Option<f64>,
    pub min_dose: Option<f64>,
    pub max_dose: Option<f64>,
    pub route: String,
    pub frequency: String,
    pub duration: Option<String>,
    pub dosing_rationale: Option<String>,
    pub failure_reason: Option<String>,
}

/// Monitoring instructions with explicit provenance: copied from a guideline
/// tier, or built from the condition's own data when no guideline covers it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Monitoring {
    Guideline(MonitoringProtocol),
    Fallback(MonitoringProtocol),
}

/// Follow-up instructions with the same two provenances as [`Monitoring`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FollowUp {
    Guideline(FollowUpProtocol),
    Fallback(FollowUpProtocol),
}

/// Safety-netting advice handed to the carer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyNetting {
    pub advice: String,
    pub warning_signs: Vec<String>,
}

/// Condensed patient context echoed on the plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSummary {
    pub age: Option<Age>,
    pub weight_kg: Option<f64>,
    pub symptoms: Vec<String>,
}

/// The pipeline's terminal artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentPlan {
    pub condition_id: String,
    pub condition_name: String,
    pub severity: Severity,
    pub patient_summary: PatientSummary,
    pub medications: Vec<CalculatedDose>,
    pub immediate_actions: Vec<String>,
    pub monitoring: Monitoring,
    pub discharge_criteria: Vec<String>,
    pub follow_up: FollowUp,
    pub safety_netting: SafetyNetting,
    pub red_flags: Vec<String>,
    pub clinical_pearls: Vec<String>,
}

/// Everything a successful run hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSuccess {
    pub success: bool,
    pub patient_facts: PatientFacts,
    pub condition: ConditionMatch,
    pub calculated_doses: Vec<CalculatedDose>,
    pub treatment_plan: TreatmentPlan,
}

/// Structured failure: always an error string plus a stable code, never a
/// raw panic crossing the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineFailure {
    pub success: bool,
    pub error: String,
    pub error_code: String,
}

/// Tagged union returned by [`crate::pipeline::process`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineResult {
    Success(Box<PipelineSuccess>),
    Failure(PipelineFailure),
}

impl PipelineResult {
    pub fn failure(error: &PipelineError) -> Self {
        Self::Failure(PipelineFailure {
            success: false,
            error: error.to_string(),
            error_code: error.code().to_string(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl Monitoring {
    pub fn protocol(&self) -> &MonitoringProtocol {
        match self {
            Self::Guideline(p) | Self::Fallback(p) => p,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

impl FollowUp {
    pub fn protocol(&self) -> &FollowUpProtocol {
        match self {
            Self::Guideline(p) | Self::Fallback(p) => p,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}
