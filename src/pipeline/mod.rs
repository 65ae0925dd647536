//! The four-stage clinical reasoning pipeline and its orchestrator.
//!
//! Stages hand off immutable values in sequence: parse → identify → dose →
//! plan. Terminal failures (empty input, no usable match, reference-data
//! integrity) short-circuit into a structured failure result; per-medication
//! dosing failures and missing guidelines are recovered locally.

pub mod dosing;
pub mod error;
pub mod identify;
pub mod parser;
pub mod plan;
pub mod types;

use std::time::Instant;

use crate::config::PipelineConfig;
use crate::models::{ConditionRecord, Severity};
use crate::reference::ReferenceData;

use error::PipelineError;
use types::{PipelineResult, PipelineSuccess};

/// Run the full pipeline on a raw clinical note.
///
/// Never panics across this boundary: every outcome is a tagged
/// success/failure result the caller can serialize as-is.
pub fn process(
    raw_note: &str,
    reference: &ReferenceData,
    config: &PipelineConfig,
) -> PipelineResult {
    match run(raw_note, reference, config) {
        Ok(success) => PipelineResult::Success(Box::new(success)),
        Err(error) => {
            tracing::warn!(error_code = error.code(), %error, "pipeline aborted");
            PipelineResult::failure(&error)
        }
    }
}

fn run(
    raw_note: &str,
    reference: &ReferenceData,
    config: &PipelineConfig,
) -> Result<PipelineSuccess, PipelineError> {
    let start = Instant::now();

    let facts = parser::parse(raw_note)?;
    tracing::debug!(
        symptoms = facts.symptoms.len(),
        missing = facts.missing_fields.len(),
        "note parsed"
    );

    let matches = identify::identify(&facts, reference.conditions(), config);
    let top = matches.first().cloned().ok_or(PipelineError::NoMatch)?;

    let condition = reference.condition(&top.condition_id).ok_or_else(|| {
        PipelineError::DataIntegrity(format!(
            "matched condition '{}' missing from the store",
            top.condition_id
        ))
    })?;
    validate_medication_rules(condition)?;

    let severity = resolve_severity(&facts.assessment).unwrap_or(config.default_severity);

    let doses: Vec<_> = condition
        .medications
        .iter()
        .map(|rule| dosing::calculate(rule, &facts))
        .collect();
    let degraded = doses.iter().filter(|d| !d.success).count();

    let guideline = reference.guideline_for(&top.condition_id);
    let treatment_plan = plan::generate(condition, severity, &facts, &doses, guideline);

    tracing::info!(
        condition_id = %top.condition_id,
        confidence = top.confidence,
        severity = %severity,
        medications = doses.len(),
        degraded,
        guideline = guideline.is_some(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "pipeline complete"
    );

    Ok(PipelineSuccess {
        success: true,
        patient_facts: facts,
        condition: top,
        calculated_doses: doses,
        treatment_plan,
    })
}

/// Severity stated in the assessment, highest tier winning when several
/// tier words appear. `None` when the assessment states no tier.
pub fn resolve_severity(assessment: &str) -> Option<Severity> {
    let lower = assessment.to_lowercase();
    if lower.contains("severe") {
        Some(Severity::Severe)
    } else if lower.contains("moderate") {
        Some(Severity::Moderate)
    } else if lower.contains("mild") {
        Some(Severity::Mild)
    } else {
        None
    }
}

/// Last line of defense at the dosing boundary: a rule that cannot be dosed
/// safely aborts rather than degrades, even if load-time validation was
/// somehow bypassed.
fn validate_medication_rules(condition: &ConditionRecord) -> Result<(), PipelineError> {
    for rule in &condition.medications {
        if !rule.dose_per_kg.is_finite() || rule.dose_per_kg <= 0.0 {
            return Err(PipelineError::DataIntegrity(format!(
                "medication '{}' on condition '{}' has invalid dose_per_kg {}",
                rule.name, condition.condition_id, rule.dose_per_kg
            )));
        }
        if let (Some(min), Some(max)) = (rule.min_dose, rule.max_dose) {
            if min > max {
                return Err(PipelineError::DataIntegrity(format!(
                    "medication '{}' on condition '{}' has min_dose {min} > max_dose {max}",
                    rule.name, condition.condition_id
                )));
            }
        }
    }
    Ok(())
}
