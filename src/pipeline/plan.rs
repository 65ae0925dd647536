//! Treatment plan generation: severity-tier selection over the condition's
//! and guideline's tables, with explicit provenance on every protocol block.
//!
//! Pure and stateless: same inputs always produce the same plan.

use crate::models::{
    ConditionRecord, FollowUpProtocol, GuidelineRecord, MonitoringProtocol, PatientFacts,
    Severity,
};

use super::types::{
    CalculatedDose, FollowUp, Monitoring, PatientSummary, SafetyNetting, TreatmentPlan,
};

/// Compose the final plan for an identified condition at a resolved severity.
///
/// `guideline` is the protocol covering this condition, when one exists.
/// Without one (or when the guideline lacks this severity tier), monitoring,
/// follow-up, and discharge criteria fall back to templates built from the
/// condition's own data; the protocol blocks are flagged as `Fallback` so
/// the two provenances are never confused.
pub fn generate(
    condition: &ConditionRecord,
    severity: Severity,
    facts: &PatientFacts,
    doses: &[CalculatedDose],
    guideline: Option<&GuidelineRecord>,
) -> TreatmentPlan {
    let mut immediate_actions = Vec::new();

    // Medication actions first, in the order doses were supplied. Failed
    // doses are carried on the plan but never rendered as actions.
    for dose in doses {
        if let (true, Some(final_dose)) = (dose.success, dose.final_dose) {
            immediate_actions.push(format!(
                "Administer {} {}{} {} {}",
                dose.medication_name, final_dose, dose.unit, dose.route, dose.frequency
            ));
        }
    }

    if let Some(care) = condition.supportive_care.get(&severity) {
        immediate_actions.extend(care.iter().cloned());
    }

    if immediate_actions.is_empty() {
        immediate_actions.push("Supportive care".to_string());
        immediate_actions.push("Monitor symptoms".to_string());
    }

    let protocol = guideline.and_then(|g| g.protocol_for(severity));
    let monitoring = match protocol {
        Some(p) => Monitoring::Guideline(p.monitoring.clone()),
        None => Monitoring::Fallback(fallback_monitoring()),
    };
    let follow_up = match protocol {
        Some(p) => FollowUp::Guideline(p.follow_up.clone()),
        None => FollowUp::Fallback(fallback_follow_up(condition)),
    };
    let discharge_criteria = match protocol {
        Some(p) => p.discharge_criteria.clone(),
        None => fallback_discharge_criteria(),
    };

    TreatmentPlan {
        condition_id: condition.condition_id.clone(),
        condition_name: condition.name.clone(),
        severity,
        patient_summary: PatientSummary {
            age: facts.age,
            weight_kg: facts.weight_kg,
            symptoms: facts.symptoms.clone(),
        },
        medications: doses.to_vec(),
        immediate_actions,
        monitoring,
        discharge_criteria,
        follow_up,
        safety_netting: SafetyNetting {
            advice: safety_netting_advice(severity),
            warning_signs: condition.red_flags.clone(),
        },
        red_flags: condition.red_flags.clone(),
        clinical_pearls: condition.clinical_pearls.clone(),
    }
}

fn safety_netting_advice(severity: Severity) -> String {
    match severity {
        Severity::Mild => "Return if symptoms worsen or any warning sign appears".to_string(),
        Severity::Moderate => {
            "Return immediately if symptoms worsen or any warning sign appears".to_string()
        }
        Severity::Severe => {
            "Do not leave clinical care until reviewed; escalate on any warning sign".to_string()
        }
    }
}

fn fallback_discharge_criteria() -> Vec<String> {
    vec![
        "Stable vital signs".into(),
        "Improved symptoms".into(),
        "Adequate oral intake".into(),
    ]
}

fn fallback_monitoring() -> MonitoringProtocol {
    MonitoringProtocol {
        frequency: "regular".into(),
        parameters: vec!["vital signs".into(), "symptom progression".into()],
        duration: "until improvement".into(),
        location: None,
    }
}

/// Generic follow-up built from the condition's own clinical pearls.
fn fallback_follow_up(condition: &ConditionRecord) -> FollowUpProtocol {
    FollowUpProtocol {
        timeline: "routine".into(),
        instructions: vec!["Follow up with primary care provider".into()],
        parent_education: condition.clinical_pearls.clone(),
    }
}
