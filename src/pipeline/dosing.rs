//! Weight-based dose calculation bounded by safety limits.
//!
//! Arithmetic runs at full floating-point precision and is clamped before
//! any presentation rounding: clamping an already-rounded value can mask an
//! out-of-range dose. Failure is local and non-fatal; the plan generator
//! still renders every other medication.

use crate::models::{MedicationRule, PatientFacts};

use super::types::CalculatedDose;

/// Constrain `value` to [min, max]; a missing bound is open on that side.
pub fn clamp(value: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let mut result = value;
    if let Some(min) = min {
        if result < min {
            result = min;
        }
    }
    if let Some(max) = max {
        if result > max {
            result = max;
        }
    }
    result
}

/// Evaluate one medication rule against the patient facts.
pub fn calculate(rule: &MedicationRule, facts: &PatientFacts) -> CalculatedDose {
    if let Some(reason) = restriction_failure(rule, facts) {
        return failed(rule, facts, reason);
    }

    // restriction_failure already rejected missing or non-positive weight.
    let weight = match facts.weight_kg {
        Some(w) => w,
        None => return failed(rule, facts, "patient weight unknown".into()),
    };

    let calculated = rule.dose_per_kg * weight;
    let final_dose = clamp(calculated, rule.min_dose, rule.max_dose);

    CalculatedDose {
        success: true,
        medication_name: rule.name.clone(),
        dose_per_kg: rule.dose_per_kg,
        unit: rule.unit.clone(),
        patient_weight_kg: Some(weight),
        calculated_dose: Some(calculated),
        final_dose: Some(final_dose),
        min_dose: rule.min_dose,
        max_dose: rule.max_dose,
        route: rule.route.clone(),
        frequency: rule.frequency.clone(),
        duration: rule.duration.clone(),
        dosing_rationale: Some(format!(
            "Calculated at {} {}/kg for {} kg patient",
            rule.dose_per_kg, rule.unit, weight
        )),
        failure_reason: None,
    }
}

/// Reason this rule cannot be applied to these facts, if any.
fn restriction_failure(rule: &MedicationRule, facts: &PatientFacts) -> Option<String> {
    match facts.weight_kg {
        None => {
            return Some("cannot calculate dose: patient weight unknown".into());
        }
        Some(w) if !w.is_finite() || w <= 0.0 => {
            return Some(format!(
                "cannot calculate dose: patient weight must be a positive number (got {w})"
            ));
        }
        Some(_) => {}
    }

    if let Some(age_restriction) = &rule.age_restriction {
        match facts.age {
            None => {
                return Some(format!(
                    "{} has an age restriction but patient age is unknown",
                    rule.name
                ));
            }
            Some(age) if !age_restriction.contains(age.in_months()) => {
                return Some(format!(
                    "patient age outside the permitted range for {}",
                    rule.name
                ));
            }
            Some(_) => {}
        }
    }

    if let Some(weight_restriction) = &rule.weight_restriction {
        if let Some(w) = facts.weight_kg {
            if !weight_restriction.contains(w) {
                return Some(format!(
                    "patient weight outside the permitted range for {}",
                    rule.name
                ));
            }
        }
    }

    None
}

fn failed(rule: &MedicationRule, facts: &PatientFacts, reason: String) -> CalculatedDose {
    CalculatedDose {
        success: false,
        medication_name: rule.name.clone(),
        dose_per_kg: rule.dose_per_kg,
        unit: rule.unit.clone(),
        patient_weight_kg: facts.weight_kg,
        calculated_dose: None,
        final_dose: None,
        min_dose: rule.min_dose,
        max_dose: rule.max_dose,
        route: rule.route.clone(),
        frequency: rule.frequency.clone(),
        duration: rule.duration.clone(),
        dosing_rationale: None,
        failure_reason: Some(reason),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::{Age, AgeRange, WeightRange};

    fn rule(dose_per_kg: f64, min: Option<f64>, max: Option<f64>) -> MedicationRule {
        MedicationRule {
            name: "dexamethasone".into(),
            dose_per_kg,
            unit: "mg".into(),
            route: "oral".into(),
            frequency: "single dose".into(),
            duration: None,
            min_dose: min,
            max_dose: max,
            age_restriction: None,
            weight_restriction: None,
            contraindications: vec![],
        }
    }

    fn facts_with_weight(weight_kg: Option<f64>) -> PatientFacts {
        PatientFacts {
            name: None,
            age: Some(Age::years(3)),
            dob: None,
            weight_kg,
            height_cm: None,
            gender: None,
            symptoms: vec![],
            vitals: BTreeMap::new(),
            presenting_complaint: None,
            history: None,
            examination: None,
            assessment: String::new(),
            plan: String::new(),
            missing_fields: vec![],
        }
    }

    #[test]
    fn weight_scaled_dose_within_bounds() {
        let dose = calculate(&rule(0.15, Some(0.6), Some(10.0)), &facts_with_weight(Some(14.2)));
        assert!(dose.success);
        assert_eq!(dose.calculated_dose, Some(0.15 * 14.2));
        assert_eq!(dose.final_dose, dose.calculated_dose);
        assert_eq!(
            dose.dosing_rationale.as_deref(),
            Some("Calculated at 0.15 mg/kg for 14.2 kg patient")
        );
    }

    #[test]
    fn clamp_preserves_unclamped_value_for_audit() {
        let dose = calculate(&rule(0.15, None, Some(10.0)), &facts_with_weight(Some(1000.0)));
        assert!(dose.success);
        assert_eq!(dose.calculated_dose, Some(150.0));
        assert_eq!(dose.final_dose, Some(10.0));
    }

    #[test]
    fn clamp_raises_to_min() {
        let dose = calculate(&rule(0.15, Some(0.6), Some(10.0)), &facts_with_weight(Some(2.0)));
        assert_eq!(dose.calculated_dose, Some(0.3));
        assert_eq!(dose.final_dose, Some(0.6));
    }

    #[test]
    fn missing_bounds_are_unbounded() {
        let dose = calculate(&rule(1.0, None, None), &facts_with_weight(Some(500.0)));
        assert_eq!(dose.final_dose, Some(500.0));
    }

    #[test]
    fn missing_weight_fails_softly() {
        let dose = calculate(&rule(0.15, None, Some(10.0)), &facts_with_weight(None));
        assert!(!dose.success);
        assert_eq!(dose.final_dose, None);
        assert_eq!(dose.calculated_dose, None);
        assert!(dose.failure_reason.as_deref().unwrap().contains("weight unknown"));
    }

    #[test]
    fn non_positive_weight_fails() {
        for bad in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            let dose = calculate(&rule(0.15, None, None), &facts_with_weight(Some(bad)));
            assert!(!dose.success, "weight {bad} should fail");
            assert!(dose.final_dose.is_none());
        }
    }

    #[test]
    fn age_restriction_enforced() {
        let mut restricted = rule(0.15, None, None);
        restricted.age_restriction = Some(AgeRange { min_months: Some(144), max_months: None });
        let dose = calculate(&restricted, &facts_with_weight(Some(14.2)));
        assert!(!dose.success);
        assert!(dose.failure_reason.as_deref().unwrap().contains("age"));
    }

    #[test]
    fn age_restriction_with_unknown_age_fails() {
        let mut restricted = rule(0.15, None, None);
        restricted.age_restriction = Some(AgeRange { min_months: Some(12), max_months: None });
        let mut facts = facts_with_weight(Some(14.2));
        facts.age = None;
        let dose = calculate(&restricted, &facts);
        assert!(!dose.success);
        assert!(dose.failure_reason.as_deref().unwrap().contains("age is unknown"));
    }

    #[test]
    fn weight_restriction_enforced() {
        let mut restricted = rule(0.15, None, None);
        restricted.weight_restriction =
            Some(WeightRange { min_kg: Some(20.0), max_kg: None });
        let dose = calculate(&restricted, &facts_with_weight(Some(14.2)));
        assert!(!dose.success);
        assert!(dose.failure_reason.as_deref().unwrap().contains("weight"));
    }

    #[test]
    fn full_precision_before_clamp() {
        // 0.3333... * 30 exceeds max only at full precision; a pre-rounded
        // value would slip under the bound.
        let dose = calculate(&rule(1.0 / 3.0, None, Some(9.9999)), &facts_with_weight(Some(30.0)));
        assert_eq!(dose.calculated_dose, Some((1.0 / 3.0) * 30.0));
        assert_eq!(dose.final_dose, Some(9.9999));
    }
}
