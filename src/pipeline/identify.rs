//! Condition identification: symptom-overlap scoring against each known
//! condition's diagnostic criteria, with an assessment name/alias boost and
//! a hard age-applicability filter.
//!
//! Confidence must be monotonic in matched evidence: a match whose evidence
//! is a strict superset of another's may never score strictly lower, even
//! across conditions with different criteria counts. A plain coverage ratio
//! (matched/total) breaks that, so the score counts whole evidence units
//! per matched phrase and keeps coverage only as the fractional component:
//!   s = (m - 1) + m/t   (m matched of t distinct phrases, m >= 1)
//!   base = s / (s + 1)  in [0, 1)
//! Any m+1 match therefore outranks any m match regardless of t.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::PipelineConfig;
use crate::models::{ConditionRecord, PatientFacts};

use super::types::ConditionMatch;

/// Rank every known condition against the extracted facts, descending by
/// confidence. Deterministic: ties break on matched-symptom count, then
/// condition_id. May be empty; the orchestrator decides whether that is
/// terminal.
pub fn identify(
    facts: &PatientFacts,
    conditions: &BTreeMap<String, ConditionRecord>,
    config: &PipelineConfig,
) -> Vec<ConditionMatch> {
    let mut matches: Vec<ConditionMatch> = conditions
        .values()
        .filter_map(|condition| score_condition(facts, condition, config))
        .filter(|m| m.confidence > config.confidence_floor)
        .collect();

    matches.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.matched_symptoms.len().cmp(&a.matched_symptoms.len()))
            .then_with(|| a.condition_id.cmp(&b.condition_id))
    });

    matches
}

/// Score one condition. Returns `None` when the age filter excludes it or
/// there is no evidence at all.
fn score_condition(
    facts: &PatientFacts,
    condition: &ConditionRecord,
    config: &PipelineConfig,
) -> Option<ConditionMatch> {
    // Hard filter: an age outside the applicability window excludes the
    // condition outright. Unknown age excludes nothing.
    if let Some(age) = facts.age {
        if !condition.age_applicability.contains(age.in_months()) {
            return None;
        }
    }

    let phrases = condition.distinct_criteria_phrases();
    let total = phrases.len();

    let mut matched_phrases: Vec<&str> = Vec::new();
    let mut matched_symptoms: Vec<String> = Vec::new();
    for mention in &facts.symptoms {
        let mention_lower = mention.to_lowercase();
        for phrase in &phrases {
            if phrase.contains(&mention_lower) {
                if !matched_phrases.contains(&phrase.as_str()) {
                    matched_phrases.push(phrase);
                }
                if !matched_symptoms.contains(mention) {
                    matched_symptoms.push(mention.clone());
                }
            }
        }
    }

    let m = matched_phrases.len();
    let base = if m == 0 || total == 0 {
        0.0
    } else {
        let s = (m as f64 - 1.0) + m as f64 / total as f64;
        s / (s + 1.0)
    };

    let boost = if condition.named_in(&facts.assessment) {
        config.alias_boost
    } else {
        0.0
    };

    let confidence = (base + boost).min(1.0);
    if confidence <= 0.0 {
        return None;
    }

    Some(ConditionMatch {
        condition_id: condition.condition_id.clone(),
        condition_name: condition.name.clone(),
        confidence,
        matched_symptoms,
    })
}
