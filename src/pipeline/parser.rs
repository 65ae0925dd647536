//! Clinical note parser: ordered, independent field extractors over the
//! whole text, so field order in the source note is irrelevant.
//!
//! Everything degrades softly. The only hard failure is an empty note; any
//! other input yields as much structure as can be found plus an explicit
//! list of the fields that could not be found.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::models::{Age, AgeUnit, Gender, PatientFacts};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("clinical note is empty")]
    EmptyNote,
}

/// Controlled symptom vocabulary. Hits are collected in this order, not note
/// order. Compound phrases come before their substrings so both are reported
/// ("barky cough" and "cough" are distinct mentions downstream).
pub const SYMPTOM_VOCABULARY: &[&str] = &[
    "barky cough",
    "hoarse voice",
    "stridor",
    "recession",
    "work of breathing",
    "difficulty breathing",
    "shortness of breath",
    "wheeze",
    "green sputum",
    "sore throat",
    "runny nose",
    "congestion",
    "chest pain",
    "low-grade fever",
    "fever",
    "cough",
    "poor feeding",
    "fatigue",
    "headache",
    "nausea",
    "vomiting",
    "diarrhea",
    "abdominal pain",
];

static AGE_PATTERNS: LazyLock<Vec<(Regex, AgeUnit)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)\bage:?\s*(\d+)\s*months?\b").unwrap(),
            AgeUnit::Months,
        ),
        (
            Regex::new(r"(?i)\b(\d+)[\s-]*(?:months?|mo)[\s-]+old\b").unwrap(),
            AgeUnit::Months,
        ),
        (
            Regex::new(r"(?i)\bage:?\s*(\d+)\s*(?:years?|yrs?)\b").unwrap(),
            AgeUnit::Years,
        ),
        (
            Regex::new(r"(?i)\b(\d+)[\s-]*(?:years?|yrs?)[\s-]+old\b").unwrap(),
            AgeUnit::Years,
        ),
        (Regex::new(r"(?i)\b(\d+)\s*yo\b").unwrap(), AgeUnit::Years),
        (Regex::new(r"(?i)\bage:?\s*(\d+)\b").unwrap(), AgeUnit::Years),
    ]
});

static WEIGHT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(?:weight|wt):?\s*(\d+(?:\.\d+)?)\s*kg\b").unwrap(),
        Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*kg\b").unwrap(),
    ]
});

static HEIGHT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(?:height|ht):?\s*(\d+(?:\.\d+)?)\s*cm\b").unwrap(),
        Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*cm\b").unwrap(),
    ]
});

/// Labeled forms first; the bare single-letter shorthand ("3 yo M") is
/// case-sensitive so stray lowercase words never read as a gender.
static GENDER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(?:gender|sex):\s*(male|female|m|f)\b").unwrap(),
        Regex::new(r"(?i)\b(male|female)\b").unwrap(),
        Regex::new(r"\b([MF])\b").unwrap(),
    ]
});

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*patient(?:\s+name)?:\s*([^\n,(]+)").unwrap());

static DOB_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:dob|date of birth|born):\s*(\d{1,2}/\d{1,2}/\d{4})").unwrap()
});

/// Unit-aware vital patterns, first match per vital wins.
static VITAL_PATTERNS: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    vec![
        (
            "temperature",
            vec![
                Regex::new(r"(?i)\btemp(?:erature)?:?\s*(\d+(?:\.\d+)?)").unwrap(),
                Regex::new(r"\bT:?\s*(\d+(?:\.\d+)?)\s*°?C?\b").unwrap(),
            ],
        ),
        (
            "heart_rate",
            vec![
                Regex::new(r"(?i)\b(?:heart rate|pulse|hr):?\s*(\d+)").unwrap(),
                Regex::new(r"(?i)\b(\d+)\s*bpm\b").unwrap(),
            ],
        ),
        (
            "respiratory_rate",
            vec![
                Regex::new(r"(?i)\b(?:respiratory rate|resp|rr):?\s*(\d+)").unwrap(),
                Regex::new(r"(?i)\b(\d+)\s*breaths/min\b").unwrap(),
            ],
        ),
        (
            "blood_pressure",
            vec![
                Regex::new(r"(?i)\b(?:blood pressure|bp):?\s*(\d+/\d+)").unwrap(),
                Regex::new(r"(?i)\b(\d+/\d+)\s*mmhg\b").unwrap(),
            ],
        ),
        (
            "oxygen_saturation",
            vec![
                Regex::new(r"(?i)\b(?:o2\s*sat|spo2|oxygen saturation):?\s*(\d+)\s*%?").unwrap(),
            ],
        ),
    ]
});

/// Section headers recognized anywhere at line start. Spans run from the
/// header to the next recognized header or end of text.
static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^\s*(presenting complaint|chief complaint|cc|history of present illness|hpi|history|examination|physical exam|pe|assessment|diagnosis|impression|plan|treatment|management)\s*:",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    PresentingComplaint,
    History,
    Examination,
    Assessment,
    Plan,
}

fn canonical_section(label: &str) -> Section {
    match label.to_lowercase().as_str() {
        "presenting complaint" | "chief complaint" | "cc" => Section::PresentingComplaint,
        "history of present illness" | "hpi" | "history" => Section::History,
        "examination" | "physical exam" | "pe" => Section::Examination,
        "assessment" | "diagnosis" | "impression" => Section::Assessment,
        _ => Section::Plan,
    }
}

/// Parse a raw clinical note into structured patient facts.
pub fn parse(raw_note: &str) -> Result<PatientFacts, ParseError> {
    if raw_note.trim().is_empty() {
        return Err(ParseError::EmptyNote);
    }

    let mut missing = Vec::new();

    let name = extract_name(raw_note);
    if name.is_none() {
        missing.push("name".to_string());
    }

    let age = extract_age(raw_note);
    if age.is_none() {
        missing.push("age".to_string());
    }

    let dob = DOB_PATTERN
        .captures(raw_note)
        .map(|c| c[1].to_string());
    if dob.is_none() {
        missing.push("dob".to_string());
    }

    let weight_kg = extract_weight(raw_note);
    if weight_kg.is_none() {
        missing.push("weight_kg".to_string());
    }

    let height_cm = extract_height(raw_note);
    if height_cm.is_none() {
        missing.push("height_cm".to_string());
    }

    let gender = extract_gender(raw_note);
    if gender.is_none() {
        missing.push("gender".to_string());
    }

    let vitals = extract_vitals(raw_note);
    for (vital, _) in VITAL_PATTERNS.iter() {
        if !vitals.contains_key(*vital) {
            missing.push(vital.to_string());
        }
    }

    let symptoms = extract_symptoms(raw_note);

    let sections = extract_sections(raw_note);
    let assessment = sections.get(&section_key(Section::Assessment)).cloned();
    let plan = sections.get(&section_key(Section::Plan)).cloned();
    if assessment.is_none() {
        missing.push("assessment".to_string());
    }
    if plan.is_none() {
        missing.push("plan".to_string());
    }

    Ok(PatientFacts {
        name,
        age,
        dob,
        weight_kg,
        height_cm,
        gender,
        symptoms,
        vitals,
        presenting_complaint: sections
            .get(&section_key(Section::PresentingComplaint))
            .cloned(),
        history: sections.get(&section_key(Section::History)).cloned(),
        examination: sections.get(&section_key(Section::Examination)).cloned(),
        assessment: assessment.unwrap_or_default(),
        plan: plan.unwrap_or_default(),
        missing_fields: missing,
    })
}

fn section_key(section: Section) -> u8 {
    section as u8
}

fn extract_name(text: &str) -> Option<String> {
    NAME_PATTERN.captures(text).and_then(|c| {
        let name = c[1].trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    })
}

fn extract_age(text: &str) -> Option<Age> {
    for (pattern, unit) in AGE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            if let Ok(value) = captures[1].parse::<u32>() {
                return Some(Age { value, unit: *unit });
            }
        }
    }
    None
}

fn extract_weight(text: &str) -> Option<f64> {
    for pattern in WEIGHT_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            if let Ok(value) = captures[1].parse::<f64>() {
                return Some(value);
            }
        }
    }
    None
}

fn extract_height(text: &str) -> Option<f64> {
    for pattern in HEIGHT_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            if let Ok(value) = captures[1].parse::<f64>() {
                return Some(value);
            }
        }
    }
    None
}

fn extract_gender(text: &str) -> Option<Gender> {
    for pattern in GENDER_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            return match captures[1].to_lowercase().as_str() {
                "m" | "male" => Some(Gender::Male),
                _ => Some(Gender::Female),
            };
        }
    }
    None
}

fn extract_vitals(text: &str) -> BTreeMap<String, String> {
    let mut vitals = BTreeMap::new();
    for (vital, patterns) in VITAL_PATTERNS.iter() {
        for pattern in patterns {
            if let Some(captures) = pattern.captures(text) {
                vitals.insert(vital.to_string(), captures[1].to_string());
                break;
            }
        }
    }
    vitals
}

/// Case-insensitive substring scan of the whole note against the controlled
/// vocabulary, preserving vocabulary order.
fn extract_symptoms(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    SYMPTOM_VOCABULARY
        .iter()
        .filter(|phrase| lower.contains(*phrase))
        .map(|phrase| phrase.to_string())
        .collect()
}

fn extract_sections(text: &str) -> BTreeMap<u8, String> {
    let mut sections = BTreeMap::new();

    let headers: Vec<(Section, usize, usize)> = SECTION_HEADER
        .captures_iter(text)
        .map(|c| {
            let whole = c.get(0).unwrap();
            (canonical_section(&c[1]), whole.start(), whole.end())
        })
        .collect();

    for (i, (section, _, body_start)) in headers.iter().enumerate() {
        let body_end = headers
            .get(i + 1)
            .map(|(_, next_start, _)| *next_start)
            .unwrap_or(text.len());
        let body = text[*body_start..body_end].trim();
        // First header of each kind wins, matching extractor-order semantics.
        sections
            .entry(section_key(*section))
            .or_insert_with(|| body.to_string());
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_NOTE: &str = "Patient: Jack Thompson\n\
        DOB: 12/03/2022\n\
        Gender: M\n\
        Age: 3 years\n\
        Weight: 14.2 kg\n\
        Height: 96.5 cm\n\
        \n\
        Presenting complaint: Barky cough and hoarse voice for 2 days, worse at night.\n\
        \n\
        Examination: Mild stridor when agitated. T 38.2°C, HR 110, RR 28. O2 sat: 97%\n\
        \n\
        Assessment: Moderate croup (laryngotracheobronchitis). Low-grade fever.\n\
        \n\
        Plan: Dexamethasone single dose, observe 2 hours.";

    #[test]
    fn parses_demographics() {
        let facts = parse(FULL_NOTE).unwrap();
        assert_eq!(facts.name.as_deref(), Some("Jack Thompson"));
        assert_eq!(facts.age, Some(Age::years(3)));
        assert_eq!(facts.dob.as_deref(), Some("12/03/2022"));
        assert_eq!(facts.weight_kg, Some(14.2));
        assert_eq!(facts.height_cm, Some(96.5));
        assert_eq!(facts.gender, Some(Gender::Male));
    }

    #[test]
    fn parses_vitals() {
        let facts = parse(FULL_NOTE).unwrap();
        assert_eq!(facts.vitals.get("temperature").map(String::as_str), Some("38.2"));
        assert_eq!(facts.vitals.get("heart_rate").map(String::as_str), Some("110"));
        assert_eq!(facts.vitals.get("respiratory_rate").map(String::as_str), Some("28"));
        assert_eq!(facts.vitals.get("oxygen_saturation").map(String::as_str), Some("97"));
        assert!(!facts.vitals.contains_key("blood_pressure"));
    }

    #[test]
    fn symptoms_in_vocabulary_order() {
        let facts = parse(FULL_NOTE).unwrap();
        assert_eq!(
            facts.symptoms,
            vec!["barky cough", "hoarse voice", "stridor", "low-grade fever", "fever", "cough"]
        );
    }

    #[test]
    fn sections_span_to_next_header() {
        let facts = parse(FULL_NOTE).unwrap();
        assert!(facts.assessment.starts_with("Moderate croup"));
        assert!(facts.assessment.contains("Low-grade fever"));
        assert!(facts.plan.starts_with("Dexamethasone"));
        assert!(facts
            .presenting_complaint
            .as_deref()
            .unwrap()
            .contains("Barky cough"));
    }

    #[test]
    fn empty_note_is_the_only_hard_failure() {
        assert_eq!(parse("").unwrap_err(), ParseError::EmptyNote);
        assert_eq!(parse("   \n\t  ").unwrap_err(), ParseError::EmptyNote);
        assert!(parse("gibberish with no structure at all").is_ok());
    }

    #[test]
    fn missing_fields_are_listed_not_fatal() {
        let facts = parse("3 yo with barky cough").unwrap();
        assert_eq!(facts.age, Some(Age::years(3)));
        assert_eq!(facts.weight_kg, None);
        assert!(facts.missing_fields.contains(&"weight_kg".to_string()));
        assert!(facts.missing_fields.contains(&"name".to_string()));
        assert!(facts.missing_fields.contains(&"assessment".to_string()));
        assert_eq!(facts.assessment, "");
    }

    #[test]
    fn age_in_months() {
        let facts = parse("8 month old with runny nose").unwrap();
        assert_eq!(facts.age, Some(Age::months(8)));
        assert_eq!(facts.age.unwrap().in_months(), 8);
    }

    #[test]
    fn age_patterns_alternatives() {
        assert_eq!(parse("Age: 5").unwrap().age, Some(Age::years(5)));
        assert_eq!(parse("a 4 years old boy").unwrap().age, Some(Age::years(4)));
        assert_eq!(parse("2 yo, febrile").unwrap().age, Some(Age::years(2)));
        assert_eq!(parse("Age: 18 months").unwrap().age, Some(Age::months(18)));
    }

    #[test]
    fn weight_label_preferred_over_bare_number() {
        let facts = parse("given 5 kg of notes... Wt: 14.2 kg").unwrap();
        assert_eq!(facts.weight_kg, Some(14.2));
    }

    #[test]
    fn gender_shorthand_and_words() {
        assert_eq!(parse("3 yo F with cough").unwrap().gender, Some(Gender::Female));
        assert_eq!(parse("Sex: female").unwrap().gender, Some(Gender::Female));
        assert_eq!(parse("a male toddler with fever").unwrap().gender, Some(Gender::Male));
        // Lowercase single letters are not gender shorthand.
        assert_eq!(parse("given 2 m of bandage").unwrap().gender, None);
    }

    #[test]
    fn height_label_preferred_over_bare_number() {
        assert_eq!(parse("Ht: 96.5 cm").unwrap().height_cm, Some(96.5));
        let facts = parse("scar 3 cm long. Height: 96.5 cm").unwrap();
        assert_eq!(facts.height_cm, Some(96.5));
    }

    #[test]
    fn name_never_fabricated() {
        let facts = parse("Assessment: croup in a toddler").unwrap();
        assert_eq!(facts.name, None);
    }

    #[test]
    fn field_order_is_irrelevant() {
        let reordered = "Plan: observe at home\nAssessment: mild croup\nWeight: 14.2 kg\nAge: 3 years";
        let facts = parse(reordered).unwrap();
        assert_eq!(facts.weight_kg, Some(14.2));
        assert_eq!(facts.age, Some(Age::years(3)));
        // Plan appears first in the note but still ends at the next header.
        assert_eq!(facts.plan, "observe at home");
        assert!(facts.assessment.starts_with("mild croup"));
    }

    #[test]
    fn alternate_section_labels() {
        let facts = parse("Impression: viral wheeze\nManagement: salbutamol trial").unwrap();
        assert_eq!(facts.assessment, "viral wheeze");
        assert_eq!(facts.plan, "salbutamol trial");
    }
}
