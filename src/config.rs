use crate::models::Severity;

/// Confidence added when the assessment names the condition or one of its
/// aliases. Sized so a name hit alone outranks a weak single-symptom match
/// but never beats broader symptom evidence.
pub const DEFAULT_ALIAS_BOOST: f64 = 0.2;

/// A condition match is usable only when its confidence is strictly above
/// this floor. 0.0 means any positive evidence counts.
pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.0;

/// Severity assumed when the assessment states no tier.
pub const DEFAULT_SEVERITY: Severity = Severity::Moderate;

/// Tunable pipeline constants, passed explicitly so invocations are
/// independently testable with fixture data.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub alias_boost: f64,
    pub confidence_floor: f64,
    pub default_severity: Severity,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            alias_boost: DEFAULT_ALIAS_BOOST,
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
            default_severity: DEFAULT_SEVERITY,
        }
    }
}
