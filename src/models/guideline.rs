use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::condition::Severity;

/// Monitoring instructions for one severity tier of a guideline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringProtocol {
    pub frequency: String,
    pub parameters: Vec<String>,
    pub duration: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Follow-up instructions for one severity tier of a guideline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpProtocol {
    pub timeline: String,
    pub instructions: Vec<String>,
    #[serde(default)]
    pub parent_education: Vec<String>,
}

/// One severity tier of a guideline's treatment algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityProtocol {
    pub monitoring: MonitoringProtocol,
    pub follow_up: FollowUpProtocol,
    /// Conditions for safe discharge at this tier.
    #[serde(default)]
    pub discharge_criteria: Vec<String>,
}

/// An externally-sourced, condition-linked protocol for monitoring and
/// follow-up, distinct from the condition's own embedded medication rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidelineRecord {
    pub guideline_id: String,
    pub name: String,
    #[serde(default)]
    pub source: Option<String>,
    /// Conditions this guideline covers, by condition_id.
    pub condition_ids: Vec<String>,
    pub treatment_algorithm: BTreeMap<Severity, SeverityProtocol>,
}

impl GuidelineRecord {
    pub fn covers(&self, condition_id: &str) -> bool {
        self.condition_ids.iter().any(|id| id == condition_id)
    }

    pub fn protocol_for(&self, severity: Severity) -> Option<&SeverityProtocol> {
        self.treatment_algorithm.get(&severity)
    }
}
