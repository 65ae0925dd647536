pub mod condition;
pub mod guideline;
pub mod patient;

pub use condition::{
    AgeRange, ConditionRecord, MedicationRule, Severity, UnknownSeverity, WeightRange,
};
pub use guideline::{FollowUpProtocol, GuidelineRecord, MonitoringProtocol, SeverityProtocol};
pub use patient::{Age, AgeUnit, Gender, PatientFacts};
