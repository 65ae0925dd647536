//! Triago: a deterministic clinical-note reasoning pipeline.
//!
//! One logical call: [`process`] takes a raw note and a read-only
//! [`reference::ReferenceData`] store, and returns a structured, auditable
//! recommendation: extracted patient facts, the top condition match with
//! its evidence, weight-based doses clamped to safety bounds, and a
//! severity-tailored treatment plan. Transport, auth, and rendering are the
//! caller's concern; the core makes no outbound calls and writes no state.

pub mod config;
pub mod models;
pub mod pipeline;
pub mod reference;

pub use config::PipelineConfig;
pub use pipeline::error::PipelineError;
pub use pipeline::process;
pub use pipeline::types::{
    CalculatedDose, ConditionMatch, FollowUp, Monitoring, PipelineFailure, PipelineResult,
    PipelineSuccess, TreatmentPlan,
};
pub use reference::{ReferenceData, StoreError};
