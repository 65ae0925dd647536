//! Terminal pipeline errors. Per-medication dosing failures are not here:
//! they are recovered locally and carried inside `CalculatedDose`.

use thiserror::Error;

use super::parser::ParseError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Input(#[from] ParseError),

    #[error("no condition matched the extracted evidence above the confidence floor")]
    NoMatch,

    #[error("reference data integrity violation: {0}")]
    DataIntegrity(String),
}

impl PipelineError {
    /// Stable code for the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Input(_) => "INPUT_ERROR",
            Self::NoMatch => "NO_MATCH",
            Self::DataIntegrity(_) => "DATA_INTEGRITY_ERROR",
        }
    }
}
