use thiserror::Error;

use crate::pipeline::Stage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValuationError {
    #[error("valuation denominator is zero")]
    DivisionByZero,

    #[error("{field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("uploaded file is not valid CSV: {0}")]
    Parse(String),

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}: column '{column}' has invalid value '{value}' ({reason})")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error("row {row}: valuation denominator is zero")]
    DivisionByZero { row: usize },

    #[error("cannot {operation} while session is {stage:?}")]
    Stage { operation: &'static str, stage: Stage },

    #[error("failed to write CSV: {0}")]
    Write(String),
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Parse(err.to_string())
    }
}
