use thiserror::Error;

use crate::RecordShape;

#[derive(Error, Debug)]
pub enum ScreenError {
    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Wrong record shape: expected {expected:?}, got {actual:?}")]
    WrongShape {
        expected: RecordShape,
        actual: RecordShape,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Rule failure: {0}")]
    RuleFailure(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
