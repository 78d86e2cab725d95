//! Error types for truth-parse operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unsupported parse result: {0}")]
    UnsupportedResult(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Unresolved timezone: {0}")]
    UnresolvedTimezone(String),

    #[error("Invalid syntax: {0}")]
    InvalidSyntax(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;
