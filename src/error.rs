//! Analysis error types.

use thiserror::Error;

/// Errors produced by the reading analysis functions.
///
/// All of them are deterministic: the same input always fails the same way.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// An operation that needs at least one sample received none.
    #[error("{0} requires at least one sample")]
    EmptyInput(&'static str),

    /// A field name absent from the reading schema.
    #[error("invalid reading field {0:?}")]
    InvalidField(String),

    /// A period string that does not match `<integer><unit>`.
    #[error("invalid period {0:?}")]
    InvalidPeriod(String),
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
