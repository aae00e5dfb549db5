//! Error type shared by the enum `FromStr` implementations.

use thiserror::Error;

/// Returned when a stored or user-supplied string does not name a member
/// of one of the closed lifecycle enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {kind} value: `{value}`")]
pub struct ParseEnumError {
    /// Which enum rejected the value (e.g. "order type").
    pub kind: &'static str,
    /// The offending input.
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
