//! Error types for the sequence crate.

use thiserror::Error;

/// Errors raised by sequence constructors and terminal evaluators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeqError {
    /// An argument to a constructor-like operator was out of its domain.
    #[error("invalid argument '{arg}': {reason}")]
    InvalidArgument {
        arg: &'static str,
        reason: &'static str,
    },

    /// `element_at` was asked for a position past the end of the sequence.
    #[error("index {index} is out of range")]
    IndexOutOfRange { index: usize },

    /// The sequence (or the part of it matching a predicate) has no elements.
    #[error("the sequence contains no matching element")]
    EmptySequence,

    /// `single` found more than one qualifying element.
    #[error("the sequence contains more than one matching element")]
    MultipleMatches,

    /// A numeric evaluator met an element that is not a number.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Result type for sequence operations.
pub type Result<T> = std::result::Result<T, SeqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = SeqError::InvalidArgument {
            arg: "count",
            reason: "must not be negative",
        };
        assert_eq!(
            err.to_string(),
            "invalid argument 'count': must not be negative"
        );
        assert_eq!(
            SeqError::IndexOutOfRange { index: 4 }.to_string(),
            "index 4 is out of range"
        );
        assert_eq!(
            SeqError::TypeMismatch {
                expected: "number",
                actual: "string"
            }
            .to_string(),
            "type mismatch: expected number, got string"
        );
    }
}
