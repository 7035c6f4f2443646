//! Unified Error Model
use thiserror::Error;

use crate::tag::ValueKind;

/// Invalid registration or configuration. Always fatal, surfaced before any
/// trial runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("CONFIG/TAG: tag `{tag}` is bound to {existing} but `{operation}` declares {declared}")]
    IncompatibleTag {
        tag: String,
        existing: ValueKind,
        declared: ValueKind,
        operation: String,
    },

    #[error("CONFIG/DUPLICATE: an operation named `{0}` is already registered")]
    DuplicateOperation(String),

    #[error("CONFIG/OPERATION: `{name}`: {reason}")]
    InvalidOperation { name: String, reason: String },

    #[error("CONFIG/CLOSED: cannot register `{0}` after the search has started")]
    RegistrationClosed(String),

    #[error("CONFIG/STATE: search driver is {0}, expected idle")]
    NotIdle(String),

    #[error("CONFIG/VALUE: {0}")]
    InvalidValue(String),

    #[error("CONFIG/PARSE: {0}")]
    Parse(String),
}

/// Raised when an operation needs more values than a stack holds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("STACK/UNDERFLOW: `{tag}` holds {available} value(s), {required} required")]
pub struct StackUnderflow {
    pub tag: String,
    pub required: usize,
    pub available: usize,
}

/// Error raised by a user-supplied generator, transform or predicate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("OP/{operation}: {message}")]
pub struct OperationError {
    pub operation: String,
    pub message: String,
}

impl OperationError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Presentation failure. Never changes the search result.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("REPORT/RENDER: {0}")]
    Render(String),

    #[error("REPORT/IO: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Underflow(#[from] StackUnderflow),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_prefixes() {
        let err = ConfigurationError::DuplicateOperation("add".to_string());
        assert!(err.to_string().starts_with("CONFIG/DUPLICATE"));

        let err = StackUnderflow {
            tag: "floats".to_string(),
            required: 2,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "STACK/UNDERFLOW: `floats` holds 1 value(s), 2 required"
        );

        let err = OperationError::new("div", "division by zero");
        assert_eq!(err.to_string(), "OP/div: division by zero");
    }

    #[test]
    fn test_engine_error_wraps() {
        let err: EngineError = OperationError::new("mul", "overflow").into();
        assert!(matches!(err, EngineError::Operation(_)));
    }
}
