//! Error types for schemashift.

use thiserror::Error;

/// The main error type for schemashift operations.
#[derive(Debug, Error)]
pub enum ShiftError {
    /// An option key outside the recognized set for a value object.
    #[error("\"{option}\" is not a valid {kind} option.")]
    InvalidOption { kind: &'static str, option: String },

    /// A recognized option key carrying a value of the wrong shape.
    #[error("Invalid value for {kind} option \"{option}\": {message}")]
    InvalidOptionValue {
        kind: &'static str,
        option: String,
        message: String,
    },

    /// Symbolic column type that is not recognized.
    #[error("Unknown column type: '{0}'. Wrap adapter-specific types in a Literal")]
    UnknownType(String),

    /// Foreign key with a different number of local and referenced columns.
    #[error(
        "Foreign key arity mismatch: {local} local column(s) but {referenced} referenced column(s)"
    )]
    ForeignKeyArity { local: usize, referenced: usize },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Action kind that has no automatic inverse.
    #[error("Cannot reverse a \"{0}\" action")]
    Irreversible(&'static str),

    /// ALTER template without exactly one placeholder.
    #[error("Invalid ALTER template: {0}")]
    Template(String),

    /// Failed to parse a field spec.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShiftError {
    /// Create an unrecognized-option error.
    pub fn invalid_option(kind: &'static str, option: impl Into<String>) -> Self {
        Self::InvalidOption {
            kind,
            option: option.into(),
        }
    }

    /// Create a wrong-value-shape error for a recognized option.
    pub fn invalid_value(
        kind: &'static str,
        option: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidOptionValue {
            kind,
            option: option.into(),
            message: message.into(),
        }
    }

    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }
}

/// Result type alias for schemashift operations.
pub type ShiftResult<T> = Result<T, ShiftError>;
