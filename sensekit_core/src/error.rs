//! Unified error handling for SenseKit
//!
//! Two layers of errors live here:
//!
//! - [`InitStringError`] is the closed set of failures the init string parser
//!   can produce. Every variant carries the index of the offending clause.
//! - [`SenseError`] is the workspace-wide error type used by configuration
//!   loading, HAL backends and drivers. Parser errors convert into it.

use thiserror::Error;

use crate::init_string::{Arity, ParamType, ResourceKind};

/// Failure produced while parsing an init string
///
/// Clause and parameter indices are zero based. Parameter indices count the
/// values after the kind tag, so in `"i2c,0,0x3C"` the address is parameter 1.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InitStringError {
    /// Consecutive, leading or trailing delimiters produced an empty token
    #[error("clause {clause}: empty token{}", param_suffix(.param))]
    EmptyToken { clause: usize, param: Option<usize> },

    /// The clause does not start with a known kind tag
    #[error("clause {clause}: unknown resource kind '{token}'")]
    UnknownResourceKind { clause: usize, token: String },

    /// Too few or too many parameters for the clause kind
    #[error("clause {clause}: '{kind}' expects {expected} parameter(s), got {actual}")]
    ArityMismatch {
        clause: usize,
        kind: ResourceKind,
        expected: Arity,
        actual: usize,
    },

    /// A parameter does not parse as its positional type
    #[error("clause {clause}, parameter {param}: expected {expected}, got '{token}'")]
    TypeMismatch {
        clause: usize,
        param: usize,
        expected: ParamType,
        token: String,
    },

    /// A pin, bus, address or port index was written as a negative number
    #[error("clause {clause}, parameter {param}: negative index '{token}' is not allowed")]
    NegativeIndexNotAllowed {
        clause: usize,
        param: usize,
        token: String,
    },

    /// The value parsed but does not fit the field
    #[error("clause {clause}, parameter {param}: '{token}' is outside {range}")]
    OutOfRange {
        clause: usize,
        param: usize,
        token: String,
        range: String,
    },
}

fn param_suffix(param: &Option<usize>) -> String {
    match param {
        Some(p) => format!(" at parameter {}", p),
        None => String::new(),
    }
}

impl InitStringError {
    /// Index of the clause that caused the failure
    pub fn clause_index(&self) -> usize {
        match self {
            Self::EmptyToken { clause, .. }
            | Self::UnknownResourceKind { clause, .. }
            | Self::ArityMismatch { clause, .. }
            | Self::TypeMismatch { clause, .. }
            | Self::NegativeIndexNotAllowed { clause, .. }
            | Self::OutOfRange { clause, .. } => *clause,
        }
    }

    /// Short machine-friendly name of the failure kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::EmptyToken { .. } => "EmptyToken",
            Self::UnknownResourceKind { .. } => "UnknownResourceKind",
            Self::ArityMismatch { .. } => "ArityMismatch",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::NegativeIndexNotAllowed { .. } => "NegativeIndexNotAllowed",
            Self::OutOfRange { .. } => "OutOfRange",
        }
    }
}

/// Main error type for SenseKit operations
#[derive(Debug, Error)]
pub enum SenseError {
    /// I/O related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parsing or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed init string
    #[error("Invalid init string: {0}")]
    InitString(#[from] InitStringError),

    /// Driver-related errors
    #[error("Driver error: {0}")]
    Driver(String),

    /// Errors reported by a hardware abstraction backend
    #[error("HAL '{backend}' error: {message}")]
    Hal { backend: String, message: String },

    /// The pin or bus is already claimed by another handle
    #[error("Resource busy: {0}")]
    ResourceBusy(String),

    /// The HAL does not know the requested pin or bus
    #[error("Invalid pin: {0}")]
    InvalidPin(String),

    /// Resource not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid input/argument errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/Deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Feature not available errors
    #[error("Feature not available: {0}")]
    FeatureNotAvailable(String),

    /// Catch-all for other error types
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using SenseError
pub type SenseResult<T> = Result<T, SenseError>;

impl From<serde_json::Error> for SenseError {
    fn from(err: serde_json::Error) -> Self {
        SenseError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SenseError {
    fn from(err: toml::de::Error) -> Self {
        SenseError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for SenseError {
    fn from(err: toml::ser::Error) -> Self {
        SenseError::Serialization(format!("TOML serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for SenseError {
    fn from(err: serde_yaml::Error) -> Self {
        SenseError::Serialization(format!("YAML error: {}", err))
    }
}

impl From<anyhow::Error> for SenseError {
    fn from(err: anyhow::Error) -> Self {
        SenseError::Other(err.to_string())
    }
}

impl From<&str> for SenseError {
    fn from(msg: &str) -> Self {
        SenseError::Other(msg.to_string())
    }
}

impl From<String> for SenseError {
    fn from(msg: String) -> Self {
        SenseError::Other(msg)
    }
}

// Helper methods
impl SenseError {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(msg: S) -> Self {
        SenseError::Config(msg.into())
    }

    /// Create a driver error
    pub fn driver<S: Into<String>>(msg: S) -> Self {
        SenseError::Driver(msg.into())
    }

    /// Create a HAL error with backend name and message
    pub fn hal<S: Into<String>, T: Into<String>>(backend: S, message: T) -> Self {
        SenseError::Hal {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create a resource busy error
    pub fn busy<S: Into<String>>(resource: S) -> Self {
        SenseError::ResourceBusy(resource.into())
    }

    /// Create an invalid pin error
    pub fn invalid_pin<S: Into<String>>(msg: S) -> Self {
        SenseError::InvalidPin(msg.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        SenseError::NotFound(resource.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        SenseError::InvalidInput(msg.into())
    }

    /// Check if this is an init string error
    pub fn is_init_string(&self) -> bool {
        matches!(self, SenseError::InitString(_))
    }

    /// Check if this is a resource busy error
    pub fn is_busy(&self) -> bool {
        matches!(self, SenseError::ResourceBusy(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, SenseError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_message() {
        let clause = InitStringError::EmptyToken {
            clause: 2,
            param: None,
        };
        assert_eq!(clause.to_string(), "clause 2: empty token");

        let param = InitStringError::EmptyToken {
            clause: 0,
            param: Some(1),
        };
        assert_eq!(param.to_string(), "clause 0: empty token at parameter 1");
    }

    #[test]
    fn test_clause_index() {
        let err = InitStringError::UnknownResourceKind {
            clause: 3,
            token: "foo".to_string(),
        };
        assert_eq!(err.clause_index(), 3);
        assert_eq!(err.kind_name(), "UnknownResourceKind");
        assert!(err.to_string().contains("'foo'"));
    }

    #[test]
    fn test_conversion_into_sense_error() {
        let err: SenseError = InitStringError::NegativeIndexNotAllowed {
            clause: 0,
            param: 0,
            token: "-1".to_string(),
        }
        .into();
        assert!(err.is_init_string());
        assert!(err.to_string().starts_with("Invalid init string:"));
    }

    #[test]
    fn test_helpers() {
        assert!(SenseError::busy("gpio 4").is_busy());
        assert!(SenseError::not_found("bumper").is_not_found());
        assert_eq!(
            SenseError::hal("simulation", "boom").to_string(),
            "HAL 'simulation' error: boom"
        );
    }
}
