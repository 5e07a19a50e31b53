//! Error types for spec normalization, loading and validation.

use std::path::PathBuf;
use thiserror::Error;

use crate::report::Report;

/// Faults in the Swagger document itself.
///
/// These are data-integrity problems of the input spec, never outcomes of
/// validating a payload, so they are kept out of [`Report`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecError {
    #[error("model '{name}' is not defined in definitions")]
    UnknownModel { name: String },

    #[error("operation {method} {path} has no operationId")]
    MissingOperationId { method: String, path: String },

    #[error("missing '{field}' at {path}")]
    MissingField { path: String, field: String },

    #[error("invalid value at {path}: expected {expected}, got {actual}")]
    InvalidType {
        path: String,
        expected: &'static str,
        actual: String,
    },

    #[error("allOf chain starting at '{name}' loops back on itself")]
    CompositionCycle { name: String },

    #[error("operation '{operation}' has no model to validate against")]
    NoModel { operation: String },
}

/// Errors while loading a document from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

/// Errors returned by the `validate_*` family.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidateError {
    #[error("The operation_name parameter must be a non-empty string")]
    EmptyOperationName,

    #[error("The {argument} parameter must be a dict")]
    NotAMapping { argument: &'static str },

    #[error("{operation} operation does not support")]
    UnsupportedOperation { operation: String },

    #[error("{report}")]
    Invalid { report: Report },

    #[error(transparent)]
    Spec(#[from] SpecError),
}

impl SpecError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Invalid { .. } => 1,
            ValidateError::Spec(e) => e.exit_code(),
            _ => 2,
        }
    }

    /// Caller misuse: bad operation name, bad argument shape, or unknown operation.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            ValidateError::EmptyOperationName
                | ValidateError::NotAMapping { .. }
                | ValidateError::UnsupportedOperation { .. }
        )
    }

    /// The findings, when this is a structural validation failure.
    pub fn report(&self) -> Option<&Report> {
        match self {
            ValidateError::Invalid { report } => Some(report),
            _ => None,
        }
    }
}
