//! # Error Types
//!
//! Structured error types for loadcomb_core. Errors carry enough context
//! (family, missing table key, offending action id) for an engineer to fix
//! the code-profile or the action catalog without reading the source.
//!
//! ## Example
//!
//! ```rust
//! use loadcomb_core::errors::{ComboError, ComboResult};
//!
//! fn check_gamma(gamma: f64) -> ComboResult<()> {
//!     if gamma < 0.0 {
//!         return Err(ComboError::invalid_input(
//!             "gamma",
//!             gamma.to_string(),
//!             "Partial factors cannot be negative",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_gamma(-1.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combinations::LimitStateFamily;

/// Result type alias for loadcomb_core operations
pub type ComboResult<T> = Result<T, ComboError>;

/// Which configuration table a lookup went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigTable {
    /// Partial safety factors (γ)
    SafetyFactors,
    /// Combination factors (ψ0, ψ1, ψ2)
    CombinationFactors,
}

impl std::fmt::Display for ConfigTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTable::SafetyFactors => write!(f, "safety-factor"),
            ConfigTable::CombinationFactors => write!(f, "combination-factor"),
        }
    }
}

/// Structured error type for catalog building and combination generation.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum ComboError {
    /// Two actions registered with the same id
    #[error("Duplicate action: '{id}' is already registered")]
    DuplicateAction { id: String },

    /// A safety-factor or combination-factor entry is missing from the code profile
    #[error("Configuration error{}: no {table} entry for {key} (needed by action '{action_id}')", in_family(.family))]
    Configuration {
        table: ConfigTable,
        key: String,
        action_id: String,
        family: Option<LimitStateFamily>,
    },

    /// The dependency relation between actions contains a cycle
    #[error("Cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// Exhaustive sense enumeration would exceed the supported group count
    #[error("Enumeration limit in {family}: {groups} origin groups exceed the exhaustive limit of {limit}")]
    EnumerationLimit {
        family: LimitStateFamily,
        groups: usize,
        limit: usize,
    },

    /// No built-in code profile with this name
    #[error("Unknown code profile: {name}")]
    UnknownProfile { name: String },

    /// An input value is invalid (out of range, wrong sense, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

fn in_family(family: &Option<LimitStateFamily>) -> String {
    match family {
        Some(family) => format!(" in {}", family),
        None => String::new(),
    }
}

impl ComboError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        ComboError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a Configuration error for a missing table entry
    pub fn configuration(table: ConfigTable, key: impl Into<String>, action_id: impl Into<String>) -> Self {
        ComboError::Configuration {
            table,
            key: key.into(),
            action_id: action_id.into(),
            family: None,
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        ComboError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Attach the family whose generation this error aborted.
    ///
    /// Only configuration errors carry a family slot; other variants are
    /// returned unchanged.
    pub fn in_family(self, family: LimitStateFamily) -> Self {
        match self {
            ComboError::Configuration {
                table,
                key,
                action_id,
                family: None,
            } => ComboError::Configuration {
                table,
                key,
                action_id,
                family: Some(family),
            },
            other => other,
        }
    }

    /// Whether the error is a code-profile problem the engineer can fix in configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ComboError::Configuration { .. } | ComboError::UnknownProfile { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ComboError::DuplicateAction { .. } => "DUPLICATE_ACTION",
            ComboError::Configuration { .. } => "CONFIGURATION",
            ComboError::CyclicDependency { .. } => "CYCLIC_DEPENDENCY",
            ComboError::EnumerationLimit { .. } => "ENUMERATION_LIMIT",
            ComboError::UnknownProfile { .. } => "UNKNOWN_PROFILE",
            ComboError::InvalidInput { .. } => "INVALID_INPUT",
            ComboError::FileError { .. } => "FILE_ERROR",
            ComboError::SerializationError { .. } => "SERIALIZATION_ERROR",
            ComboError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}
