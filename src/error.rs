//! Error types for SMI-S topology discovery
//!
//! Two layers of errors exist. [`Error`] covers everything that can happen
//! while talking to a CIM endpoint or wiring discoverers together. [`ParseError`]
//! is the narrow, per-instance failure that the parse boundary catches so a
//! single malformed CIM instance never aborts discovery of its class.

use thiserror::Error;

/// Unified error type for discovery
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Wiring Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown CIM namespace: {0}")]
    UnknownNamespace(String),

    #[error("Unknown SMI-S vendor: {0}")]
    UnknownVendor(String),

    // =========================================================================
    // Provider Errors
    // =========================================================================
    #[error("CIM class unavailable: {class_name} - {reason}")]
    ClassUnavailable { class_name: String, reason: String },

    #[error("Partial data for CIM class {class_name}: {reason}")]
    PartialData { class_name: String, reason: String },

    #[error("CIM transport error: {0}")]
    Transport(String),

    // =========================================================================
    // Snapshot Errors
    // =========================================================================
    #[error("Snapshot format error: {0}")]
    SnapshotFormat(String),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the discovery engine does when it meets an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Abort the run and hand the error to the caller
    Propagate,
    /// Leave the affected topology field empty and continue
    SkipField,
    /// Drop the affected instance and continue the class
    SkipInstance,
}

impl Error {
    /// Determine what action to take for this error
    pub fn action(&self) -> ErrorAction {
        match self {
            // Wiring defects cannot be worked around at runtime
            Error::Configuration(_) | Error::UnknownNamespace(_) | Error::UnknownVendor(_) => {
                ErrorAction::Propagate
            }

            Error::PartialData { .. } => ErrorAction::SkipInstance,

            Error::ClassUnavailable { .. }
            | Error::Transport(_)
            | Error::SnapshotFormat(_)
            | Error::JsonParse(_)
            | Error::YamlParse(_)
            | Error::Io(_) => ErrorAction::SkipField,
        }
    }

    /// Check if this error must stop a discovery run
    pub fn is_fatal(&self) -> bool {
        matches!(self.action(), ErrorAction::Propagate)
    }

    /// Shorthand for a provider that does not implement a class
    pub fn class_unavailable(class_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ClassUnavailable {
            class_name: class_name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for discovery
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Instance Parse Errors
// =============================================================================

/// Failure to turn one CIM instance into a domain object
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing property {0}")]
    MissingProperty(String),

    #[error("property {property} is not numeric: {value}")]
    InvalidNumber { property: String, value: String },

    #[error("empty identity for {0}")]
    EmptyIdentity(String),
}

impl ParseError {
    /// Lift into a crate error, attributed to the class being parsed
    pub fn into_partial(self, class_name: &str) -> Error {
        Error::PartialData {
            class_name: class_name.to_string(),
            reason: self.to_string(),
        }
    }
}
