//! Error types for race control.
//!
//! Errors fall into four categories with different blast radii:
//!
//! - **Configuration Errors**: missing or short roster data, fatal at startup
//! - **Transport Errors**: connect/accept/read failures, end the current capture session only
//! - **Persistence Errors**: short reads or writes against the historic store, fatal
//! - **Contract Violations**: out-of-range car ids or unknown enum values on the wire, fatal
//!
//! Nothing in the crate retries. A transport error leaves the historic store untouched
//! for the stage that was being captured.
//!
//! ```rust
//! use racecontrol::RaceControlError;
//!
//! let error = RaceControlError::contract_violation("car id 42 outside [0, 20)");
//! assert!(error.is_fatal());
//! assert!(!error.is_session_scoped());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for race control operations.
pub type Result<T, E = RaceControlError> = std::result::Result<T, E>;

/// Main error type for race control operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RaceControlError {
    #[error("Invalid season configuration: {reason}")]
    Configuration { reason: String },

    #[error("Event transport failed while {context}")]
    Transport {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Historic store {path} failed: {context}")]
    Persistence {
        path: PathBuf,
        context: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Contract violation: {details}")]
    ContractViolation { details: String },
}

impl RaceControlError {
    /// Returns whether the error only ends the in-progress capture session.
    pub fn is_session_scoped(&self) -> bool {
        matches!(self, RaceControlError::Transport { .. })
    }

    /// Returns whether the error must abort the whole process.
    pub fn is_fatal(&self) -> bool {
        !self.is_session_scoped()
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            RaceControlError::Configuration { .. } => vec![
                "Check the season file lists at least 20 drivers",
                "Check the season file lists between 1 and 24 rounds",
                "Verify the YAML syntax of the season file",
            ],
            RaceControlError::Transport { .. } => vec![
                "Restart the timing feed and capture the stage again",
                "Check the listen address and port are reachable",
            ],
            RaceControlError::Persistence { .. } => vec![
                "Check the historic file is writable",
                "Ensure sufficient disk space",
                "Restore the historic file from a backup if it was truncated",
            ],
            RaceControlError::ContractViolation { .. } => vec![
                "Verify the timing feed speaks the same wire format version",
                "Report the offending event sequence id",
            ],
        }
    }

    /// Helper constructor for configuration errors.
    pub fn configuration(reason: impl Into<String>) -> Self {
        RaceControlError::Configuration { reason: reason.into() }
    }

    /// Helper constructor for transport errors.
    pub fn transport(context: impl Into<String>, source: std::io::Error) -> Self {
        RaceControlError::Transport { context: context.into(), source }
    }

    /// Helper constructor for persistence errors caused by an I/O failure.
    pub fn persistence(path: PathBuf, context: impl Into<String>, source: std::io::Error) -> Self {
        RaceControlError::Persistence { path, context: context.into(), source: Some(source) }
    }

    /// Helper constructor for persistence errors detected without an I/O failure,
    /// such as a truncated or undecodable record.
    pub fn corrupt_record(path: PathBuf, context: impl Into<String>) -> Self {
        RaceControlError::Persistence { path, context: context.into(), source: None }
    }

    /// Helper constructor for contract violations.
    pub fn contract_violation(details: impl Into<String>) -> Self {
        RaceControlError::ContractViolation { details: details.into() }
    }
}

impl From<serde_yaml_ng::Error> for RaceControlError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        RaceControlError::Configuration { reason: err.to_string() }
    }
}
