//! Error types for the income evaluation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate.
//! Only structural problems are errors: anything the engine can still compute
//! around is reported as a [`Flag`](crate::models::Flag) instead.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single violated constraint in the raw input.
///
/// # Example
///
/// ```
/// use income_engine::error::FieldViolation;
///
/// let violation = FieldViolation::new("employments[0].baseRate", "must be non-negative");
/// assert_eq!(violation.to_string(), "employments[0].baseRate: must be non-negative");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Path to the offending field, e.g. `paystubs[1].employmentId`.
    pub path: String,
    /// What constraint the field violated.
    pub reason: String,
}

impl FieldViolation {
    /// Creates a new violation.
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Every violation found while validating one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// The violations, in the order they were found.
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Returns true if a violation was recorded for the given path.
    pub fn has_path(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s)", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "; {}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The main error type for the income evaluation engine.
///
/// # Example
///
/// ```
/// use income_engine::error::EngineError;
///
/// let error = EngineError::RulesetNotFound {
///     id: "fha-w2".to_string(),
///     version: "9.9.9".to_string(),
/// };
/// assert_eq!(error.to_string(), "Ruleset not found: fha-w2@9.9.9");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// The raw input failed schema validation.
    #[error("Invalid evidence: {0}")]
    Validation(#[from] ValidationError),

    /// No ruleset is registered under the requested key.
    #[error("Ruleset not found: {id}@{version}")]
    RulesetNotFound {
        /// The requested ruleset id.
        id: String,
        /// The requested ruleset version.
        version: String,
    },

    /// No ruleset is registered for the bundle's loan program.
    #[error("No ruleset registered for program {program}")]
    ProgramNotSupported {
        /// The program name.
        program: String,
    },

    /// A ruleset configuration names a rule function that does not exist.
    #[error("Unknown rules '{rules}' in ruleset {id}")]
    UnknownRules {
        /// The ruleset id declaring the rules.
        id: String,
        /// The unknown rule function name.
        rules: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The validated input could not be canonicalized for hashing.
    #[error("Canonicalization failed: {message}")]
    Canonicalization {
        /// A description of the failure.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
