//! # Error Hierarchy
//!
//! Structured error types for the violation-to-rule pipeline, built with
//! `thiserror`. No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Unresolved ownership is deliberately absent from this module: a project
//! with no owning perimeter is an expected state that drives direction
//! classification, not a failure.

use thiserror::Error;

use crate::decision::SkipReason;

/// Top-level error type for the core pipeline.
#[derive(Error, Debug)]
pub enum VpcscError {
    /// Identifier validation failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The audit log could not be understood.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Rule synthesis refused to produce output.
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors for identifier newtypes.
///
/// Each variant carries the rejected input so operators can see exactly what
/// the audit log or configuration contained.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Project numbers are non-empty strings of ASCII digits.
    #[error("invalid project number: \"{0}\" (expected digits only)")]
    InvalidProjectNumber(String),

    /// Perimeter names are non-empty `[A-Za-z0-9_-]` strings.
    #[error("invalid perimeter name: \"{0}\" (expected [A-Za-z0-9_-]+)")]
    InvalidPerimeterName(String),

    /// Justification tokens must contain at least one non-blank character.
    #[error("invalid justification token: must be non-empty")]
    EmptyJustificationToken,
}

/// Errors raised while turning a raw audit log into a violation record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The document is not JSON, or has no recognizable payload envelope.
    #[error("malformed audit log: {0}")]
    MalformedInput(String),
}

/// Reasons rule synthesis refuses to emit rules.
///
/// Both variants are hard stops: no partial rule list is ever returned
/// alongside them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// The direction decision was SKIP. Displays the skip reason verbatim.
    #[error("{0}")]
    Skipped(SkipReason),

    /// A third-party leg needs a justification token and none was supplied.
    #[error("justification token required: {reason}")]
    JustificationRequired {
        /// Which leg triggered the requirement.
        reason: String,
    },
}

impl SynthesisError {
    /// True when the request can never produce rules because neither side is
    /// owned by a known perimeter.
    pub fn is_impossible_request(&self) -> bool {
        matches!(self, Self::Skipped(SkipReason::BothExternal))
    }
}
