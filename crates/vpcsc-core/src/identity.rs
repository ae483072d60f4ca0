//! # Identifier Newtypes
//!
//! Domain-primitive newtypes for the identifiers that cross the pipeline.
//! Each one validates format at construction and again on deserialization,
//! so an invalid value can never be read back out of a rules document or a
//! cache file.
//!
//! - [`ProjectNumber`]: the numeric form of a cloud project identifier. Only
//!   project numbers participate in ownership resolution; textual project IDs
//!   are rejected here.
//! - [`PerimeterName`]: the short name of a service perimeter, as it
//!   appears after `servicePerimeters/` in resource paths.
//! - [`JustificationToken`]: the third-party-access justification (TLM) ID.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// ProjectNumber
// ---------------------------------------------------------------------------

/// Numeric cloud project identifier, e.g. `1111111111`.
///
/// # Validation
///
/// - Must be non-empty
/// - Must consist solely of ASCII digits
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectNumber(String);

impl ProjectNumber {
    /// Create a project number, validating that it is fully numeric.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidProjectNumber`] for empty or
    /// non-numeric input.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidProjectNumber(s));
        }
        Ok(Self(s))
    }

    /// Access the project number string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The resource reference used in policy rules: `projects/<number>`.
    pub fn resource_name(&self) -> String {
        format!("projects/{}", self.0)
    }
}

impl TryFrom<String> for ProjectNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectNumber> for String {
    fn from(value: ProjectNumber) -> Self {
        value.0
    }
}

impl std::fmt::Display for ProjectNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// PerimeterName
// ---------------------------------------------------------------------------

/// Short name of a service perimeter, e.g. `test-perim-a`.
///
/// # Validation
///
/// - Must be non-empty
/// - Characters restricted to `[A-Za-z0-9_-]`, matching the segment accepted
///   after `servicePerimeters/` in resource paths
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PerimeterName(String);

impl PerimeterName {
    /// Create a perimeter name, validating its character set.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPerimeterName`] for empty input or
    /// input containing characters outside `[A-Za-z0-9_-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let valid = !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ValidationError::InvalidPerimeterName(s));
        }
        Ok(Self(s))
    }

    /// Access the perimeter name string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PerimeterName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PerimeterName> for String {
    fn from(value: PerimeterName) -> Self {
        value.0
    }
}

impl std::fmt::Display for PerimeterName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// JustificationToken
// ---------------------------------------------------------------------------

/// Third-party-access justification identifier (a "TLM ID").
///
/// The token is kept exactly as supplied; [`JustificationToken::access_level_name`]
/// derives the access-level name bound to a public caller IP.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JustificationToken(String);

impl JustificationToken {
    /// Create a token from user input. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyJustificationToken`] for blank input.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyJustificationToken);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Access the token as supplied.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Access-level name for this token: lower-cased, underscores replaced
    /// with hyphens (`TLM_Ab_1` → `tlm-ab-1`).
    pub fn access_level_name(&self) -> String {
        self.0.to_lowercase().replace('_', "-")
    }
}

impl TryFrom<String> for JustificationToken {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<JustificationToken> for String {
    fn from(value: JustificationToken) -> Self {
        value.0
    }
}

impl std::fmt::Display for JustificationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn project_number_accepts_exactly_digit_strings(s in "\\PC{0,12}") {
            let all_digits = !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
            prop_assert_eq!(ProjectNumber::new(s.clone()).is_ok(), all_digits);
        }

        #[test]
        fn project_number_resource_name_round_trips(s in "[0-9]{1,15}") {
            let p = ProjectNumber::new(s.clone()).unwrap();
            prop_assert_eq!(p.resource_name(), format!("projects/{s}"));
        }

        #[test]
        fn access_level_name_is_normalized_and_stable(s in "[A-Za-z0-9_-]{1,20}") {
            let name = JustificationToken::new(s).unwrap().access_level_name();
            prop_assert!(!name.contains('_'));
            prop_assert!(!name.chars().any(|c| c.is_ascii_uppercase()));
            let again = JustificationToken::new(name.clone()).unwrap().access_level_name();
            prop_assert_eq!(again, name);
        }
    }
}
