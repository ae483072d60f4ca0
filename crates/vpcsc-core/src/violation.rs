//! # Violation Record
//!
//! The normalized description of one perimeter violation, produced once per
//! audit event by the extractor and read (never mutated) by every later
//! stage.

use serde::{Deserialize, Serialize};

use crate::identity::{PerimeterName, ProjectNumber};

/// Direction the audit log itself reports for the violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    /// Only ingress violations were reported.
    Ingress,
    /// Only egress violations were reported.
    Egress,
    /// Both ingress and egress violations were reported.
    Both,
}

impl ViolationType {
    /// Return the string value used in documents and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingress => "INGRESS",
            Self::Egress => "EGRESS",
            Self::Both => "BOTH",
        }
    }
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A best-effort default that was applied and that a reviewer may want to
/// override. Carried through to the generation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewNote {
    /// Only an access-denial list was present; access denials do not report
    /// a direction, so INGRESS was assumed.
    AccessDenialAssumedIngress,
    /// The log named a destination perimeter and a violation perimeter but
    /// no explicit source; the violation perimeter was taken as the source.
    SourcePerimeterFromViolation,
    /// Neither side resolved to an owned perimeter; the perimeter where the
    /// violation occurred was used as the rule target.
    TargetFromViolationPerimeter,
}

impl ReviewNote {
    /// Human-readable explanation for reviewers.
    pub fn description(&self) -> &'static str {
        match self {
            Self::AccessDenialAssumedIngress => {
                "access-denial violations do not report a direction; INGRESS was assumed"
            }
            Self::SourcePerimeterFromViolation => {
                "source perimeter inferred from the perimeter named at the violation"
            }
            Self::TargetFromViolationPerimeter => {
                "rule target taken from the perimeter where the violation occurred"
            }
        }
    }
}

/// Normalized violation extracted from one audit log.
///
/// # Invariants
///
/// - `is_public_ip` is `true` only if `caller_ip` parses as a globally
///   routable address (see [`crate::network::is_public_ip`]).
/// - `service` and `method` are lower-cased; absent values are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRecord {
    /// Perimeter that reported the violation.
    pub perimeter_at_violation: Option<PerimeterName>,
    /// Perimeter owning the caller, when the log names it.
    pub source_perimeter: Option<PerimeterName>,
    /// Perimeter owning the target resource, when the log names it.
    pub dest_perimeter: Option<PerimeterName>,
    /// Service name, e.g. `bigquery.googleapis.com`.
    pub service: String,
    /// Method name, e.g. `tabledataservice.list`.
    pub method: String,
    /// Caller's project number.
    pub source_project: Option<ProjectNumber>,
    /// Target resource's project number.
    pub dest_project: Option<ProjectNumber>,
    /// Authenticated principal (usually a service-account email).
    pub principal: Option<String>,
    /// Caller IP as it appeared in the log (may be a sentinel string).
    pub caller_ip: Option<String>,
    /// Whether `caller_ip` is a public internet address.
    pub is_public_ip: bool,
    /// Direction reported by the log.
    pub violation_type: Option<ViolationType>,
    /// Heuristics applied during extraction, in the order they fired.
    #[serde(default)]
    pub review_notes: Vec<ReviewNote>,
}

impl ViolationRecord {
    /// An empty record: every optional field absent, no notes.
    pub fn empty() -> Self {
        Self {
            perimeter_at_violation: None,
            source_perimeter: None,
            dest_perimeter: None,
            service: String::new(),
            method: String::new(),
            source_project: None,
            dest_project: None,
            principal: None,
            caller_ip: None,
            is_public_ip: false,
            violation_type: None,
            review_notes: Vec::new(),
        }
    }

    /// The identity string used in rule `identities` lists:
    /// `serviceAccount:` for `*.gserviceaccount.com` principals, `user:`
    /// for any other email.
    pub fn principal_identity(&self) -> Option<String> {
        let principal = self.principal.as_deref().filter(|p| !p.is_empty())?;
        let kind = if principal.ends_with(".gserviceaccount.com") {
            "serviceAccount"
        } else {
            "user"
        };
        Some(format!("{kind}:{principal}"))
    }
}
