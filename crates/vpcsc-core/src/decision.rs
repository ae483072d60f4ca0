//! # Direction and Justification Decisions
//!
//! Value types produced by the direction classifier and the justification
//! validator. Both keep their fields private so the invariants below hold
//! for every value in existence:
//!
//! - [`DirectionDecision`]: a skip reason is present iff the direction is
//!   `SKIP`; `INGRESS` always has a destination perimeter, `EGRESS` always a
//!   source perimeter, `BOTH` always two distinct perimeters.
//! - [`TlmDecision`]: `required` implies a trigger naming the leg that
//!   caused it.

use serde::{Serialize, Serializer};

use crate::identity::PerimeterName;
use crate::rule::RuleDirection;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Policy direction(s) needed to restore an access path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Ingress rule at the destination perimeter only.
    Ingress,
    /// Egress rule at the source perimeter only.
    Egress,
    /// Egress at the source perimeter and ingress at the destination.
    Both,
    /// No rule can or needs to be emitted.
    Skip,
}

impl Direction {
    /// Return the string value used in documents and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingress => "INGRESS",
            Self::Egress => "EGRESS",
            Self::Both => "BOTH",
            Self::Skip => "SKIP",
        }
    }

    /// Whether an ingress leg is part of this direction.
    pub fn includes_ingress(&self) -> bool {
        matches!(self, Self::Ingress | Self::Both)
    }

    /// Whether an egress leg is part of this direction.
    pub fn includes_egress(&self) -> bool {
        matches!(self, Self::Egress | Self::Both)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SkipReason
// ---------------------------------------------------------------------------

/// Why no rule is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Source and destination share one perimeter; traffic is already allowed.
    IntraPerimeter(PerimeterName),
    /// Neither side belongs to a perimeter this system configures.
    BothExternal,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IntraPerimeter(p) => write!(f, "Communication within {p} is allowed by default"),
            Self::BothExternal => f.write_str("Both source and destination are external"),
        }
    }
}

impl Serialize for SkipReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// DirectionDecision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Plan {
    Ingress { dest: PerimeterName },
    Egress { source: PerimeterName },
    Both { source: PerimeterName, dest: PerimeterName },
    Skip(SkipReason),
}

/// Outcome of direction classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "DecisionView")]
pub struct DirectionDecision {
    plan: Plan,
}

impl DirectionDecision {
    /// Ingress at `dest` from an external source.
    pub fn ingress(dest: PerimeterName) -> Self {
        Self { plan: Plan::Ingress { dest } }
    }

    /// Egress from `source` to an external destination.
    pub fn egress(source: PerimeterName) -> Self {
        Self { plan: Plan::Egress { source } }
    }

    /// Cross-perimeter traffic. Degrades to an intra-perimeter skip when both
    /// names are equal, so a `BOTH` decision always names two perimeters.
    pub fn both(source: PerimeterName, dest: PerimeterName) -> Self {
        if source == dest {
            return Self::skip(SkipReason::IntraPerimeter(source));
        }
        Self { plan: Plan::Both { source, dest } }
    }

    /// No rule.
    pub fn skip(reason: SkipReason) -> Self {
        Self { plan: Plan::Skip(reason) }
    }

    /// The classified direction.
    pub fn direction(&self) -> Direction {
        match self.plan {
            Plan::Ingress { .. } => Direction::Ingress,
            Plan::Egress { .. } => Direction::Egress,
            Plan::Both { .. } => Direction::Both,
            Plan::Skip(_) => Direction::Skip,
        }
    }

    /// Source perimeter, if the caller's side is owned.
    pub fn source_perimeter(&self) -> Option<&PerimeterName> {
        match &self.plan {
            Plan::Egress { source } | Plan::Both { source, .. } => Some(source),
            Plan::Skip(SkipReason::IntraPerimeter(p)) => Some(p),
            _ => None,
        }
    }

    /// Destination perimeter, if the target's side is owned.
    pub fn dest_perimeter(&self) -> Option<&PerimeterName> {
        match &self.plan {
            Plan::Ingress { dest } | Plan::Both { dest, .. } => Some(dest),
            Plan::Skip(SkipReason::IntraPerimeter(p)) => Some(p),
            _ => None,
        }
    }

    /// Present iff the direction is `SKIP`.
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match &self.plan {
            Plan::Skip(reason) => Some(reason),
            _ => None,
        }
    }

    /// Perimeter that receives the ingress rule, if any.
    pub fn ingress_perimeter(&self) -> Option<&PerimeterName> {
        match &self.plan {
            Plan::Ingress { dest } | Plan::Both { dest, .. } => Some(dest),
            _ => None,
        }
    }

    /// Perimeter that receives the egress rule, if any.
    pub fn egress_perimeter(&self) -> Option<&PerimeterName> {
        match &self.plan {
            Plan::Egress { source } | Plan::Both { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Rule legs in emission order: ingress first, then egress.
    pub fn legs(&self) -> Vec<(RuleDirection, &PerimeterName)> {
        let mut legs = Vec::with_capacity(2);
        if let Some(p) = self.ingress_perimeter() {
            legs.push((RuleDirection::Ingress, p));
        }
        if let Some(p) = self.egress_perimeter() {
            legs.push((RuleDirection::Egress, p));
        }
        legs
    }

    /// Perimeters whose configuration changes, source side first.
    pub fn perimeters(&self) -> Vec<&PerimeterName> {
        match &self.plan {
            Plan::Ingress { dest } => vec![dest],
            Plan::Egress { source } => vec![source],
            Plan::Both { source, dest } => vec![source, dest],
            Plan::Skip(_) => Vec::new(),
        }
    }

    /// One-line summary for reviewers.
    pub fn meaning(&self) -> Option<String> {
        match &self.plan {
            Plan::Ingress { dest } => Some(format!("INGRESS to {dest} from external source")),
            Plan::Egress { source } => Some(format!("EGRESS from {source} to external project")),
            Plan::Both { source, dest } => Some(format!("EGRESS from {source} + INGRESS to {dest}")),
            Plan::Skip(_) => None,
        }
    }
}

/// Serialized shape of a [`DirectionDecision`].
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecisionView {
    direction: Direction,
    perimeters: Vec<PerimeterName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meaning: Option<String>,
    source_perimeter: Option<PerimeterName>,
    dest_perimeter: Option<PerimeterName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip_reason: Option<SkipReason>,
}

impl From<DirectionDecision> for DecisionView {
    fn from(d: DirectionDecision) -> Self {
        Self {
            direction: d.direction(),
            perimeters: d.perimeters().into_iter().cloned().collect(),
            meaning: d.meaning(),
            source_perimeter: d.source_perimeter().cloned(),
            dest_perimeter: d.dest_perimeter().cloned(),
            skip_reason: d.skip_reason().cloned(),
        }
    }
}

// ---------------------------------------------------------------------------
// TlmDecision
// ---------------------------------------------------------------------------

/// Which leg made a justification token mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TlmTrigger {
    /// Ingress from an external source calling from a public IP.
    PublicIngress,
    /// Egress to a destination outside every owned perimeter.
    ExternalEgress,
}

impl TlmTrigger {
    /// Reason text reported to the requester.
    pub fn description(&self) -> &'static str {
        match self {
            Self::PublicIngress => "Ingress from public IP requires TLM ID",
            Self::ExternalEgress => "Egress to external/third-party project requires TLM ID",
        }
    }
}

impl Serialize for TlmTrigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.description())
    }
}

/// Whether a justification token must be supplied before rules are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TlmDecision {
    required: bool,
    reason: Option<TlmTrigger>,
}

impl TlmDecision {
    /// No token needed.
    pub fn not_required() -> Self {
        Self { required: false, reason: None }
    }

    /// Token needed because of `trigger`.
    pub fn required(trigger: TlmTrigger) -> Self {
        Self { required: true, reason: Some(trigger) }
    }

    /// Whether a token is mandatory.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The triggering leg; `Some` iff required.
    pub fn trigger(&self) -> Option<TlmTrigger> {
        self.reason
    }

    /// Reason text; `Some` iff required.
    pub fn reason(&self) -> Option<&'static str> {
        self.reason.map(|t| t.description())
    }
}
