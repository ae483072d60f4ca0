//! # Direction Classification
//!
//! | source | dest | result |
//! |---|---|---|
//! | P | P | SKIP (intra-perimeter) |
//! | P | Q | BOTH: EGRESS at P, INGRESS at Q |
//! | P | none | EGRESS at P |
//! | none | Q | INGRESS at Q |
//! | none | none | SKIP (both external) |

use vpcsc_core::{DirectionDecision, PerimeterName, SkipReason};

/// Classify the policy direction needed between two (possibly unresolved)
/// perimeters. Total over its inputs.
pub fn classify(source: Option<&PerimeterName>, dest: Option<&PerimeterName>) -> DirectionDecision {
    match (source, dest) {
        (Some(s), Some(d)) if s == d => DirectionDecision::skip(SkipReason::IntraPerimeter(s.clone())),
        (Some(s), Some(d)) => DirectionDecision::both(s.clone(), d.clone()),
        (Some(s), None) => DirectionDecision::egress(s.clone()),
        (None, Some(d)) => DirectionDecision::ingress(d.clone()),
        (None, None) => DirectionDecision::skip(SkipReason::BothExternal),
    }
}
