//! # Violation Extraction
//!
//! Turns one audit-log document into a [`ViolationRecord`]. Each field is
//! populated by its own strategy chain (see [`crate::strategies`]); the
//! chains are independent, so a field missing from one schema variant never
//! affects the others.
//!
//! Two heuristics are applied after the chains run and are recorded as
//! [`ReviewNote`]s on the record:
//!
//! - a log carrying only access-denial violations is typed `INGRESS`;
//! - when the log names both a destination perimeter and the perimeter
//!   where the violation occurred, the latter is taken as the source
//!   perimeter. The two names are not compared: a log naming two different
//!   perimeters is read as a cross-perimeter request, so an `INGRESS` log
//!   can classify as `BOTH`. The note tells reviewers the source side was
//!   inferred.

use serde_json::Value;
use vpcsc_core::{is_public_ip, ExtractError, ReviewNote, ViolationRecord, ViolationType};

use crate::envelope::{self, AuditEnvelope, ViolationList};
use crate::strategies::{
    first_match, CALLER_IP, DEST_PERIMETER, DEST_PROJECT, PERIMETER_AT_VIOLATION, SOURCE_PROJECT,
};

/// Extract a violation record from raw audit-log text.
///
/// # Errors
///
/// [`ExtractError::MalformedInput`] if the text is not JSON or has no
/// `protoPayload` object.
pub fn extract(raw: &str) -> Result<ViolationRecord, ExtractError> {
    let document = envelope::parse(raw)?;
    extract_value(&document)
}

/// Extract a violation record from an already-parsed document.
pub fn extract_value(document: &Value) -> Result<ViolationRecord, ExtractError> {
    let envelope = AuditEnvelope::new(document)?;
    let mut record = ViolationRecord::empty();

    record.service = envelope
        .proto_str("/serviceName")
        .map(str::to_lowercase)
        .unwrap_or_default();
    record.method = envelope
        .proto_str("/methodName")
        .map(str::to_lowercase)
        .unwrap_or_default();
    record.principal = envelope
        .proto_str("/authenticationInfo/principalEmail")
        .map(str::to_string);

    record.caller_ip = first_match(&envelope, "caller_ip", CALLER_IP);
    record.is_public_ip = record.caller_ip.as_deref().is_some_and(is_public_ip);

    record.perimeter_at_violation =
        first_match(&envelope, "perimeter_at_violation", PERIMETER_AT_VIOLATION);
    record.source_project = first_match(&envelope, "source_project", SOURCE_PROJECT);
    record.dest_project = first_match(&envelope, "dest_project", DEST_PROJECT);
    record.dest_perimeter = first_match(&envelope, "dest_perimeter", DEST_PERIMETER);

    let (violation_type, assumed) = violation_type(&envelope);
    record.violation_type = violation_type;
    if assumed {
        record.review_notes.push(ReviewNote::AccessDenialAssumedIngress);
    }

    if let (Some(_), Some(at_violation)) = (&record.dest_perimeter, &record.perimeter_at_violation)
    {
        record.source_perimeter = Some(at_violation.clone());
        record
            .review_notes
            .push(ReviewNote::SourcePerimeterFromViolation);
    }

    tracing::debug!(
        service = %record.service,
        method = %record.method,
        violation_type = ?record.violation_type,
        source_project = ?record.source_project.as_ref().map(|p| p.as_str()),
        dest_project = ?record.dest_project.as_ref().map(|p| p.as_str()),
        public_ip = record.is_public_ip,
        "extracted violation record"
    );

    Ok(record)
}

/// Direction reported by the violation lists, and whether it was assumed.
fn violation_type(envelope: &AuditEnvelope<'_>) -> (Option<ViolationType>, bool) {
    let ingress = !envelope.violations(ViolationList::Ingress).is_empty();
    let egress = !envelope.violations(ViolationList::Egress).is_empty();
    let denial = !envelope.violations(ViolationList::AccessDenial).is_empty();
    match (ingress, egress, denial) {
        (true, true, _) => (Some(ViolationType::Both), false),
        (true, false, _) => (Some(ViolationType::Ingress), false),
        (false, true, _) => (Some(ViolationType::Egress), false),
        (false, false, true) => (Some(ViolationType::Ingress), true),
        (false, false, false) => (None, false),
    }
}
