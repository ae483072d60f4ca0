//! # Field Extraction Strategies
//!
//! Each field of a [`ViolationRecord`](vpcsc_core::ViolationRecord) that has
//! more than one possible home in an audit log is filled from an ordered
//! list of named strategies. A strategy is a pure function from the envelope
//! to an optional value; [`first_match`] runs them in order and the first
//! `Some` wins. Lower-priority strategies therefore never overwrite a field
//! a higher-priority one already set.
//!
//! ## Source project
//!
//! 1. `requestMetadata.callerNetwork`
//! 2. numeric domain label of the principal's service-account email
//! 3. numeric `resource.labels.project_id`
//! 4. `protoPayload.resourceName`
//! 5. first ingress violation's `ingressFrom.sourceResource`
//!
//! ## Destination project / perimeter
//!
//! One strategy per violation list, priority ingress → egress → access
//! denial, each reading its list's first entry and falling back to the flat
//! legacy `targetResource` string.

use serde_json::Value;
use vpcsc_core::{PerimeterName, ProjectNumber};

use crate::envelope::{str_at, AuditEnvelope, ViolationList};
use crate::patterns::{perimeter_in, project_number_in};

/// A named, side-effect-free lookup for one field.
pub type Strategy<T> = (&'static str, fn(&AuditEnvelope<'_>) -> Option<T>);

/// Run `strategies` in order; the first hit wins.
pub fn first_match<T>(
    envelope: &AuditEnvelope<'_>,
    field: &str,
    strategies: &[Strategy<T>],
) -> Option<T> {
    for (name, strategy) in strategies {
        if let Some(value) = strategy(envelope) {
            tracing::trace!(field, strategy = *name, "extraction strategy matched");
            return Some(value);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Caller IP
// ---------------------------------------------------------------------------

pub const CALLER_IP: &[Strategy<String>] = &[
    ("caller_ip", caller_ip),
    ("source_attributes_ip", source_attributes_ip),
];

fn caller_ip(e: &AuditEnvelope<'_>) -> Option<String> {
    e.proto_str("/requestMetadata/callerIp").map(str::to_string)
}

fn source_attributes_ip(e: &AuditEnvelope<'_>) -> Option<String> {
    e.proto_str("/requestMetadata/sourceAttributes/sourceIp")
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Perimeter at violation
// ---------------------------------------------------------------------------

pub const PERIMETER_AT_VIOLATION: &[Strategy<PerimeterName>] = &[
    ("service_perimeter", service_perimeter),
    ("security_policy_info", security_policy_info),
];

fn service_perimeter(e: &AuditEnvelope<'_>) -> Option<PerimeterName> {
    e.metadata_str("/servicePerimeter").and_then(perimeter_in)
}

fn security_policy_info(e: &AuditEnvelope<'_>) -> Option<PerimeterName> {
    e.metadata_str("/securityPolicyInfo/servicePerimeterName")
        .and_then(perimeter_in)
}

// ---------------------------------------------------------------------------
// Source project
// ---------------------------------------------------------------------------

pub const SOURCE_PROJECT: &[Strategy<ProjectNumber>] = &[
    ("caller_network", caller_network),
    ("service_account_domain", service_account_domain),
    ("resource_label", resource_label),
    ("resource_name", resource_name),
    ("ingress_source_resource", ingress_source_resource),
];

fn caller_network(e: &AuditEnvelope<'_>) -> Option<ProjectNumber> {
    e.proto_str("/requestMetadata/callerNetwork")
        .and_then(project_number_in)
}

/// `name@<label>.iam.gserviceaccount.com` where `<label>` is a project
/// number. Textual project IDs are not resolvable and are ignored.
fn service_account_domain(e: &AuditEnvelope<'_>) -> Option<ProjectNumber> {
    let email = e.proto_str("/authenticationInfo/principalEmail")?;
    let (_, domain) = email.split_once('@')?;
    let label = domain.split('.').next()?;
    ProjectNumber::new(label).ok()
}

fn resource_label(e: &AuditEnvelope<'_>) -> Option<ProjectNumber> {
    e.root_str("/resource/labels/project_id")
        .and_then(|id| ProjectNumber::new(id).ok())
}

fn resource_name(e: &AuditEnvelope<'_>) -> Option<ProjectNumber> {
    e.proto_str("/resourceName").and_then(project_number_in)
}

fn ingress_source_resource(e: &AuditEnvelope<'_>) -> Option<ProjectNumber> {
    e.first_violation(ViolationList::Ingress)
        .and_then(|v| str_at(v, "/ingressFrom/sourceResource"))
        .and_then(project_number_in)
}

// ---------------------------------------------------------------------------
// Destination
// ---------------------------------------------------------------------------

pub const DEST_PROJECT: &[Strategy<ProjectNumber>] = &[
    ("ingress_target", ingress_target_project),
    ("egress_target", egress_target_project),
    ("access_denial_target", access_denial_target_project),
];

pub const DEST_PERIMETER: &[Strategy<PerimeterName>] = &[
    ("ingress_target", ingress_target_perimeter),
    ("egress_target", egress_target_perimeter),
    ("access_denial_target", access_denial_target_perimeter),
];

fn ingress_target_project(e: &AuditEnvelope<'_>) -> Option<ProjectNumber> {
    target(e, ViolationList::Ingress).and_then(project_number_in)
}

fn egress_target_project(e: &AuditEnvelope<'_>) -> Option<ProjectNumber> {
    target(e, ViolationList::Egress).and_then(project_number_in)
}

fn access_denial_target_project(e: &AuditEnvelope<'_>) -> Option<ProjectNumber> {
    target(e, ViolationList::AccessDenial).and_then(project_number_in)
}

fn ingress_target_perimeter(e: &AuditEnvelope<'_>) -> Option<PerimeterName> {
    target(e, ViolationList::Ingress).and_then(perimeter_in)
}

fn egress_target_perimeter(e: &AuditEnvelope<'_>) -> Option<PerimeterName> {
    target(e, ViolationList::Egress).and_then(perimeter_in)
}

fn access_denial_target_perimeter(e: &AuditEnvelope<'_>) -> Option<PerimeterName> {
    target(e, ViolationList::AccessDenial).and_then(perimeter_in)
}

/// Target resource string of a list's first violation.
pub fn target<'a>(e: &AuditEnvelope<'a>, list: ViolationList) -> Option<&'a str> {
    let violation = e.first_violation(list)?;
    nested_target(violation, list).or_else(|| str_at(violation, "/targetResource"))
}

fn nested_target(violation: &Value, list: ViolationList) -> Option<&str> {
    match list {
        ViolationList::Ingress => str_at(violation, "/ingressTo/resource"),
        ViolationList::Egress => str_at(violation, "/egressTo/resource"),
        ViolationList::AccessDenial => str_at(violation, "/ingressTo/resource")
            .or_else(|| str_at(violation, "/egressTo/resource")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with<T>(doc: Value, f: impl FnOnce(&AuditEnvelope<'_>) -> T) -> T {
        let env = AuditEnvelope::new(&doc).unwrap();
        f(&env)
    }

    #[test]
    fn caller_network_outranks_service_account() {
        let doc = json!({"protoPayload": {
            "requestMetadata": {"callerNetwork": "//compute.googleapis.com/projects/111/global/networks/n"},
            "authenticationInfo": {"principalEmail": "sa@222.iam.gserviceaccount.com"}
        }});
        let p = with(doc, |e| first_match(e, "source_project", SOURCE_PROJECT));
        assert_eq!(p.unwrap().as_str(), "111");
    }

    #[test]
    fn textual_service_account_domain_is_ignored() {
        let doc = json!({"protoPayload": {
            "authenticationInfo": {"principalEmail": "sa@my-project.iam.gserviceaccount.com"},
            "resourceName": "projects/333/datasets/d"
        }});
        let p = with(doc, |e| first_match(e, "source_project", SOURCE_PROJECT));
        assert_eq!(p.unwrap().as_str(), "333");
    }

    #[test]
    fn resource_label_requires_numeric_value() {
        let doc = json!({
            "resource": {"labels": {"project_id": "textual-id"}},
            "protoPayload": {"resourceName": "projects/444/buckets/b"}
        });
        let p = with(doc, |e| first_match(e, "source_project", SOURCE_PROJECT));
        assert_eq!(p.unwrap().as_str(), "444");

        let doc = json!({
            "resource": {"labels": {"project_id": "555"}},
            "protoPayload": {"resourceName": "projects/444/buckets/b"}
        });
        let p = with(doc, |e| first_match(e, "source_project", SOURCE_PROJECT));
        assert_eq!(p.unwrap().as_str(), "555");
    }

    #[test]
    fn ingress_source_resource_is_last_resort() {
        let doc = json!({"protoPayload": {"metadata": {"ingressViolations": [
            {"ingressFrom": {"sourceResource": "projects/666"}}
        ]}}});
        let p = with(doc, |e| first_match(e, "source_project", SOURCE_PROJECT));
        assert_eq!(p.unwrap().as_str(), "666");
    }

    #[test]
    fn caller_ip_falls_back_to_source_attributes() {
        let doc = json!({"protoPayload": {"requestMetadata": {
            "callerIp": "",
            "sourceAttributes": {"sourceIp": "8.8.4.4"}
        }}});
        let ip = with(doc, |e| first_match(e, "caller_ip", CALLER_IP));
        assert_eq!(ip.as_deref(), Some("8.8.4.4"));
    }

    #[test]
    fn legacy_perimeter_field_used_when_modern_absent() {
        let doc = json!({"protoPayload": {"metadata": {"securityPolicyInfo": {
            "servicePerimeterName": "accessPolicies/1/servicePerimeters/legacy_perim"
        }}}});
        let p = with(doc, |e| first_match(e, "perimeter", PERIMETER_AT_VIOLATION));
        assert_eq!(p.unwrap().as_str(), "legacy_perim");
    }

    #[test]
    fn ingress_target_outranks_egress_target() {
        let doc = json!({"protoPayload": {"metadata": {
            "ingressViolations": [{"ingressTo": {"resource": "projects/10"}}],
            "egressViolations": [{"egressTo": {"resource": "projects/20"}}]
        }}});
        let p = with(doc, |e| first_match(e, "dest_project", DEST_PROJECT));
        assert_eq!(p.unwrap().as_str(), "10");
    }

    #[test]
    fn list_without_project_lets_next_list_answer() {
        let doc = json!({"protoPayload": {"metadata": {
            "ingressViolations": [{"ingressTo": {"resource": "projects/textual"}}],
            "egressViolations": [{"egressTo": {"resource": "projects/20"}}]
        }}});
        let p = with(doc, |e| first_match(e, "dest_project", DEST_PROJECT));
        assert_eq!(p.unwrap().as_str(), "20");
    }

    #[test]
    fn legacy_target_resource_fallback() {
        let doc = json!({"protoPayload": {"metadata": {"accessDenialViolations": [
            {"targetResource": "accessPolicies/1/servicePerimeters/other projects/30"}
        ]}}});
        let (project, perimeter) = with(doc, |e| {
            (
                first_match(e, "dest_project", DEST_PROJECT),
                first_match(e, "dest_perimeter", DEST_PERIMETER),
            )
        });
        assert_eq!(project.unwrap().as_str(), "30");
        assert_eq!(perimeter.unwrap().as_str(), "other");
    }

    #[test]
    fn access_denial_prefers_ingress_to_then_egress_to() {
        let doc = json!({"protoPayload": {"metadata": {"accessDenialViolations": [
            {"egressTo": {"resource": "projects/40"}, "targetResource": "projects/41"}
        ]}}});
        let p = with(doc, |e| first_match(e, "dest_project", DEST_PROJECT));
        assert_eq!(p.unwrap().as_str(), "40");
    }
}
