//! # Rule Synthesis
//!
//! Builds the structured ingress/egress rules that restore a denied access
//! path. Output is all-or-nothing: either every leg of the decision yields a
//! rule, or an error is returned and no rule is.
//!
//! ## Ingress origin
//!
//! | origin | caller IP | `from.sources` |
//! |---|---|---|
//! | unowned | public | new access level named after the token, bound to the IP |
//! | unowned | not public | `projects/<source>` |
//! | owned perimeter | any | `projects/<source>` |
//!
//! Egress never creates access levels; its `from` block carries only the
//! identity restriction.

use std::collections::BTreeMap;

use vpcsc_core::{
    DirectionDecision, JustificationToken, OperationSpec, PerimeterName, Rule, RuleDirection,
    RuleFrom, RuleSources, RuleTo, SynthesisError, TlmTrigger, ViolationRecord,
};

use crate::tlm;

/// Synthesize the rules for `decision`.
///
/// # Errors
///
/// - [`SynthesisError::Skipped`] when the decision is `SKIP`, carrying the
///   skip reason verbatim.
/// - [`SynthesisError::JustificationRequired`] when a gated leg is present
///   and `token` is `None`.
pub fn synthesize(
    record: &ViolationRecord,
    decision: &DirectionDecision,
    token: Option<&JustificationToken>,
) -> Result<Vec<Rule>, SynthesisError> {
    if let Some(reason) = decision.skip_reason() {
        return Err(SynthesisError::Skipped(reason.clone()));
    }
    let requirement = tlm::validate(record, decision);
    if let (Some(trigger), None) = (requirement.trigger(), token) {
        return Err(justification_required(trigger));
    }

    let to = rule_to(record);
    let mut rules = Vec::with_capacity(2);
    for (direction, perimeter) in decision.legs() {
        let rule = match direction {
            RuleDirection::Ingress => ingress_rule(record, decision, perimeter, to.clone(), token)?,
            RuleDirection::Egress => egress_rule(record, perimeter, to.clone()),
        };
        rules.push(rule);
    }
    Ok(rules)
}

fn justification_required(trigger: TlmTrigger) -> SynthesisError {
    SynthesisError::JustificationRequired {
        reason: trigger.description().to_string(),
    }
}

fn ingress_rule(
    record: &ViolationRecord,
    decision: &DirectionDecision,
    perimeter: &PerimeterName,
    to: RuleTo,
    token: Option<&JustificationToken>,
) -> Result<Rule, SynthesisError> {
    let external = decision.source_perimeter().is_none();
    let public_ip = record
        .caller_ip
        .as_deref()
        .filter(|_| record.is_public_ip && external);

    let mut access_level = None;
    let sources = match public_ip {
        Some(ip) => {
            let token = token.ok_or_else(|| justification_required(TlmTrigger::PublicIngress))?;
            let name = token.access_level_name();
            access_level = Some((name.clone(), ip.to_string()));
            Some(RuleSources {
                resources: Vec::new(),
                access_levels: vec![name],
            })
        }
        None => record.source_project.as_ref().map(|project| RuleSources {
            resources: vec![project.resource_name()],
            access_levels: Vec::new(),
        }),
    };

    let (access_level_name, access_level_ip) = access_level.unzip();
    Ok(Rule {
        perimeter: perimeter.clone(),
        direction: RuleDirection::Ingress,
        from: RuleFrom {
            identity_type: String::new(),
            sources,
            identities: identities(record),
        },
        to,
        access_level_name,
        access_level_ip,
    })
}

fn egress_rule(record: &ViolationRecord, perimeter: &PerimeterName, to: RuleTo) -> Rule {
    Rule {
        perimeter: perimeter.clone(),
        direction: RuleDirection::Egress,
        from: RuleFrom {
            identity_type: String::new(),
            sources: None,
            identities: identities(record),
        },
        to,
        access_level_name: None,
        access_level_ip: None,
    }
}

fn identities(record: &ViolationRecord) -> Vec<String> {
    record.principal_identity().into_iter().collect()
}

/// Shared `to` block: destination project plus the single observed
/// service/method pair. Permissions are never populated.
fn rule_to(record: &ViolationRecord) -> RuleTo {
    let mut operations = BTreeMap::new();
    if !record.service.is_empty() && !record.method.is_empty() {
        operations.insert(
            record.service.to_lowercase(),
            OperationSpec {
                methods: vec![record.method.clone()],
                permissions: Vec::new(),
            },
        );
    }
    RuleTo {
        resources: record
            .dest_project
            .iter()
            .map(|p| p.resource_name())
            .collect(),
        operations,
    }
}
