//! # Configuration Merge
//!
//! Appends synthesized rules to existing perimeter configuration text. The
//! merge is structural append only: prior content is never parsed, and is
//! kept verbatim except for trailing whitespace.
//!
//! ## Variables file
//!
//! ```text
//! <existing content, trailing whitespace trimmed>
//!
//! ingress_policies = [
//!   {
//!     # <justification line>
//!     from = { ... }
//!     to = { ... }
//!   },
//! ]
//!
//! egress_policies = [
//!   ...
//! ]
//! ```
//!
//! Either block is omitted when no rule has that direction.

use vpcsc_core::{AccessLevelModule, Rule, RuleDirection, RuleFrom, RuleTo};

use crate::access_level::access_level_block;
use crate::value::HclValue;

/// Append `rules` as `ingress_policies` / `egress_policies` blocks.
///
/// With no rules, returns `existing` with trailing whitespace normalized.
pub fn merge_policies(existing: &str, rules: &[Rule], justification: Option<&str>) -> String {
    let comment = justification_comment(justification);
    let blocks: Vec<String> = [
        (RuleDirection::Ingress, "ingress_policies"),
        (RuleDirection::Egress, "egress_policies"),
    ]
    .into_iter()
    .filter_map(|(direction, variable)| {
        let entries: Vec<&Rule> = rules.iter().filter(|r| r.direction == direction).collect();
        (!entries.is_empty()).then(|| policy_block(variable, &entries, &comment))
    })
    .collect();

    tracing::debug!(
        existing_bytes = existing.len(),
        rules = rules.len(),
        blocks = blocks.len(),
        "merging policies"
    );
    append(existing, &blocks)
}

/// Append one access-level module per rule carrying an access level.
///
/// Returns `None` when no rule needs an access level; callers must leave
/// the target file untouched in that case.
pub fn merge_access_levels(
    existing: &str,
    rules: &[Rule],
    module: &AccessLevelModule,
) -> Option<String> {
    let mut seen: Vec<(&str, &str)> = Vec::new();
    for level in rules.iter().filter_map(Rule::access_level) {
        if !seen.contains(&level) {
            seen.push(level);
        }
    }
    if seen.is_empty() {
        return None;
    }
    let blocks: Vec<String> = seen
        .into_iter()
        .map(|(name, ip)| access_level_block(name, ip, module))
        .collect();
    Some(append(existing, &blocks))
}

/// Render the `{from, to}` entry for a rule at list depth.
pub fn policy_entry(rule: &Rule) -> HclValue {
    HclValue::map([("from", from_value(&rule.from)), ("to", to_value(&rule.to))])
}

fn from_value(from: &RuleFrom) -> HclValue {
    let mut entries = vec![(
        "identity_type".to_string(),
        HclValue::from(from.identity_type.as_str()),
    )];
    if let Some(sources) = &from.sources {
        entries.push((
            "sources".to_string(),
            HclValue::map([
                ("resources", HclValue::strings(&sources.resources)),
                ("access_levels", HclValue::strings(&sources.access_levels)),
            ]),
        ));
    }
    if !from.identities.is_empty() {
        entries.push(("identities".to_string(), HclValue::strings(&from.identities)));
    }
    HclValue::Map(entries)
}

fn to_value(to: &RuleTo) -> HclValue {
    let mut entries = Vec::new();
    if !to.resources.is_empty() {
        entries.push(("resources".to_string(), HclValue::strings(&to.resources)));
    }
    if !to.operations.is_empty() {
        let operations = to
            .operations
            .iter()
            .map(|(service, spec)| {
                (
                    service.clone(),
                    HclValue::map([
                        ("methods", HclValue::strings(&spec.methods)),
                        ("permissions", HclValue::strings(&spec.permissions)),
                    ]),
                )
            })
            .collect();
        entries.push(("operations".to_string(), HclValue::Map(operations)));
    }
    HclValue::Map(entries)
}

fn policy_block(variable: &str, rules: &[&Rule], comment: &[String]) -> String {
    let mut lines = vec![format!("{variable} = [")];
    for rule in rules {
        let rendered = policy_entry(rule).render(1);
        let mut entry = rendered.lines();
        if let Some(opening) = entry.next() {
            lines.push(format!("  {opening}"));
        }
        lines.extend(comment.iter().cloned());
        lines.extend(entry.map(str::to_string));
        if let Some(last) = lines.last_mut() {
            last.push(',');
        }
    }
    lines.push("]".to_string());
    lines.join("\n")
}

fn justification_comment(justification: Option<&str>) -> Vec<String> {
    let Some(text) = justification.filter(|t| !t.trim().is_empty()) else {
        return Vec::new();
    };
    text.trim()
        .lines()
        .map(|line| match line.trim() {
            "" => "    #".to_string(),
            line => format!("    # {line}"),
        })
        .collect()
}

/// `existing` (trimmed) + blank line + blocks separated by blank lines.
fn append(existing: &str, blocks: &[String]) -> String {
    let head = existing.trim_end();
    let mut parts: Vec<&str> = Vec::with_capacity(blocks.len() + 1);
    if !head.trim().is_empty() {
        parts.push(head);
    }
    parts.extend(blocks.iter().map(String::as_str));
    if parts.is_empty() {
        return String::new();
    }
    let mut out = parts.join("\n\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use vpcsc_core::{OperationSpec, PerimeterName, RuleSources};

    fn rule(direction: RuleDirection) -> Rule {
        let mut operations = BTreeMap::new();
        operations.insert(
            "bigquery.googleapis.com".to_string(),
            OperationSpec {
                methods: vec!["tabledataservice.list".into()],
                permissions: vec![],
            },
        );
        Rule {
            perimeter: PerimeterName::new("finance").unwrap(),
            direction,
            from: RuleFrom {
                identity_type: String::new(),
                sources: None,
                identities: vec!["serviceAccount:sa@1.iam.gserviceaccount.com".into()],
            },
            to: RuleTo {
                resources: vec!["projects/2".into()],
                operations,
            },
            access_level_name: None,
            access_level_ip: None,
        }
    }

    const EGRESS_BLOCK: &str = "egress_policies = [
  {
    from = {
      identity_type = \"\"
      identities = [\"serviceAccount:sa@1.iam.gserviceaccount.com\"]
    }
    to = {
      resources = [\"projects/2\"]
      operations = {
        \"bigquery.googleapis.com\" = {
          methods = [\"tabledataservice.list\"]
          permissions = []
        }
      }
    }
  },
]
";

    #[test]
    fn egress_rule_into_empty_file() {
        assert_eq!(merge_policies("", &[rule(RuleDirection::Egress)], None), EGRESS_BLOCK);
    }

    #[test]
    fn egress_appended_after_existing_ingress_block() {
        let existing = "ingress_policies = [\n  # hand-written\n]\n\n\n";
        let merged = merge_policies(existing, &[rule(RuleDirection::Egress)], None);
        assert_eq!(
            merged,
            format!("ingress_policies = [\n  # hand-written\n]\n\n{EGRESS_BLOCK}")
        );
    }

    #[test]
    fn ingress_block_precedes_egress_block() {
        let merged = merge_policies(
            "",
            &[rule(RuleDirection::Egress), rule(RuleDirection::Ingress)],
            None,
        );
        let ingress = merged.find("ingress_policies = [").unwrap();
        let egress = merged.find("egress_policies = [").unwrap();
        assert!(ingress < egress);
        assert!(merged.contains("]\n\negress_policies = ["));
    }

    #[test]
    fn empty_rules_is_identity_modulo_trailing_whitespace() {
        assert_eq!(merge_policies("a = 1  \n\n", &[], None), "a = 1\n");
        assert_eq!(merge_policies("", &[], None), "");
        assert_eq!(merge_policies(" \n", &[], None), "");
    }

    #[test]
    fn justification_follows_opening_line() {
        let merged = merge_policies(
            "",
            &[rule(RuleDirection::Ingress)],
            Some("TLM-123\n  approved by netsec "),
        );
        assert!(merged.starts_with(
            "ingress_policies = [\n  {\n    # TLM-123\n    # approved by netsec\n    from = {"
        ));
    }

    #[test]
    fn method_text_from_log_stays_inside_its_string() {
        let mut r = rule(RuleDirection::Egress);
        r.to.operations.insert(
            "bigquery.googleapis.com".to_string(),
            OperationSpec {
                methods: vec!["a\nb = \"${x}".into()],
                permissions: vec![],
            },
        );
        let merged = merge_policies("", &[r], None);
        assert!(merged.contains("          methods = [\"a\\nb = \\\"$${x}\"]\n"));
        assert!(!merged.contains("\nb = "));
    }

    #[test]
    fn blank_justification_adds_nothing() {
        let with_blank = merge_policies("", &[rule(RuleDirection::Egress)], Some("   "));
        assert_eq!(with_blank, EGRESS_BLOCK);
    }

    #[test]
    fn ingress_sources_rendered() {
        let mut r = rule(RuleDirection::Ingress);
        r.from.sources = Some(RuleSources {
            resources: vec![],
            access_levels: vec!["tlm-123".into()],
        });
        let merged = merge_policies("", &[r], None);
        assert!(merged.contains(
            "    from = {\n      identity_type = \"\"\n      sources = {\n        resources = []\n        access_levels = [\"tlm-123\"]\n      }\n"
        ));
    }

    #[test]
    fn access_levels_none_without_levels() {
        assert_eq!(
            merge_access_levels("x", &[rule(RuleDirection::Ingress)], &AccessLevelModule::default()),
            None
        );
    }

    #[test]
    fn access_levels_appended_and_deduplicated() {
        let mut r = rule(RuleDirection::Ingress);
        r.access_level_name = Some("tlm-123".into());
        r.access_level_ip = Some("8.8.8.8".into());
        let merged = merge_access_levels(
            "module \"existing\" {}\n",
            &[r.clone(), r],
            &AccessLevelModule::default(),
        )
        .unwrap();
        assert!(merged.starts_with("module \"existing\" {}\n\nmodule \"vpc-service-controls-access-level_tlm-123\" {"));
        assert_eq!(merged.matches("vpc-service-controls-access-level_").count(), 1);
        assert!(merged.ends_with("}\n"));
    }
}
