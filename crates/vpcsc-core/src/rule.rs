//! # Policy Rules
//!
//! Structured ingress/egress rules produced by synthesis and consumed by the
//! configuration merger. Rules are immutable value objects; their lifetime
//! ends once they are rendered into configuration text.
//!
//! The `from` / `to` blocks keep the snake_case field names of the perimeter
//! module's policy variables (`identity_type`, `access_levels`, ...) because
//! they are rendered into that configuration verbatim. The envelope fields
//! of [`Rule`] use camelCase like the rest of the result documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identity::PerimeterName;

/// Direction of a single rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleDirection {
    /// Admits traffic into the rule's perimeter.
    Ingress,
    /// Admits traffic out of the rule's perimeter.
    Egress,
}

impl RuleDirection {
    /// Return the string value used in documents and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingress => "INGRESS",
            Self::Egress => "EGRESS",
        }
    }
}

impl std::fmt::Display for RuleDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where admitted traffic may originate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSources {
    /// Resource references, e.g. `projects/123`.
    #[serde(default)]
    pub resources: Vec<String>,
    /// Access-level names.
    #[serde(default)]
    pub access_levels: Vec<String>,
}

/// The `from` block of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFrom {
    /// Identity type selector; empty means "use the identities list".
    #[serde(default)]
    pub identity_type: String,
    /// Origin restriction. Ingress only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<RuleSources>,
    /// Identity restriction, e.g. `serviceAccount:sa@123.iam.gserviceaccount.com`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<String>,
}

/// Methods and permissions admitted for one service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSpec {
    /// Method names.
    #[serde(default)]
    pub methods: Vec<String>,
    /// Permission names.
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// The `to` block of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTo {
    /// Target resource references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
    /// Operations keyed by lower-cased service name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub operations: BTreeMap<String, OperationSpec>,
}

/// One synthesized policy rule for one perimeter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Perimeter whose configuration receives the rule.
    pub perimeter: PerimeterName,
    /// Rule direction.
    pub direction: RuleDirection,
    /// Origin block.
    pub from: RuleFrom,
    /// Target block.
    pub to: RuleTo,
    /// Access level to declare alongside the rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_level_name: Option<String>,
    /// IP bound to `access_level_name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_level_ip: Option<String>,
}

impl Rule {
    /// The access-level declaration this rule needs, when it carries both a
    /// name and an IP.
    pub fn access_level(&self) -> Option<(&str, &str)> {
        match (&self.access_level_name, &self.access_level_ip) {
            (Some(name), Some(ip)) => Some((name.as_str(), ip.as_str())),
            _ => None,
        }
    }
}
