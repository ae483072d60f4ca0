//! # Router Table
//!
//! Static mapping from perimeter name to the repository and files that hold
//! that perimeter's configuration. This is the single place perimeter →
//! repository/file lookups are answered; synthesis (static project lists)
//! and merge/dispatch (file paths) both read it.
//!
//! ## Source format
//!
//! ```yaml
//! access_level_module:
//!   source: terraform-google-modules/vpc-service-controls/google//modules/access_level
//!   version: "~> 6.0"
//! perimeters:
//!   test-perim-a:
//!     repo: your-org/test-perim-a-config
//!     tfvars_file: terraform.auto.tfvars
//!     accesslevel_file: accesslevel.tf
//!     policy_id: 123456789
//!     projects: [1111111111, "1111111112"]
//! ```
//!
//! Numeric scalars are accepted wherever a string identifier is expected.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ValidationError;
use crate::identity::{PerimeterName, ProjectNumber};

/// Default variables file holding `ingress_policies` / `egress_policies`.
pub const DEFAULT_VARIABLES_FILE: &str = "terraform.auto.tfvars";

/// Default file holding access-level module declarations.
pub const DEFAULT_ACCESS_LEVEL_FILE: &str = "accesslevel.tf";

/// Terraform module used for access-level declarations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessLevelModule {
    /// Module source address.
    #[serde(default = "AccessLevelModule::default_source")]
    pub source: String,
    /// Module version constraint.
    #[serde(default = "AccessLevelModule::default_version")]
    pub version: String,
}

impl AccessLevelModule {
    fn default_source() -> String {
        "terraform-google-modules/vpc-service-controls/google//modules/access_level".to_string()
    }

    fn default_version() -> String {
        "~> 6.0".to_string()
    }
}

impl Default for AccessLevelModule {
    fn default() -> Self {
        Self {
            source: Self::default_source(),
            version: Self::default_version(),
        }
    }
}

/// Routing information for one perimeter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerimeterRouterEntry {
    /// Perimeter this entry routes.
    pub perimeter_name: PerimeterName,
    /// Owning repository as configured (`org/name` or a full URL).
    pub repository: Option<String>,
    /// Path of the policy variables file inside the repository.
    pub variables_file_path: String,
    /// Path of the access-level file inside the repository.
    pub access_level_file_path: String,
    /// Access policy the perimeter belongs to.
    pub policy_id: Option<String>,
    /// Projects statically known to live in the perimeter.
    pub projects: Vec<ProjectNumber>,
}

impl PerimeterRouterEntry {
    /// An entry with default file paths and nothing else configured.
    pub fn new(perimeter_name: PerimeterName) -> Self {
        Self {
            perimeter_name,
            repository: None,
            variables_file_path: DEFAULT_VARIABLES_FILE.to_string(),
            access_level_file_path: DEFAULT_ACCESS_LEVEL_FILE.to_string(),
            policy_id: None,
            projects: Vec::new(),
        }
    }

    /// Clone URL for the repository. `org/name` shorthands expand to GitHub.
    pub fn repository_url(&self) -> Option<String> {
        let repo = self.repository.as_deref()?.trim();
        if repo.is_empty() {
            return None;
        }
        if repo.starts_with("http") {
            Some(repo.to_string())
        } else {
            Some(format!("https://github.com/{repo}"))
        }
    }

    /// Whether the static project list contains `project`.
    pub fn lists_project(&self, project: &ProjectNumber) -> bool {
        self.projects.iter().any(|p| p == project)
    }
}

/// Read-only perimeter → routing lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawRouterTable")]
pub struct RouterTable {
    access_level_module: AccessLevelModule,
    perimeters: BTreeMap<PerimeterName, PerimeterRouterEntry>,
}

impl RouterTable {
    /// Build a table from entries. Later entries replace earlier ones with
    /// the same perimeter name.
    pub fn new(
        entries: impl IntoIterator<Item = PerimeterRouterEntry>,
        access_level_module: AccessLevelModule,
    ) -> Self {
        let perimeters = entries
            .into_iter()
            .map(|e| (e.perimeter_name.clone(), e))
            .collect();
        Self {
            access_level_module,
            perimeters,
        }
    }

    /// Routing entry for a perimeter.
    pub fn entry(&self, perimeter: &PerimeterName) -> Option<&PerimeterRouterEntry> {
        self.perimeters.get(perimeter)
    }

    /// All entries in perimeter-name order.
    pub fn entries(&self) -> impl Iterator<Item = &PerimeterRouterEntry> {
        self.perimeters.values()
    }

    /// First perimeter (in name order) whose static project list contains
    /// `project`.
    pub fn static_owner_of(&self, project: &ProjectNumber) -> Option<&PerimeterName> {
        self.perimeters
            .values()
            .find(|e| e.lists_project(project))
            .map(|e| &e.perimeter_name)
    }

    /// Module used for access-level declarations.
    pub fn access_level_module(&self) -> &AccessLevelModule {
        &self.access_level_module
    }

    /// Number of routed perimeters.
    pub fn len(&self) -> usize {
        self.perimeters.len()
    }

    /// Whether no perimeter is routed.
    pub fn is_empty(&self) -> bool {
        self.perimeters.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Source format
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(u64),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default)]
    repo: Option<String>,
    #[serde(default)]
    tfvars_file: Option<String>,
    #[serde(default)]
    accesslevel_file: Option<String>,
    #[serde(default)]
    policy_id: Option<Scalar>,
    #[serde(default)]
    projects: Option<Vec<Scalar>>,
}

#[derive(Deserialize)]
struct RawRouterTable {
    #[serde(default)]
    access_level_module: Option<AccessLevelModule>,
    #[serde(default)]
    perimeters: Option<BTreeMap<String, Option<RawEntry>>>,
}

impl TryFrom<RawRouterTable> for RouterTable {
    type Error = ValidationError;

    fn try_from(raw: RawRouterTable) -> Result<Self, Self::Error> {
        let mut entries = Vec::new();
        for (name, entry) in raw.perimeters.unwrap_or_default() {
            let mut routed = PerimeterRouterEntry::new(PerimeterName::new(name)?);
            if let Some(entry) = entry {
                routed.repository = entry.repo;
                if let Some(path) = entry.tfvars_file {
                    routed.variables_file_path = path;
                }
                if let Some(path) = entry.accesslevel_file {
                    routed.access_level_file_path = path;
                }
                routed.policy_id = entry.policy_id.map(Scalar::into_string);
                routed.projects = entry
                    .projects
                    .unwrap_or_default()
                    .into_iter()
                    .map(|p| ProjectNumber::new(p.into_string()))
                    .collect::<Result<_, _>>()?;
            }
            entries.push(routed);
        }
        Ok(Self::new(
            entries,
            raw.access_level_module.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_from_json(v: serde_json::Value) -> RouterTable {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn entry_defaults_file_paths() {
        let table = table_from_json(serde_json::json!({
            "perimeters": {"finance": {"repo": "org/finance-config"}}
        }));
        let entry = table.entry(&PerimeterName::new("finance").unwrap()).unwrap();
        assert_eq!(entry.variables_file_path, DEFAULT_VARIABLES_FILE);
        assert_eq!(entry.access_level_file_path, DEFAULT_ACCESS_LEVEL_FILE);
        assert_eq!(
            entry.repository_url().as_deref(),
            Some("https://github.com/org/finance-config")
        );
    }

    #[test]
    fn numeric_policy_and_projects_accepted() {
        let table = table_from_json(serde_json::json!({
            "perimeters": {"a": {"policy_id": 123456789, "projects": [1111111111u64, "1111111112"]}}
        }));
        let entry = table.entry(&PerimeterName::new("a").unwrap()).unwrap();
        assert_eq!(entry.policy_id.as_deref(), Some("123456789"));
        assert_eq!(entry.projects.len(), 2);
        assert_eq!(entry.projects[1].as_str(), "1111111112");
    }

    #[test]
    fn textual_static_project_rejected() {
        let result = serde_json::from_value::<RouterTable>(serde_json::json!({
            "perimeters": {"a": {"projects": ["my-project"]}}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn full_url_repository_kept() {
        let mut entry = PerimeterRouterEntry::new(PerimeterName::new("a").unwrap());
        entry.repository = Some("https://git.example.com/org/a.git".into());
        assert_eq!(
            entry.repository_url().as_deref(),
            Some("https://git.example.com/org/a.git")
        );
        entry.repository = Some("  ".into());
        assert_eq!(entry.repository_url(), None);
    }

    #[test]
    fn static_owner_scans_project_lists() {
        let table = table_from_json(serde_json::json!({
            "perimeters": {
                "a": {"projects": ["1"]},
                "b": {"projects": ["2", "3"]}
            }
        }));
        let owner = table.static_owner_of(&ProjectNumber::new("3").unwrap());
        assert_eq!(owner.map(|p| p.as_str()), Some("b"));
        assert!(table.static_owner_of(&ProjectNumber::new("9").unwrap()).is_none());
    }

    #[test]
    fn empty_and_null_sections_tolerated() {
        let table = table_from_json(serde_json::json!({"perimeters": null}));
        assert!(table.is_empty());
        let table = table_from_json(serde_json::json!({"perimeters": {"a": null}}));
        assert_eq!(table.len(), 1);
        assert_eq!(table.access_level_module(), &AccessLevelModule::default());
    }

    #[test]
    fn access_level_module_partial_override() {
        let table = table_from_json(serde_json::json!({
            "access_level_module": {"version": "0.0.4"}
        }));
        assert_eq!(table.access_level_module().version, "0.0.4");
        assert_eq!(
            table.access_level_module().source,
            AccessLevelModule::default().source
        );
    }
}
