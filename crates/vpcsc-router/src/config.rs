//! # Configuration Files
//!
//! Loading and saving of the on-disk inputs:
//!
//! - the router table (`router.yml`, YAML)
//! - the project cache (`vpc_sc_project_cache.json`, JSON)
//! - the rules document written by `generate` and read by `route`
//!
//! The `*_or_default` loaders tolerate a missing file with a warning and
//! return an empty value; malformed files are always errors.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use vpcsc_core::{ProjectCache, RouterTable};
use vpcsc_policy::RulesDocument;

use crate::error::ConfigError;

/// Default router table file name.
pub const DEFAULT_ROUTER_FILE: &str = "router.yml";

/// Default project cache file name.
pub const DEFAULT_CACHE_FILE: &str = "vpc_sc_project_cache.json";

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn is_not_found(err: &ConfigError) -> bool {
    matches!(err, ConfigError::Read { source, .. } if source.kind() == ErrorKind::NotFound)
}

/// Load a router table. An empty file yields an empty table.
pub fn load_router(path: &Path) -> Result<RouterTable, ConfigError> {
    let text = read(path)?;
    if text.trim().is_empty() {
        return Ok(RouterTable::default());
    }
    serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a router table, treating a missing file as empty.
pub fn load_router_or_default(path: &Path) -> Result<RouterTable, ConfigError> {
    match load_router(path) {
        Err(e) if is_not_found(&e) => {
            tracing::warn!(path = %path.display(), "router table not found; treating as empty");
            Ok(RouterTable::default())
        }
        other => other,
    }
}

/// Load a project cache.
pub fn load_cache(path: &Path) -> Result<ProjectCache, ConfigError> {
    let text = read(path)?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a project cache, treating a missing file as empty.
pub fn load_cache_or_default(path: &Path) -> Result<ProjectCache, ConfigError> {
    match load_cache(path) {
        Err(e) if is_not_found(&e) => {
            tracing::warn!(
                path = %path.display(),
                "project cache not found; run `vpcsc cache build` to create it"
            );
            Ok(ProjectCache::default())
        }
        other => other,
    }
}

/// Write a project cache as pretty JSON, creating parent directories.
pub fn save_cache(path: &Path, cache: &ProjectCache) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(cache).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, format!("{json}\n")).map_err(write_err)
}

/// Load a rules document produced by the generation step.
pub fn load_rules_document(path: &Path) -> Result<RulesDocument, ConfigError> {
    let text = read(path)?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Path of `file` relative to `dir` unless it is already absolute.
pub fn resolve_in(dir: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use vpcsc_core::{PerimeterName, ProjectNumber};

    const ROUTER_YAML: &str = r#"
access_level_module:
  source: app.terraform.io/org/vpc-service-controls/google//modules/access_level
  version: "0.0.4"
perimeters:
  test-perim-a:
    repo: your-org/test-perim-a-config
    policy_id: 123456789
    projects:
      - 1111111111
      - "1111111112"
  test-perim-b:
    repo: https://github.com/your-org/test-perim-b-config
    tfvars_file: env/prod.auto.tfvars
    accesslevel_file: env/accesslevel.tf
"#;

    #[test]
    fn router_yaml_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.yml");
        std::fs::write(&path, ROUTER_YAML).unwrap();
        let table = load_router(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.access_level_module().version, "0.0.4");

        let a = table.entry(&PerimeterName::new("test-perim-a").unwrap()).unwrap();
        assert_eq!(a.policy_id.as_deref(), Some("123456789"));
        assert_eq!(a.projects[0], ProjectNumber::new("1111111111").unwrap());
        assert_eq!(a.variables_file_path, "terraform.auto.tfvars");

        let b = table.entry(&PerimeterName::new("test-perim-b").unwrap()).unwrap();
        assert_eq!(b.variables_file_path, "env/prod.auto.tfvars");
        assert_eq!(
            b.repository_url().as_deref(),
            Some("https://github.com/your-org/test-perim-b-config")
        );
    }

    #[test]
    fn empty_router_file_is_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.yml");
        std::fs::write(&path, "\n").unwrap();
        assert!(load_router(&path).unwrap().is_empty());
    }

    #[test]
    fn malformed_router_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.yml");
        std::fs::write(&path, "perimeters:\n  bad name!: {}\n").unwrap();
        assert!(matches!(
            load_router(&path),
            Err(ConfigError::Yaml { .. })
        ));
        assert!(load_router_or_default(&path).is_err());
    }

    #[test]
    fn missing_files_tolerated_by_default_loaders() {
        let dir = tempfile::tempdir().unwrap();
        let router = load_router_or_default(&dir.path().join("nope.yml")).unwrap();
        assert!(router.is_empty());
        let cache = load_cache_or_default(&dir.path().join("nope.json")).unwrap();
        assert!(cache.is_empty());
        assert!(load_cache(&dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn cache_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        let mut projects = BTreeMap::new();
        projects.insert("1111111111".to_string(), PerimeterName::new("a").unwrap());
        let cache = ProjectCache {
            cache_source: Some("static_router".into()),
            projects,
            ..ProjectCache::default()
        };
        save_cache(&path, &cache).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\"cache_source\": \"static_router\""));
        assert_eq!(load_cache(&path).unwrap(), cache);
    }

    #[test]
    fn rules_document_loads_failure_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, r#"{"success": false, "error": "TLM ID required"}"#).unwrap();
        let doc = load_rules_document(&path).unwrap();
        assert_eq!(doc.error.as_deref(), Some("TLM ID required"));
    }

    #[test]
    fn resolve_in_keeps_absolute_paths() {
        let base = Path::new("/repo");
        assert_eq!(resolve_in(base, Path::new("router.yml")), PathBuf::from("/repo/router.yml"));
        assert_eq!(resolve_in(base, Path::new("/etc/r.yml")), PathBuf::from("/etc/r.yml"));
    }
}
