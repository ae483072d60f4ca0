//! # Project Cache Building
//!
//! Builds a [`ProjectCache`] by asking a [`PerimeterInventory`] which
//! projects each routed perimeter protects. The live cloud inventory is an
//! external collaborator; [`StaticInventory`] answers from the router
//! table's static project lists and is what the CLI uses by default.
//!
//! A project listed under several perimeters is attributed to the first
//! perimeter (router-table order) that lists it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use vpcsc_core::{PerimeterName, ProjectCache, ProjectNumber, RouterTable};

use crate::error::CacheError;

/// Source label written into caches built from static router lists.
pub const STATIC_SOURCE: &str = "static_router";

/// Lists the projects protected by a perimeter.
pub trait PerimeterInventory {
    /// Projects in `perimeter` under access policy `policy_id`.
    fn projects(
        &self,
        policy_id: &str,
        perimeter: &PerimeterName,
    ) -> Result<Vec<ProjectNumber>, CacheError>;
}

/// Inventory backed by the router table's `projects` lists.
#[derive(Debug, Clone, Copy)]
pub struct StaticInventory<'a> {
    router: &'a RouterTable,
}

impl<'a> StaticInventory<'a> {
    pub fn new(router: &'a RouterTable) -> Self {
        Self { router }
    }
}

impl PerimeterInventory for StaticInventory<'_> {
    fn projects(
        &self,
        _policy_id: &str,
        perimeter: &PerimeterName,
    ) -> Result<Vec<ProjectNumber>, CacheError> {
        Ok(self
            .router
            .entry(perimeter)
            .map(|e| e.projects.clone())
            .unwrap_or_default())
    }
}

/// Build a cache covering every routed perimeter that has a `policy_id`.
///
/// Perimeters whose inventory call fails are logged and skipped. Fails with
/// [`CacheError::Empty`] only when no perimeter contributed any project.
pub fn build_cache(
    router: &RouterTable,
    inventory: &dyn PerimeterInventory,
    source_label: &str,
    now: DateTime<Utc>,
) -> Result<ProjectCache, CacheError> {
    let mut projects: BTreeMap<String, PerimeterName> = BTreeMap::new();

    for entry in router.entries() {
        let perimeter = &entry.perimeter_name;
        let Some(policy_id) = entry.policy_id.as_deref() else {
            tracing::warn!(perimeter = %perimeter, "no policy_id in router table; skipping");
            continue;
        };

        let found = match inventory.projects(policy_id, perimeter) {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(perimeter = %perimeter, error = %err, "inventory failed; skipping");
                continue;
            }
        };

        let mut added = 0usize;
        for project in found {
            if let std::collections::btree_map::Entry::Vacant(slot) =
                projects.entry(project.as_str().to_string())
            {
                slot.insert(perimeter.clone());
                added += 1;
            }
        }
        tracing::info!(perimeter = %perimeter, projects = added, "perimeter inventoried");
    }

    if projects.is_empty() {
        return Err(CacheError::Empty);
    }
    Ok(ProjectCache::new(projects, source_label, now))
}
