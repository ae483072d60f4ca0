//! # Ownership Resolution
//!
//! Maps a project number to the perimeter that owns it. The project cache is
//! consulted first; the router table's static project lists are the
//! fallback. A miss is not an error: it means the project is external (or
//! unknown) and drives direction classification.

use vpcsc_core::{PerimeterName, ProjectCache, ProjectNumber, RouterTable};

/// Resolve the owning perimeter of `project`.
///
/// Pure over its inputs; performs no I/O.
pub fn resolve_owner(
    project: &ProjectNumber,
    cache: &ProjectCache,
    router: &RouterTable,
) -> Option<PerimeterName> {
    if let Some(perimeter) = cache.lookup(project) {
        tracing::trace!(project = %project, perimeter = %perimeter, "ownership from cache");
        return Some(perimeter.clone());
    }
    router.static_owner_of(project).cloned()
}

/// Borrowed cache + router pair, for resolving several projects against the
/// same snapshot.
#[derive(Debug, Clone, Copy)]
pub struct OwnershipResolver<'a> {
    cache: &'a ProjectCache,
    router: &'a RouterTable,
}

impl<'a> OwnershipResolver<'a> {
    pub fn new(cache: &'a ProjectCache, router: &'a RouterTable) -> Self {
        Self { cache, router }
    }

    /// See [`resolve_owner`].
    pub fn resolve(&self, project: &ProjectNumber) -> Option<PerimeterName> {
        resolve_owner(project, self.cache, self.router)
    }

    pub fn router(&self) -> &'a RouterTable {
        self.router
    }
}
