//! # Project Cache
//!
//! Read-only snapshot of project number → perimeter name, produced by an
//! external refresh process and consulted first during ownership
//! resolution.
//!
//! On disk the snapshot is JSON:
//!
//! ```json
//! {
//!   "last_updated": "2025-01-01T00:00:00Z",
//!   "cache_source": "gcp_api",
//!   "projects": { "1111111111": "test-perim-a" }
//! }
//! ```
//!
//! `lastUpdated` and `source` are accepted as aliases.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{PerimeterName, ProjectNumber};

/// Project number → owning perimeter snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCache {
    /// When the snapshot was taken, as written by the producer.
    #[serde(default, alias = "lastUpdated", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Which producer wrote the snapshot.
    #[serde(default, alias = "source", skip_serializing_if = "Option::is_none")]
    pub cache_source: Option<String>,
    /// Free-form producer note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Project number (decimal string) → perimeter name.
    #[serde(default)]
    pub projects: BTreeMap<String, PerimeterName>,
}

impl ProjectCache {
    /// A snapshot stamped with `now`.
    pub fn new(
        projects: BTreeMap<String, PerimeterName>,
        cache_source: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            last_updated: Some(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
            cache_source: Some(cache_source.into()),
            note: None,
            projects,
        }
    }

    /// Exact-hit lookup.
    pub fn lookup(&self, project: &ProjectNumber) -> Option<&PerimeterName> {
        self.projects.get(project.as_str())
    }

    /// `last_updated` parsed as RFC 3339, if it is one.
    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.last_updated.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Number of cached projects.
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether the snapshot maps no project.
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Project counts per perimeter, in perimeter-name order.
    pub fn perimeter_counts(&self) -> BTreeMap<&PerimeterName, usize> {
        let mut counts = BTreeMap::new();
        for perimeter in self.projects.values() {
            *counts.entry(perimeter).or_insert(0) += 1;
        }
        counts
    }
}
