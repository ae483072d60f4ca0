//! Resource-name scanners shared by every strategy that reads a resource
//! string (`callerNetwork`, `resourceName`, violation targets, ...).

use std::sync::OnceLock;

use regex::Regex;
use vpcsc_core::{PerimeterName, ProjectNumber};

fn project_segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"projects/([A-Za-z0-9-]+)").expect("project regex must compile"))
}

fn perimeter_segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"servicePerimeters/([A-Za-z0-9_-]+)").expect("perimeter regex must compile")
    })
}

/// First `projects/<segment>` whose whole segment is numeric.
///
/// Textual project IDs (`projects/my-project`) are skipped rather than
/// matched by their numeric prefix.
pub fn project_number_in(s: &str) -> Option<ProjectNumber> {
    project_segment_re()
        .captures_iter(s)
        .filter_map(|c| c.get(1))
        .find_map(|m| ProjectNumber::new(m.as_str()).ok())
}

/// First `servicePerimeters/<name>` in `s`.
pub fn perimeter_in(s: &str) -> Option<PerimeterName> {
    perimeter_segment_re()
        .captures(s)
        .and_then(|c| c.get(1))
        .and_then(|m| PerimeterName::new(m.as_str()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_project_found_in_network_path() {
        let p = project_number_in(
            "//compute.googleapis.com/projects/1111111111/global/networks/default",
        );
        assert_eq!(p.map(|p| p.as_str().to_string()).as_deref(), Some("1111111111"));
    }

    #[test]
    fn textual_project_skipped_for_later_numeric_one() {
        let p = project_number_in("projects/my-proj/datasets/x projects/42");
        assert_eq!(p.map(|p| p.as_str().to_string()).as_deref(), Some("42"));
    }

    #[test]
    fn numeric_prefix_of_textual_id_is_not_a_number() {
        assert!(project_number_in("projects/123abc").is_none());
        assert!(project_number_in("projects/123-prod").is_none());
    }

    #[test]
    fn no_project_segment() {
        assert!(project_number_in("").is_none());
        assert!(project_number_in("organizations/1").is_none());
    }

    #[test]
    fn perimeter_name_from_policy_path() {
        let p = perimeter_in("accessPolicies/123/servicePerimeters/test_perim-a");
        assert_eq!(p.map(|p| p.as_str().to_string()).as_deref(), Some("test_perim-a"));
        assert!(perimeter_in("accessPolicies/123").is_none());
    }
}
