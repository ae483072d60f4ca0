//! # Per-Perimeter Dispatch
//!
//! Turns a rules document into one change proposal per affected perimeter.
//!
//! ## Flow (per perimeter)
//!
//! 1. Look up the perimeter in the [`RouterTable`]; it must exist and name
//!    a repository.
//! 2. Clone the repository into a fresh temporary directory.
//! 3. Create the branch `vpcsc/req-<issue>-<perimeter>-<directions>`.
//! 4. Append the perimeter's rules to the variables file, and access levels
//!    to the access-level file when any rule needs one.
//! 5. Commit; then either push and open a pull request (`created`) or stop
//!    with the branch prepared (`ready_for_pr`).
//!
//! Perimeters are processed in the order their first rule appears. A
//! failure in one perimeter is recorded as an `error` status and never
//! prevents the next perimeter from being attempted. The temporary checkout
//! is removed when the perimeter finishes, except for a `ready_for_pr`
//! perimeter: its checkout holds the only copy of the prepared branch, so it
//! is kept and reported as `checkout`.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use vpcsc_core::{PerimeterName, PerimeterRouterEntry, RouterTable, Rule};
use vpcsc_hcl::{merge_access_levels, merge_policies};
use vpcsc_policy::{RequestSummary, RulesDocument};

use crate::error::RoutingError;
use crate::transport::RepoTransport;

/// Status message for a branch prepared without publishing.
pub const READY_MESSAGE: &str = "Branch created, ready for PR (set GITHUB_TOKEN to create PR)";

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Parameters for one routing run.
#[derive(Debug, Clone, Copy)]
pub struct RouteRequest<'a> {
    /// Tracking issue the rules were requested in.
    pub issue_number: u64,
    /// Comment text attached to every appended policy entry.
    pub justification: Option<&'a str>,
    /// Push and open pull requests; otherwise stop after committing.
    pub publish: bool,
}

/// Outcome of one perimeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrStatus {
    Created,
    ReadyForPr,
    Error,
}

/// Per-perimeter entry of the routing report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerimeterStatus {
    pub perimeter: String,
    pub status: PrStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files_modified: Vec<String>,
    /// Local clone holding an unpushed branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PerimeterStatus {
    fn failed(perimeter: &PerimeterName, err: &RoutingError) -> Self {
        Self {
            perimeter: perimeter.to_string(),
            status: PrStatus::Error,
            branch: None,
            pr_title: None,
            pr_url: None,
            direction: None,
            files_modified: Vec::new(),
            checkout: None,
            message: None,
            error: Some(err.to_string()),
        }
    }
}

/// Counts over all perimeters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingSummary {
    pub total_perimeters: usize,
    pub successful_prs: usize,
    pub failed_prs: usize,
    pub message: String,
}

/// Aggregated result of a routing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingReport {
    /// True iff no perimeter errored.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
    pub pull_requests: Vec<PerimeterStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RoutingSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RoutingReport {
    fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            issue_number: None,
            pull_requests: Vec::new(),
            summary: None,
            error: Some(error.into()),
        }
    }

    fn from_statuses(issue_number: u64, statuses: Vec<PerimeterStatus>) -> Self {
        let count = |s: PrStatus| statuses.iter().filter(|p| p.status == s).count();
        let successful_prs = count(PrStatus::Created);
        let failed_prs = count(PrStatus::Error);
        let total_perimeters = statuses.len();
        Self {
            success: failed_prs == 0,
            issue_number: Some(issue_number),
            summary: Some(RoutingSummary {
                total_perimeters,
                successful_prs,
                failed_prs,
                message: format!(
                    "Generated {successful_prs} PR(s) for {total_perimeters} perimeter(s)"
                ),
            }),
            pull_requests: statuses,
            error: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Route every rule in `doc` to its perimeter's repository.
///
/// A document that carries an error, or holds no rules, is rejected
/// without touching any repository.
pub fn route(
    doc: &RulesDocument,
    router: &RouterTable,
    transport: &dyn RepoTransport,
    request: RouteRequest<'_>,
) -> RoutingReport {
    if let Some(error) = &doc.error {
        return RoutingReport::rejected(error.clone());
    }
    if doc.success == Some(false) {
        return RoutingReport::rejected("Rule generation failed");
    }
    if doc.rules.is_empty() {
        return RoutingReport::rejected("No rules generated");
    }

    let groups = group_by_perimeter(&doc.rules);
    tracing::info!(
        perimeters = groups.len(),
        issue = request.issue_number,
        "routing rules"
    );

    let context = ChangeContext::new(doc.request_summary.as_ref(), &doc.rules);
    let statuses = groups
        .into_iter()
        .map(|(perimeter, rules)| {
            match route_perimeter(&perimeter, &rules, router, transport, request, &context) {
                Ok(status) => {
                    tracing::info!(perimeter = %perimeter, status = ?status.status, "perimeter routed");
                    status
                }
                Err(err) => {
                    tracing::warn!(perimeter = %perimeter, error = %err, "perimeter failed");
                    PerimeterStatus::failed(&perimeter, &err)
                }
            }
        })
        .collect();

    RoutingReport::from_statuses(request.issue_number, statuses)
}

/// Group rules by perimeter, preserving first-appearance order.
pub fn group_by_perimeter(rules: &[Rule]) -> Vec<(PerimeterName, Vec<Rule>)> {
    let mut groups: Vec<(PerimeterName, Vec<Rule>)> = Vec::new();
    for rule in rules {
        match groups.iter_mut().find(|(p, _)| *p == rule.perimeter) {
            Some((_, group)) => group.push(rule.clone()),
            None => groups.push((rule.perimeter.clone(), vec![rule.clone()])),
        }
    }
    groups
}

/// Branch name for an issue, perimeter and rule set.
pub fn branch_name(issue_number: u64, perimeter: &PerimeterName, rules: &[Rule]) -> String {
    let directions = directions(rules)
        .iter()
        .map(|d| d.to_lowercase())
        .collect::<Vec<_>>()
        .join("-");
    format!("vpcsc/req-{issue_number}-{perimeter}-{directions}")
}

/// Distinct rule directions, alphabetical.
fn directions(rules: &[Rule]) -> Vec<&'static str> {
    rules
        .iter()
        .map(|r| r.direction.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Request details shared by every perimeter's commit and pull request.
struct ChangeContext {
    service: String,
    method: String,
    caller_ip: Option<String>,
    tlm_id: Option<String>,
}

impl ChangeContext {
    fn new(summary: Option<&RequestSummary>, rules: &[Rule]) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            service: summary
                .and_then(|s| non_empty(s.service.as_str()))
                .unwrap_or_else(|| "unknown".to_string()),
            method: summary
                .and_then(|s| non_empty(s.method.as_str()))
                .unwrap_or_else(|| "unknown".to_string()),
            caller_ip: summary.and_then(|s| s.source.ip.clone()),
            tlm_id: rules
                .iter()
                .find_map(|r| r.access_level_name.clone()),
        }
    }

    fn caller(&self) -> &str {
        self.caller_ip.as_deref().unwrap_or("internal")
    }

    fn commit_message(&self, perimeter: &PerimeterName, issue: u64, directions: &str) -> String {
        format!(
            "[VPC-SC] Add rules for {perimeter} - Issue #{issue}\n\n\
             Service: {}\n\
             Method: {}\n\
             Direction: {directions}\n\
             Caller: {}",
            self.service,
            self.method,
            self.caller(),
        )
    }

    fn pr_title(&self, perimeter: &PerimeterName) -> String {
        format!(
            "VPC SC rules for {perimeter} - {} from {}",
            self.service,
            self.caller()
        )
    }

    fn pr_body(
        &self,
        perimeter: &PerimeterName,
        issue: u64,
        directions: &str,
        entry: &PerimeterRouterEntry,
    ) -> String {
        format!(
            "## VPC Service Controls Rule Request\n\
             \n\
             **Issue:** #{issue}\n\
             **Perimeter:** {perimeter}\n\
             **Direction:** {directions}\n\
             \n\
             ### Request Summary\n\
             - **Service:** {service}\n\
             - **Method:** {method}\n\
             - **Caller IP:** {caller}\n\
             - **TLM ID:** {tlm}\n\
             \n\
             ### Changes\n\
             This PR appends new VPC Service Controls rules while preserving existing configurations.\n\
             \n\
             - Updated `{vars}` with new ingress/egress policies\n\
             - Updated `{levels}` with new access levels (if applicable)\n\
             \n\
             All changes are append-only - no existing configurations are modified or removed.\n\
             \n\
             ### Network Security Review Checklist\n\
             - [ ] Source is known and trusted\n\
             - [ ] Destination is correct\n\
             - [ ] Service and method are appropriate\n\
             - [ ] TLM ID is valid (if applicable)\n\
             - [ ] Access level is correct (if applicable)\n\
             - [ ] Changes don't affect other rules\n",
            service = self.service,
            method = self.method,
            caller = self.caller_ip.as_deref().unwrap_or("Internal"),
            tlm = self.tlm_id.as_deref().unwrap_or("N/A (internal)"),
            vars = entry.variables_file_path,
            levels = entry.access_level_file_path,
        )
    }
}

fn route_perimeter(
    perimeter: &PerimeterName,
    rules: &[Rule],
    router: &RouterTable,
    transport: &dyn RepoTransport,
    request: RouteRequest<'_>,
    context: &ChangeContext,
) -> Result<PerimeterStatus, RoutingError> {
    let entry = router
        .entry(perimeter)
        .ok_or_else(|| RoutingError::UnknownPerimeter(perimeter.clone()))?;
    let url = entry
        .repository_url()
        .ok_or_else(|| RoutingError::MissingRepository(perimeter.clone()))?;
    let vars_file = checked_relative(perimeter, &entry.variables_file_path)?;
    let levels_file = checked_relative(perimeter, &entry.access_level_file_path)?;

    let workdir = tempfile::tempdir().map_err(|source| RoutingError::Io {
        path: std::env::temp_dir(),
        source,
    })?;
    let checkout = workdir.path().join("repo");
    tracing::debug!(perimeter = %perimeter, url = %url, "cloning");
    transport.clone_repo(&url, &checkout)?;

    let branch = branch_name(request.issue_number, perimeter, rules);
    transport.create_branch(&checkout, &branch)?;

    let mut files_modified = Vec::new();

    let vars_path = checkout.join(vars_file);
    let merged = merge_policies(&read_existing(&vars_path)?, rules, request.justification);
    write_file(&vars_path, &merged)?;
    files_modified.push(entry.variables_file_path.clone());

    let levels_path = checkout.join(levels_file);
    let module = router.access_level_module();
    if let Some(levels) = merge_access_levels(&read_existing(&levels_path)?, rules, module) {
        write_file(&levels_path, &levels)?;
        files_modified.push(entry.access_level_file_path.clone());
    }

    let direction = directions(rules).join(", ");
    let staged: Vec<&str> = files_modified.iter().map(String::as_str).collect();
    transport.commit(
        &checkout,
        &staged,
        &context.commit_message(perimeter, request.issue_number, &direction),
    )?;

    let status = if request.publish {
        transport.push(&checkout, &url, &branch)?;
        let title = context.pr_title(perimeter);
        let body = context.pr_body(perimeter, request.issue_number, &direction, entry);
        let pr_url = transport.open_pull_request(&url, &branch, &title, &body)?;
        PerimeterStatus {
            perimeter: perimeter.to_string(),
            status: PrStatus::Created,
            branch: Some(branch),
            pr_title: Some(title),
            pr_url: Some(pr_url),
            direction: Some(direction),
            files_modified,
            checkout: None,
            message: None,
            error: None,
        }
    } else {
        let kept = workdir.keep().join("repo");
        tracing::info!(perimeter = %perimeter, checkout = %kept.display(), "branch prepared locally");
        PerimeterStatus {
            perimeter: perimeter.to_string(),
            status: PrStatus::ReadyForPr,
            branch: Some(branch),
            pr_title: Some(format!("VPC SC rules for {perimeter} - {}", context.service)),
            pr_url: None,
            direction: Some(direction),
            files_modified,
            checkout: Some(kept),
            message: Some(READY_MESSAGE.to_string()),
            error: None,
        }
    };
    Ok(status)
}

/// Reject absolute paths and parent-directory components.
fn checked_relative<'a>(perimeter: &PerimeterName, path: &'a str) -> Result<&'a Path, RoutingError> {
    let candidate = Path::new(path);
    let safe = !path.trim().is_empty()
        && candidate
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if safe {
        Ok(candidate)
    } else {
        Err(RoutingError::UnsafePath {
            perimeter: perimeter.clone(),
            path: path.to_string(),
        })
    }
}

/// Current file content; a missing file reads as empty.
fn read_existing(path: &Path) -> Result<String, RoutingError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(RoutingError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), RoutingError> {
    let io_err = |path: PathBuf| move |source| RoutingError::Io { path, source };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err(parent.to_path_buf()))?;
    }
    std::fs::write(path, content).map_err(io_err(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use vpcsc_core::{AccessLevelModule, RuleDirection, RuleFrom, RuleSources, RuleTo};

    use crate::error::TransportError;

    /// Records calls; "clones" by seeding files into the destination.
    #[derive(Default)]
    struct FakeTransport {
        seed: BTreeMap<String, String>,
        fail_clone_for: Option<String>,
        calls: RefCell<Vec<String>>,
        commits: RefCell<Vec<(Vec<String>, String)>>,
        files: RefCell<BTreeMap<String, String>>,
        clones: RefCell<Vec<PathBuf>>,
    }

    impl RepoTransport for FakeTransport {
        fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), TransportError> {
            self.calls.borrow_mut().push(format!("clone {url}"));
            if self.fail_clone_for.as_deref() == Some(url) {
                return Err(TransportError::Failed {
                    command: "git clone".into(),
                    status: "128".into(),
                    stderr: "repository not found".into(),
                });
            }
            std::fs::create_dir_all(dest).unwrap();
            for (file, text) in &self.seed {
                let path = dest.join(file);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(path, text).unwrap();
            }
            self.clones.borrow_mut().push(dest.to_path_buf());
            Ok(())
        }

        fn create_branch(&self, _repo: &Path, branch: &str) -> Result<(), TransportError> {
            self.calls.borrow_mut().push(format!("branch {branch}"));
            Ok(())
        }

        fn commit(&self, repo: &Path, files: &[&str], message: &str) -> Result<(), TransportError> {
            self.calls.borrow_mut().push("commit".into());
            for file in files {
                let text = std::fs::read_to_string(repo.join(file)).unwrap();
                self.files.borrow_mut().insert(file.to_string(), text);
            }
            self.commits.borrow_mut().push((
                files.iter().map(|f| f.to_string()).collect(),
                message.to_string(),
            ));
            Ok(())
        }

        fn push(&self, _repo: &Path, _url: &str, branch: &str) -> Result<(), TransportError> {
            self.calls.borrow_mut().push(format!("push {branch}"));
            Ok(())
        }

        fn open_pull_request(
            &self,
            url: &str,
            _branch: &str,
            title: &str,
            _body: &str,
        ) -> Result<String, TransportError> {
            self.calls.borrow_mut().push(format!("pr {title}"));
            Ok(format!("{url}/pull/1"))
        }
    }

    fn p(name: &str) -> PerimeterName {
        PerimeterName::new(name).unwrap()
    }

    fn rule(perimeter: &str, direction: RuleDirection) -> Rule {
        Rule {
            perimeter: p(perimeter),
            direction,
            from: RuleFrom {
                identity_type: String::new(),
                sources: None,
                identities: vec!["user:a@example.com".into()],
            },
            to: RuleTo {
                resources: vec!["projects/2".into()],
                operations: BTreeMap::new(),
            },
            access_level_name: None,
            access_level_ip: None,
        }
    }

    fn public_ingress(perimeter: &str) -> Rule {
        let mut r = rule(perimeter, RuleDirection::Ingress);
        r.from.sources = Some(RuleSources {
            resources: vec![],
            access_levels: vec!["tlm-123".into()],
        });
        r.access_level_name = Some("tlm-123".into());
        r.access_level_ip = Some("8.8.8.8".into());
        r
    }

    fn router(names: &[&str]) -> RouterTable {
        let entries = names.iter().map(|name| {
            let mut e = PerimeterRouterEntry::new(p(name));
            e.repository = Some(format!("org/{name}-config"));
            e
        });
        RouterTable::new(entries, AccessLevelModule::default())
    }

    fn doc(rules: Vec<Rule>) -> RulesDocument {
        RulesDocument {
            success: Some(true),
            rules,
            ..RulesDocument::default()
        }
    }

    fn request(publish: bool) -> RouteRequest<'static> {
        RouteRequest {
            issue_number: 42,
            justification: Some("TLM-123"),
            publish,
        }
    }

    #[test]
    fn error_document_touches_nothing() {
        let fake = FakeTransport::default();
        let bad = RulesDocument {
            success: Some(false),
            error: Some("TLM ID required".into()),
            ..RulesDocument::default()
        };
        let report = route(&bad, &router(&["a"]), &fake, request(true));
        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some("TLM ID required"));
        assert!(report.pull_requests.is_empty());
        assert!(fake.calls.borrow().is_empty());
    }

    #[test]
    fn zero_rules_rejected() {
        let fake = FakeTransport::default();
        let report = route(&doc(vec![]), &router(&["a"]), &fake, request(true));
        assert_eq!(report.error.as_deref(), Some("No rules generated"));
        assert!(fake.calls.borrow().is_empty());
    }

    #[test]
    fn groups_preserve_first_appearance() {
        let groups = group_by_perimeter(&[
            rule("zeta", RuleDirection::Ingress),
            rule("alpha", RuleDirection::Egress),
            rule("zeta", RuleDirection::Egress),
        ]);
        let names: Vec<_> = groups.iter().map(|(p, r)| (p.as_str(), r.len())).collect();
        assert_eq!(names, vec![("zeta", 2), ("alpha", 1)]);
    }

    #[test]
    fn branch_lists_directions_alphabetically() {
        let rules = [
            rule("a", RuleDirection::Ingress),
            rule("a", RuleDirection::Egress),
        ];
        assert_eq!(branch_name(7, &p("a"), &rules), "vpcsc/req-7-a-egress-ingress");
        assert_eq!(
            branch_name(7, &p("a"), &rules[..1]),
            "vpcsc/req-7-a-ingress"
        );
    }

    #[test]
    fn published_perimeter_is_created_with_pr_url() {
        let fake = FakeTransport::default();
        let report = route(
            &doc(vec![public_ingress("finance")]),
            &router(&["finance"]),
            &fake,
            request(true),
        );
        assert!(report.success);
        let status = &report.pull_requests[0];
        assert_eq!(status.status, PrStatus::Created);
        assert_eq!(
            status.pr_url.as_deref(),
            Some("https://github.com/org/finance-config/pull/1")
        );
        assert_eq!(status.branch.as_deref(), Some("vpcsc/req-42-finance-ingress"));
        assert_eq!(
            status.files_modified,
            vec!["terraform.auto.tfvars".to_string(), "accesslevel.tf".to_string()]
        );
        assert_eq!(
            status.pr_title.as_deref(),
            Some("VPC SC rules for finance - unknown from internal")
        );

        let summary = report.summary.unwrap();
        assert_eq!(summary.successful_prs, 1);
        assert_eq!(summary.message, "Generated 1 PR(s) for 1 perimeter(s)");

        let files = fake.files.borrow();
        assert!(files["terraform.auto.tfvars"].contains("    # TLM-123\n"));
        assert!(files["accesslevel.tf"].contains("vpc-service-controls-access-level_tlm-123"));
    }

    #[test]
    fn unpublished_perimeter_is_ready_for_pr() {
        let fake = FakeTransport::default();
        let report = route(
            &doc(vec![rule("finance", RuleDirection::Egress)]),
            &router(&["finance"]),
            &fake,
            request(false),
        );
        assert!(report.success);
        let status = &report.pull_requests[0];
        assert_eq!(status.status, PrStatus::ReadyForPr);
        assert_eq!(status.message.as_deref(), Some(READY_MESSAGE));
        assert_eq!(status.files_modified, vec!["terraform.auto.tfvars".to_string()]);
        assert!(!fake.calls.borrow().iter().any(|c| c.starts_with("push")));
        assert_eq!(report.summary.unwrap().successful_prs, 0);
    }

    #[test]
    fn existing_content_is_kept_as_prefix() {
        let mut seed = BTreeMap::new();
        seed.insert(
            "terraform.auto.tfvars".to_string(),
            "ingress_policies = []\n".to_string(),
        );
        let fake = FakeTransport {
            seed,
            ..FakeTransport::default()
        };
        route(
            &doc(vec![rule("finance", RuleDirection::Egress)]),
            &router(&["finance"]),
            &fake,
            request(false),
        );
        let files = fake.files.borrow();
        assert!(files["terraform.auto.tfvars"].starts_with("ingress_policies = []\n\negress_policies = ["));
    }

    #[test]
    fn one_failing_perimeter_does_not_stop_others() {
        let fake = FakeTransport {
            fail_clone_for: Some("https://github.com/org/a-config".into()),
            ..FakeTransport::default()
        };
        let report = route(
            &doc(vec![
                rule("a", RuleDirection::Ingress),
                rule("ghost", RuleDirection::Ingress),
                rule("b", RuleDirection::Ingress),
            ]),
            &router(&["a", "b"]),
            &fake,
            request(true),
        );
        assert!(!report.success);
        let statuses: Vec<_> = report
            .pull_requests
            .iter()
            .map(|s| (s.perimeter.as_str(), s.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("a", PrStatus::Error),
                ("ghost", PrStatus::Error),
                ("b", PrStatus::Created),
            ]
        );
        assert!(report.pull_requests[0]
            .error
            .as_deref()
            .unwrap()
            .contains("repository not found"));
        assert_eq!(
            report.pull_requests[1].error.as_deref(),
            Some("perimeter ghost not found in router table")
        );
        let summary = report.summary.unwrap();
        assert_eq!((summary.total_perimeters, summary.failed_prs), (3, 2));
    }

    #[test]
    fn published_checkout_is_removed_afterwards() {
        let fake = FakeTransport::default();
        let report = route(
            &doc(vec![rule("finance", RuleDirection::Ingress)]),
            &router(&["finance"]),
            &fake,
            request(true),
        );
        let clones = fake.clones.borrow();
        assert_eq!(clones.len(), 1);
        assert!(!clones[0].exists());
        assert_eq!(report.pull_requests[0].checkout, None);
    }

    #[test]
    fn prepared_branch_checkout_survives_route() {
        let fake = FakeTransport::default();
        let report = route(
            &doc(vec![rule("finance", RuleDirection::Egress)]),
            &router(&["finance"]),
            &fake,
            request(false),
        );
        let status = &report.pull_requests[0];
        assert_eq!(status.status, PrStatus::ReadyForPr);
        assert_eq!(status.branch.as_deref(), Some("vpcsc/req-42-finance-egress"));

        let clones = fake.clones.borrow();
        assert!(clones[0].exists());
        assert_eq!(status.checkout.as_deref(), Some(clones[0].as_path()));
        assert!(clones[0].join("terraform.auto.tfvars").is_file());

        let json = serde_json::to_value(status).unwrap();
        assert!(json["checkout"].as_str().unwrap().ends_with("repo"));

        std::fs::remove_dir_all(clones[0].parent().unwrap()).unwrap();
    }

    #[test]
    fn missing_repository_and_unsafe_paths_are_errors() {
        let mut no_repo = PerimeterRouterEntry::new(p("norepo"));
        no_repo.repository = None;
        let mut escaping = PerimeterRouterEntry::new(p("escape"));
        escaping.repository = Some("org/escape".into());
        escaping.variables_file_path = "../outside.tfvars".into();
        let table = RouterTable::new([no_repo, escaping], AccessLevelModule::default());

        let fake = FakeTransport::default();
        let report = route(
            &doc(vec![
                rule("norepo", RuleDirection::Ingress),
                rule("escape", RuleDirection::Ingress),
            ]),
            &table,
            &fake,
            request(false),
        );
        assert!(report.pull_requests[0]
            .error
            .as_deref()
            .unwrap()
            .contains("no repository configured"));
        assert!(report.pull_requests[1]
            .error
            .as_deref()
            .unwrap()
            .contains("../outside.tfvars"));
        assert!(fake.calls.borrow().is_empty());
    }

    #[test]
    fn commit_message_names_issue_and_caller() {
        let fake = FakeTransport::default();
        let mut d = doc(vec![rule("finance", RuleDirection::Ingress)]);
        d.request_summary = serde_json::from_value(serde_json::json!({
            "source": {"ip": "8.8.8.8", "isPublic": true, "project": null, "perimeter": null},
            "destination": {"project": null, "perimeter": "finance"},
            "service": "bigquery.googleapis.com",
            "method": "jobservice.insert",
            "serviceAccount": null
        }))
        .unwrap();
        route(&d, &router(&["finance"]), &fake, request(false));
        let commits = fake.commits.borrow();
        assert_eq!(
            commits[0].1,
            "[VPC-SC] Add rules for finance - Issue #42\n\n\
             Service: bigquery.googleapis.com\n\
             Method: jobservice.insert\n\
             Direction: INGRESS\n\
             Caller: 8.8.8.8"
        );
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = RoutingReport::from_statuses(5, Vec::new());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["issueNumber"], 5);
        assert_eq!(json["summary"]["totalPerimeters"], 0);
        assert_eq!(
            serde_json::to_value(PrStatus::ReadyForPr).unwrap(),
            "ready_for_pr"
        );
    }
}
