//! # Route: Rules to Pull Requests
//!
//! Reads a rules document and proposes the rules to every affected
//! perimeter's repository. Without a GitHub token the branches are
//! prepared but not pushed.
//!
//! The token is taken from `--github-token`, else `GITHUB_TOKEN`, else
//! `CROSS_REPO_TOKEN`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use vpcsc_router::config::{self, DEFAULT_ROUTER_FILE};
use vpcsc_router::{route, GitCli, RouteRequest};

use crate::{emit_json, resolve_path};

/// Environment variables consulted for a token, in order.
pub const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "CROSS_REPO_TOKEN"];

/// Arguments for `vpcsc route`.
#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Rules document written by `vpcsc generate`.
    #[arg(long)]
    pub rules_file: PathBuf,

    /// Issue the request was filed under.
    #[arg(long)]
    pub issue_number: u64,

    /// Router table (YAML).
    #[arg(long, default_value = DEFAULT_ROUTER_FILE)]
    pub router_file: PathBuf,

    /// Comment attached to each appended policy entry.
    #[arg(long)]
    pub justification: Option<String>,

    /// GitHub token used to push branches and open pull requests.
    #[arg(long)]
    pub github_token: Option<String>,

    /// Also write the routing report here.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Pick the first non-blank token from the flag and then the environment.
pub fn select_token(flag: Option<&str>, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    flag.map(str::to_string)
        .into_iter()
        .chain(TOKEN_VARS.iter().filter_map(|var| lookup(*var)))
        .find(|t| !t.trim().is_empty())
}

/// Execute `vpcsc route`.
pub fn run_route(args: &RouteArgs, repo_root: &Path) -> Result<u8> {
    let rules_path = resolve_path(&args.rules_file, repo_root);
    let doc = config::load_rules_document(&rules_path)
        .with_context(|| format!("failed to load rules {}", rules_path.display()))?;
    let router_path = resolve_path(&args.router_file, repo_root);
    let router = config::load_router(&router_path)
        .with_context(|| format!("failed to load router table {}", router_path.display()))?;

    let token = select_token(args.github_token.as_deref(), |var| std::env::var(var).ok());
    if token.is_none() {
        tracing::warn!(
            "no GitHub token; set GITHUB_TOKEN or CROSS_REPO_TOKEN to push branches and open PRs"
        );
    }
    let publish = token.is_some();
    let transport = GitCli::new(token);

    let report = route(
        &doc,
        &router,
        &transport,
        RouteRequest {
            issue_number: args.issue_number,
            justification: args.justification.as_deref(),
            publish,
        },
    );
    emit_json(&report, args.output.as_deref())?;

    Ok(if report.success { 0 } else { 1 })
}
