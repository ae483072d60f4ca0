//! # vpcsc-cli: CLI Tool for VPC-SC Violation Autofix
//!
//! Provides the `vpcsc` command-line interface.
//!
//! ## Subcommands
//!
//! - `vpcsc generate`: Turn one audit-log entry into perimeter rules.
//! - `vpcsc route`: Open one pull request per affected perimeter.
//! - `vpcsc cache`: Build or inspect the project-to-perimeter cache.
//!
//! ```bash
//! vpcsc generate --audit-log-file violation.json --tlm-id TLM-123 --output rules.json
//! vpcsc route --rules-file rules.json --issue-number 42 --output routing.json
//! vpcsc cache build --router-file router.yml
//! ```
//!
//! Every handler returns the process exit code; structured results go to
//! stdout as pretty JSON and logs go to stderr.

pub mod cache;
pub mod generate;
pub mod route;

use std::path::{Path, PathBuf};

use anyhow::Context;

/// Resolve a path that may be relative to the repository root.
///
/// If the path is absolute, returns it as-is. If relative and the file
/// exists relative to `repo_root`, uses that. Otherwise returns the path
/// relative to the current directory.
pub fn resolve_path(path: &Path, repo_root: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let repo_relative = repo_root.join(path);
    if repo_relative.exists() {
        repo_relative
    } else {
        path.to_path_buf()
    }
}

/// Walk up from `start` to the first directory containing a router table.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(vpcsc_router::config::DEFAULT_ROUTER_FILE).is_file())
        .map(Path::to_path_buf)
}

/// Print a result document and, when requested, write it to `output`.
pub fn emit_json<T: serde::Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize result")?;
    if let Some(path) = output {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "result written");
    }
    println!("{json}");
    Ok(())
}
