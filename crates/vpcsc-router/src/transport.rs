//! # Repository Transport
//!
//! The side-effecting half of routing: cloning a perimeter repository,
//! committing the merged files on a branch, pushing, and opening a pull
//! request. [`RepoTransport`] is the seam; dispatch depends only on the
//! trait, and tests drive it with a recording fake.
//!
//! [`GitCli`] shells out to `git` and `gh`. Every command targets the
//! checkout explicitly (`git -C <dir>`); the process working directory is
//! never changed. A token, when present, is embedded in the remote URL and
//! scrubbed from any error text before it is returned.

use std::path::Path;
use std::process::Command;

use crate::error::TransportError;

/// Author identity for automation commits.
pub const COMMIT_EMAIL: &str = "vpc-sc-automation@example.com";
pub const COMMIT_NAME: &str = "VPC SC Automation";

/// Operations dispatch needs from a repository host.
pub trait RepoTransport {
    /// Shallow-clone `url` into `dest` (which must not exist yet).
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), TransportError>;

    /// Create and check out `branch` in the checkout at `repo`.
    fn create_branch(&self, repo: &Path, branch: &str) -> Result<(), TransportError>;

    /// Stage `files` (relative to `repo`) and commit them.
    fn commit(&self, repo: &Path, files: &[&str], message: &str) -> Result<(), TransportError>;

    /// Push `branch` to the repository at `url`.
    fn push(&self, repo: &Path, url: &str, branch: &str) -> Result<(), TransportError>;

    /// Open a pull request for `branch`; returns its URL.
    fn open_pull_request(
        &self,
        url: &str,
        branch: &str,
        title: &str,
        body: &str,
    ) -> Result<String, TransportError>;
}

/// `owner/name` of a GitHub repository URL.
pub fn repo_slug(url: &str) -> Option<String> {
    let rest = url
        .trim()
        .strip_prefix("https://github.com/")
        .or_else(|| url.trim().strip_prefix("http://github.com/"))?;
    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);
    let mut parts = rest.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
            Some(format!("{owner}/{name}"))
        }
        _ => None,
    }
}

/// Transport over the `git` and `gh` command-line tools.
#[derive(Clone, Default)]
pub struct GitCli {
    token: Option<String>,
}

impl std::fmt::Debug for GitCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitCli")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl GitCli {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Remote URL carrying the token for GitHub repositories.
    fn remote(&self, url: &str) -> String {
        match (&self.token, repo_slug(url)) {
            (Some(token), Some(slug)) => format!("https://{token}@github.com/{slug}.git"),
            _ => url.to_string(),
        }
    }

    fn scrub(&self, text: &str) -> String {
        match &self.token {
            Some(token) => text.replace(token.as_str(), "***"),
            None => text.to_string(),
        }
    }

    fn run(&self, label: &str, command: &mut Command) -> Result<String, TransportError> {
        tracing::debug!(command = label, "running");
        let output = command.output().map_err(|source| TransportError::Spawn {
            command: label.to_string(),
            source,
        })?;
        if !output.status.success() {
            let status = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Err(TransportError::Failed {
                command: label.to_string(),
                status,
                stderr: self.scrub(String::from_utf8_lossy(&output.stderr).trim()),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn git(repo: &Path) -> Command {
        let mut command = Command::new("git");
        command.arg("-C").arg(repo);
        command
    }
}

impl RepoTransport for GitCli {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), TransportError> {
        self.run(
            "git clone",
            Command::new("git")
                .args(["clone", "--depth", "1", self.remote(url).as_str()])
                .arg(dest),
        )
        .map(drop)
    }

    fn create_branch(&self, repo: &Path, branch: &str) -> Result<(), TransportError> {
        self.run("git checkout", Self::git(repo).args(["checkout", "-b", branch]))
            .map(drop)
    }

    fn commit(&self, repo: &Path, files: &[&str], message: &str) -> Result<(), TransportError> {
        self.run("git add", Self::git(repo).arg("add").arg("--").args(files))?;
        self.run(
            "git commit",
            Self::git(repo)
                .arg("-c")
                .arg(format!("user.email={COMMIT_EMAIL}"))
                .arg("-c")
                .arg(format!("user.name={COMMIT_NAME}"))
                .args(["commit", "-m", message]),
        )
        .map(drop)
    }

    fn push(&self, repo: &Path, url: &str, branch: &str) -> Result<(), TransportError> {
        self.run(
            "git push",
            Self::git(repo).args(["push", self.remote(url).as_str(), branch]),
        )
        .map(drop)
    }

    fn open_pull_request(
        &self,
        url: &str,
        branch: &str,
        title: &str,
        body: &str,
    ) -> Result<String, TransportError> {
        let repo = repo_slug(url).unwrap_or_else(|| url.to_string());
        let mut command = Command::new("gh");
        command.args([
            "pr", "create", "--repo", repo.as_str(), "--head", branch, "--title", title, "--body", body,
        ]);
        if let Some(token) = &self.token {
            command.env("GH_TOKEN", token);
        }
        self.run("gh pr create", &mut command)
    }
}
