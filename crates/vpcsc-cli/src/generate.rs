//! # Generate: Audit Log to Rules
//!
//! Runs the generation pipeline on one audit-log entry and writes the
//! result document. Exit code 0 means rules were produced; 2 means an
//! error document was written (malformed input, justification required,
//! or nothing to generate).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use vpcsc_core::JustificationToken;
use vpcsc_policy::{generate, GenerationContext};
use vpcsc_router::config::{self, DEFAULT_CACHE_FILE, DEFAULT_ROUTER_FILE};

use crate::{emit_json, resolve_path};

/// Exit code when an error document was produced.
pub const EXIT_NO_RULES: u8 = 2;

/// Arguments for `vpcsc generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Audit log entry as a JSON string.
    #[arg(long, conflicts_with = "audit_log_file", required_unless_present = "audit_log_file")]
    pub audit_log_json: Option<String>,

    /// File holding the audit log entry.
    #[arg(long)]
    pub audit_log_file: Option<PathBuf>,

    /// Router table (YAML).
    #[arg(long, default_value = DEFAULT_ROUTER_FILE)]
    pub router_file: PathBuf,

    /// Project-to-perimeter cache (JSON).
    #[arg(long, default_value = DEFAULT_CACHE_FILE)]
    pub project_cache: PathBuf,

    /// Justification token (TLM ID) for public-internet or third-party access.
    #[arg(long)]
    pub tlm_id: Option<String>,

    /// Also write the result document here.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Execute `vpcsc generate`.
pub fn run_generate(args: &GenerateArgs, repo_root: &Path) -> Result<u8> {
    let raw = match (&args.audit_log_json, &args.audit_log_file) {
        (Some(json), _) => json.clone(),
        (None, Some(path)) => {
            let path = resolve_path(path, repo_root);
            std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read audit log {}", path.display()))?
        }
        (None, None) => anyhow::bail!("one of --audit-log-json or --audit-log-file is required"),
    };

    let router_path = resolve_path(&args.router_file, repo_root);
    let router = config::load_router_or_default(&router_path)
        .with_context(|| format!("failed to load router table {}", router_path.display()))?;
    let cache_path = resolve_path(&args.project_cache, repo_root);
    let cache = config::load_cache_or_default(&cache_path)
        .with_context(|| format!("failed to load project cache {}", cache_path.display()))?;

    let token = args
        .tlm_id
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(JustificationToken::new)
        .transpose()
        .context("invalid --tlm-id")?;

    tracing::debug!(
        perimeters = router.len(),
        cached_projects = cache.len(),
        tlm_id = token.is_some(),
        "generation inputs loaded"
    );

    let generation = generate(
        &raw,
        GenerationContext {
            cache: &cache,
            router: &router,
            token: token.as_ref(),
        },
    );
    emit_json(&generation, args.output.as_deref())?;

    if generation.is_success() {
        tracing::info!(rules = generation.rules().len(), "rules generated");
        Ok(0)
    } else {
        Ok(EXIT_NO_RULES)
    }
}
