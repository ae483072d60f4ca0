//! # Cache: Project-to-Perimeter Snapshot
//!
//! `vpcsc cache build` writes a project cache from the router table's
//! static project lists. `vpcsc cache show` summarizes an existing cache.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};

use vpcsc_core::ProjectCache;
use vpcsc_router::config::{self, DEFAULT_CACHE_FILE, DEFAULT_ROUTER_FILE};
use vpcsc_router::inventory::{build_cache, StaticInventory, STATIC_SOURCE};

use crate::resolve_path;

/// Note stored in caches built from static lists.
pub const STATIC_NOTE: &str = "Built from static project lists in the router table";

/// Cache subcommand arguments.
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

/// Available cache subcommands.
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Build the cache from the router table.
    Build {
        /// Router table (YAML).
        #[arg(long, default_value = DEFAULT_ROUTER_FILE)]
        router_file: PathBuf,

        /// Where to write the cache.
        #[arg(long, default_value = DEFAULT_CACHE_FILE)]
        output: PathBuf,
    },

    /// Summarize an existing cache.
    Show {
        /// Project cache (JSON).
        #[arg(long, default_value = DEFAULT_CACHE_FILE)]
        project_cache: PathBuf,
    },
}

/// Execute the cache subcommand.
pub fn run_cache(args: &CacheArgs, repo_root: &Path) -> Result<u8> {
    match &args.command {
        CacheCommand::Build {
            router_file,
            output,
        } => run_build(router_file, output, repo_root),
        CacheCommand::Show { project_cache } => run_show(project_cache, repo_root),
    }
}

fn run_build(router_file: &Path, output: &Path, repo_root: &Path) -> Result<u8> {
    let router_path = resolve_path(router_file, repo_root);
    let router = config::load_router(&router_path)
        .with_context(|| format!("failed to load router table {}", router_path.display()))?;

    let mut cache = build_cache(
        &router,
        &StaticInventory::new(&router),
        STATIC_SOURCE,
        Utc::now(),
    )
    .context("failed to build project cache")?;
    cache.note = Some(STATIC_NOTE.to_string());

    let output = if output.is_absolute() {
        output.to_path_buf()
    } else {
        repo_root.join(output)
    };
    config::save_cache(&output, &cache)
        .with_context(|| format!("failed to save project cache {}", output.display()))?;

    println!("Wrote {} project(s) to {}", cache.len(), output.display());
    print_counts(&cache);
    Ok(0)
}

fn run_show(project_cache: &Path, repo_root: &Path) -> Result<u8> {
    let path = resolve_path(project_cache, repo_root);
    let cache = config::load_cache(&path)
        .with_context(|| format!("failed to load project cache {}", path.display()))?;

    println!("Cache: {}", path.display());
    println!(
        "Last updated: {}",
        cache.last_updated.as_deref().unwrap_or("unknown")
    );
    println!(
        "Source: {}",
        cache.cache_source.as_deref().unwrap_or("unknown")
    );
    if let Some(note) = &cache.note {
        println!("Note: {note}");
    }
    println!("Projects: {}", cache.len());
    print_counts(&cache);
    Ok(0)
}

fn print_counts(cache: &ProjectCache) {
    for (perimeter, count) in cache.perimeter_counts() {
        println!("  {perimeter:<30} {count}");
    }
}
