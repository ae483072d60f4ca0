//! # vpcsc CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vpcsc_cli::cache::{run_cache, CacheArgs};
use vpcsc_cli::generate::{run_generate, GenerateArgs};
use vpcsc_cli::route::{run_route, RouteArgs};

/// VPC Service Controls violation autofix.
///
/// Turns a denied-request audit log into perimeter ingress/egress rules and
/// proposes them as pull requests against each perimeter's configuration
/// repository.
#[derive(Parser, Debug)]
#[command(name = "vpcsc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate perimeter rules from one audit-log entry.
    Generate(GenerateArgs),

    /// Route generated rules to perimeter repositories as pull requests.
    Route(RouteArgs),

    /// Build or inspect the project-to-perimeter cache.
    Cache(CacheArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let repo_root = vpcsc_cli::find_repo_root(&cwd).unwrap_or_else(|| {
        tracing::debug!("no router table above the current directory; using it as root");
        cwd.clone()
    });
    tracing::debug!(repo_root = %repo_root.display(), "resolved repository root");

    let result = match cli.command {
        Commands::Generate(args) => run_generate(&args, &repo_root),
        Commands::Route(args) => run_route(&args, &repo_root),
        Commands::Cache(args) => run_cache(&args, &repo_root),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
