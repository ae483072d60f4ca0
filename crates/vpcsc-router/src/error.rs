//! # Routing Error Types
//!
//! Errors raised around the pipeline: loading configuration files, building
//! the project cache, running external commands, and routing one
//! perimeter's rules. A [`RoutingError`] is always confined to the
//! perimeter it occurred in; dispatch turns it into an `error` status and
//! moves on to the next perimeter.

use std::path::PathBuf;

use thiserror::Error;
use vpcsc_core::PerimeterName;

/// Failure reading or writing a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file could not be written.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The router table is not valid YAML of the expected shape.
    #[error("invalid router table {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// A JSON file (cache or rules document) has an unexpected shape.
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Failure building a project cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The inventory could not list one perimeter's projects.
    #[error("inventory failed for perimeter {perimeter}: {message}")]
    Inventory {
        perimeter: PerimeterName,
        message: String,
    },

    /// No perimeter yielded any project.
    #[error("no projects found for any routed perimeter")]
    Empty,
}

/// Failure of an external command (`git`, `gh`).
#[derive(Error, Debug)]
pub enum TransportError {
    /// The command could not be started.
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    /// The command exited unsuccessfully. `status` is the exit code, or
    /// `signal` when the process was killed.
    #[error("{command} failed (exit {status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Failure routing one perimeter's rules.
#[derive(Error, Debug)]
pub enum RoutingError {
    /// The rules target a perimeter the router table does not know.
    #[error("perimeter {0} not found in router table")]
    UnknownPerimeter(PerimeterName),

    /// The router entry has no repository.
    #[error("no repository configured for perimeter {0}")]
    MissingRepository(PerimeterName),

    /// A configured file path would escape the repository checkout.
    #[error("file path {path} for perimeter {perimeter} must be relative and stay inside the repository")]
    UnsafePath {
        perimeter: PerimeterName,
        path: String,
    },

    /// An external command failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Local file handling in the checkout failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
