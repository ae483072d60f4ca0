//! # vpcsc-router: Files, Cache Building, and Dispatch
//!
//! Everything around the pure generation pipeline that touches the outside
//! world:
//!
//! - [`config`] loads the router table, project cache and rules documents.
//! - [`inventory`] builds a project cache from a perimeter inventory.
//! - [`transport`] is the seam to the repository host (`git`, `gh`).
//! - [`dispatch`] routes a rules document to one change per perimeter,
//!   isolating failures per perimeter.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod inventory;
pub mod transport;

pub use dispatch::{route, PerimeterStatus, PrStatus, RouteRequest, RoutingReport};
pub use error::{CacheError, ConfigError, RoutingError, TransportError};
pub use inventory::{build_cache, PerimeterInventory, StaticInventory};
pub use transport::{GitCli, RepoTransport};
