//! # vpcsc-core: Foundational Types for VPC-SC Autofix
//!
//! This crate is the leaf of the workspace. It defines the value types that
//! flow through the violation-to-rule pipeline and the lookup tables the
//! pipeline reads. Every other crate depends on `vpcsc-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `ProjectNumber`, `PerimeterName`
//!    and `JustificationToken` validate at construction. A textual project ID
//!    can never reach ownership resolution.
//!
//! 2. **Decisions carry their invariants.** `DirectionDecision` and
//!    `TlmDecision` are only constructible through functions that uphold
//!    "skip reason iff SKIP" and "required implies reason".
//!
//! 3. **One router table.** Perimeter → repository/file lookups go through
//!    [`RouterTable`] and nowhere else.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `vpcsc-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod cache;
pub mod decision;
pub mod error;
pub mod identity;
pub mod network;
pub mod routing;
pub mod rule;
pub mod violation;

// Re-export primary types for ergonomic imports.
pub use cache::ProjectCache;
pub use decision::{Direction, DirectionDecision, SkipReason, TlmDecision, TlmTrigger};
pub use error::{ExtractError, SynthesisError, ValidationError, VpcscError};
pub use identity::{JustificationToken, PerimeterName, ProjectNumber};
pub use network::is_public_ip;
pub use routing::{AccessLevelModule, PerimeterRouterEntry, RouterTable};
pub use rule::{OperationSpec, Rule, RuleDirection, RuleFrom, RuleSources, RuleTo};
pub use violation::{ReviewNote, ViolationRecord, ViolationType};
