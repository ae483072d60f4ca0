//! # vpcsc-policy: Violation-to-Rule Decisions
//!
//! Everything between an extracted violation record and a list of rules:
//!
//! - **Ownership** (`ownership.rs`): project number → owning perimeter,
//!   cache first, then the router table's static project lists.
//!
//! - **Direction** (`direction.rs`): the exhaustive source/destination
//!   decision table.
//!
//! - **TLM** (`tlm.rs`): whether a justification token is mandatory.
//!
//! - **Synthesis** (`synthesize.rs`): ingress/egress rule construction.
//!
//! - **Pipeline** (`pipeline.rs`): end-to-end generation and the result
//!   documents.
//!
//! ## Crate Policy
//!
//! - Every function here is pure over its inputs. No I/O, no clocks, no
//!   environment access.
//! - Unresolved ownership is a value (`None`), never an error.

pub mod direction;
pub mod ownership;
pub mod pipeline;
pub mod synthesize;
pub mod tlm;

pub use direction::classify;
pub use ownership::{resolve_owner, OwnershipResolver};
pub use pipeline::{
    generate, generate_for_record, FailureReport, Generation, GenerationContext, GenerationReport,
    RequestSummary, RulesDocument,
};
pub use synthesize::synthesize;
pub use tlm::validate;
