//! # vpcsc-extract: Audit Log Extraction
//!
//! Normalizes a perimeter-violation audit log into a
//! [`ViolationRecord`](vpcsc_core::ViolationRecord).
//!
//! Audit logs arrive in at least two shapes: the current schema, with nested
//! `ingressFrom` / `ingressTo` / `egressTo` descriptions and a
//! `servicePerimeter` field, and a legacy schema with a flat
//! `targetResource` string and `securityPolicyInfo.servicePerimeterName`.
//! Extraction never branches on "which schema is this". Instead every field
//! has an ordered list of strategies and the first one that finds a value
//! wins, so schema drift degrades to a missing field rather than a failure.
//!
//! ## Modules
//!
//! - [`envelope`]: JSON parsing and the `protoPayload` requirement.
//! - [`patterns`]: `projects/<number>` and `servicePerimeters/<name>` scanners.
//! - [`strategies`]: per-field strategy lists.
//! - [`extract`](mod@extract): record assembly and heuristics.

pub mod envelope;
pub mod extract;
pub mod patterns;
pub mod strategies;

pub use extract::{extract, extract_value};
