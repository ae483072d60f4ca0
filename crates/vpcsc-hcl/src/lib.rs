//! # vpcsc-hcl: Configuration Rendering and Merge
//!
//! Renders synthesized rules as Terraform configuration and appends them to
//! existing perimeter files.
//!
//! Serialization and merging are separate steps. [`value`] turns a typed
//! value model into text with deterministic quoting and indentation;
//! [`merge`] decides *where* that text goes and guarantees prior content is
//! kept as a prefix of the result.

pub mod access_level;
pub mod merge;
pub mod value;

pub use access_level::access_level_block;
pub use merge::{merge_access_levels, merge_policies, policy_entry};
pub use value::{Block, HclValue};
