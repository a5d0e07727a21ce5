//! Typed, inheritable, self-validating data models.
//!
//! ## Crate layout
//! - `core`: model classes, metadata resolution, validator compilation,
//!   and the instance lifecycle (`parse`, `validate`, `attempt`,
//!   `to_portable`).
//! - `schema`: the structural-validation engine (spec builders, coercion,
//!   defaults, issue reporting).
//!
//! The `prelude` mirrors the surface used by application code declaring
//! and consuming model classes.

pub use tydel_core as core;
pub use tydel_schema as schema;

pub use tydel_core::{Error, props};

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use tydel_core::prelude::*;
}
