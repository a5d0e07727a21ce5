//! Structural-validation engine: spec builders, coercion, defaults, and
//! issue reporting over the portable [`Value`](value::Value) data model.
//!
//! This crate knows nothing about model classes or inheritance; it only
//! builds validators from field mappings and runs them. The model runtime
//! (`tydel-core`) treats it as an opaque capability.

pub mod report;
pub mod spec;
pub mod value;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        report::{Issue, ValidationError},
        spec::{Spec, SpecFactory, SpecOptions, Validation},
        value::{Map, Value},
    };
    pub use serde::Serialize;
}
