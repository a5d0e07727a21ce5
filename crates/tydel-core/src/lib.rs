//! Model runtime: runtime class objects with declared fields, inheritance-
//! merged metadata, compiled structural validators, and the instance
//! lifecycle (`parse`, `validate`, `attempt`, `to_portable`).
//!
//! Classes are defined once through [`model::ClassBuilder`] and frozen;
//! metadata resolution and validator compilation are memoized per class
//! for the lifetime of the process.

#[macro_use]
mod macros;

mod compile;

pub mod error;
pub mod instance;
pub mod metadata;
pub mod model;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use error::Error;

///
/// Prelude
/// Domain vocabulary only; errors stay one level down.
///

pub mod prelude {
    pub use crate::{
        instance::{FieldValue, Instance, ParseOptions, Props, ValidateOptions},
        metadata::Metadata,
        model::{ClassBuilder, FieldDecl, FieldType, ModelClass, ModelTarget, Reference},
    };
    pub use tydel_schema::prelude::*;
}
