use thiserror::Error as ThisError;
use tydel_schema::report::ValidationError;

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Declare(#[from] DeclareError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Validate(#[from] ValidateError),
}

///
/// DeclareError
/// Malformed declarations are programmer errors and fail at class build
/// time, before any instance exists.
///

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum DeclareError {
    #[error("field `{field}` is declared twice on `{class}`")]
    DuplicateField { class: String, field: String },

    #[error("a model named `{name}` is already registered")]
    DuplicateModel { name: String },
}

///
/// CompileError
/// Clone so the per-class cache can replay the same failure
/// deterministically on every `validator()` call.
///

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CompileError {
    #[error("circular model reference: {}", .path.join(" -> "))]
    CircularReference { path: Vec<String> },

    #[error("field `{field}` on `{class}` references unknown model `{model}`")]
    UnknownModel {
        class: String,
        field: String,
        model: String,
    },
}

///
/// ValidateError
/// Only surfaced when the caller opted into throwing (`raise` or
/// `attempt`), or when the validator itself cannot be compiled.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum ValidateError {
    #[error("validation raised: {0}")]
    Raised(ValidationError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}
