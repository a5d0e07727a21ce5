use serde::Serialize;
use std::fmt;
use thiserror::Error as ThisError;

///
/// Issue
/// One validation finding, addressed by a dotted path from the root of
/// the validated value (empty path = the root itself).
///

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub path: String,
    pub message: String,
}

impl Issue {
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

///
/// ValidationError
///
/// Validation is non-failing at the traversal level; every issue found is
/// collected here and returned to the caller, which chooses how to
/// interpret them.
///

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
#[error("validation failed: {}", render(.issues))]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl ValidationError {
    #[must_use]
    pub const fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    /// Issues whose path starts at `field` (the field itself or below it).
    #[must_use]
    pub fn issues_under(&self, field: &str) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|i| i.path == field || i.path.starts_with(&format!("{field}.")))
            .collect()
    }
}

fn render(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Join a parent path with a child segment.
#[must_use]
pub(crate) fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}
