//! Error types for the Prism contract layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Boxed error type used for handler failures crossing the dispatch boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A single validation issue reported by a schema.
///
/// Issues keep the order the validator produced them in. `path` points at the
/// offending field when the validator knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Human-readable description of what failed
    pub message: String,
    /// Location of the failure within the input, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Issue {
    /// Create an issue with no path.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    /// Create an issue located at a field path.
    pub fn at(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

/// Input failed its schema check.
///
/// Carries the full ordered issue list. The display form is the serialized
/// issue list, which is the externally observable error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<Issue>,
}

impl ValidationError {
    /// Build from a validator's issue list.
    ///
    /// An empty list is upgraded to a single generic issue so the invariant
    /// "failure carries a non-empty issue list" holds for sloppy validators.
    pub fn new(issues: Vec<Issue>) -> Self {
        let issues = if issues.is_empty() {
            vec![Issue::new("input rejected")]
        } else {
            issues
        };
        Self { issues }
    }

    /// The ordered issues reported by the validator.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.issues) {
            Ok(serialized) => write!(f, "{serialized}"),
            Err(_) => write!(f, "validation failed with {} issue(s)", self.issues.len()),
        }
    }
}

impl std::error::Error for ValidationError {}

/// All possible errors from the dispatch layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Input failed schema validation. Surfaced to the immediate caller,
    /// never retried, never swallowed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Dispatch against a mutation name nothing registered.
    #[error("Unknown mutation: {0}")]
    UnknownMutation(String),

    /// Dispatch against a query name nothing registered.
    #[error("Unknown query: {0}")]
    UnknownQuery(String),

    /// An error raised by a registered handler, forwarded as-is.
    #[error(transparent)]
    Handler(BoxError),
}

impl Error {
    /// Wrap a handler-raised error without changing its display or source.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Error::Handler(err.into())
    }
}

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mutation_message() {
        let err = Error::UnknownMutation("createUser".into());
        assert_eq!(err.to_string(), "Unknown mutation: createUser");

        let err = Error::UnknownQuery("getUser".into());
        assert_eq!(err.to_string(), "Unknown query: getUser");
    }

    #[test]
    fn validation_error_serializes_issues() {
        let err = ValidationError::new(vec![
            Issue::at("name", "expected String, got Int"),
            Issue::new("payload must be an object"),
        ]);

        let text = err.to_string();
        assert_eq!(
            text,
            r#"[{"message":"expected String, got Int","path":"name"},{"message":"payload must be an object"}]"#
        );
    }

    #[test]
    fn empty_issue_list_upgraded() {
        let err = ValidationError::new(Vec::new());
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].message, "input rejected");
    }

    #[test]
    fn handler_error_display_preserved() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = Error::handler(inner);
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn issue_order_preserved() {
        let issues = vec![
            Issue::at("a", "first"),
            Issue::at("b", "second"),
            Issue::at("c", "third"),
        ];
        let err = ValidationError::new(issues.clone());
        assert_eq!(err.issues(), issues.as_slice());
    }
}
