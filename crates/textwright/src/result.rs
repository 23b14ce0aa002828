//! Result and error types for Textwright.

use crate::grammar::ValidationError;
use crate::schema::SchemaError;
use thiserror::Error;

/// Result type for Textwright operations
pub type TextwrightResult<T> = Result<T, TextwrightError>;

/// Errors that can occur while parsing or running a test file
#[derive(Debug, Error)]
pub enum TextwrightError {
    /// A sentence could not be turned into a command
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A test file or config file is malformed
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// No visible element matched the command's target
    #[error("No visible {role} named \"{name}\"{}", scope_suffix(.specifier.as_deref()))]
    TargetNotFound {
        /// Canonical role (or attribute selector) that was searched
        role: String,
        /// Accessible name, label or attribute value
        name: String,
        /// Scope qualifier, if any
        specifier: Option<String>,
    },

    /// A value could not be converted to the type an action needs
    #[error("Cannot use \"{value}\" as {expected}")]
    Coercion {
        /// The offending value
        value: String,
        /// What the action expected
        expected: String,
    },

    /// A `{variable}` reference had no stored value
    #[error("Variable \"{name}\" has not been stored")]
    UnknownVariable {
        /// Variable name
        name: String,
    },

    /// The slider never reported the requested value
    #[error("Slider \"{name}\" did not reach {target} after {iterations} moves (last value {last})")]
    SliderDidNotConverge {
        /// Accessible name of the slider
        name: String,
        /// Requested value
        target: i64,
        /// Last realized value
        last: i64,
        /// Number of pointer moves made
        iterations: usize,
    },

    /// An element attribute was missing or unreadable
    #[error("Element \"{name}\" has no readable {attribute}")]
    MissingAttribute {
        /// Element name
        name: String,
        /// Attribute that was read
        attribute: String,
    },

    /// A URL, title or text pattern was not a valid regex
    #[error("Invalid pattern \"{pattern}\": {message}")]
    InvalidPattern {
        /// Pattern source
        pattern: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Timed out after {ms}ms waiting for {what}")]
    Timeout {
        /// What was being waited for
        what: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// The run was cancelled between steps
    #[error("Run cancelled")]
    Cancelled,

    /// The UI backend reported a failure
    #[error("Backend error: {message}")]
    Backend {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TextwrightError {
    /// Create a backend error from any displayable failure
    pub fn backend(message: impl std::fmt::Display) -> Self {
        Self::Backend {
            message: message.to_string(),
        }
    }

    /// Whether retrying the operation may succeed once the page settles
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TargetNotFound { .. } | Self::MissingAttribute { .. }
        )
    }
}

fn scope_suffix(specifier: Option<&str>) -> String {
    specifier.map_or_else(String::new, |s| format!(" on \"{s}\""))
}
