//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// One or more steps could not be extracted
    #[error("Check failed: {message}")]
    Check {
        /// Error message
        message: String,
    },

    /// One or more cases failed
    #[error("Test run failed: {message}")]
    TestFailures {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Textwright library error
    #[error("{0}")]
    Textwright(#[from] textwright::TextwrightError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a check error
    #[must_use]
    pub fn check(message: impl Into<String>) -> Self {
        Self::Check {
            message: message.into(),
        }
    }

    /// Create a test failure error
    #[must_use]
    pub fn test_failures(message: impl Into<String>) -> Self {
        Self::TestFailures {
            message: message.into(),
        }
    }
}

impl From<textwright::ValidationError> for CliError {
    fn from(err: textwright::ValidationError) -> Self {
        Self::Textwright(err.into())
    }
}

impl From<textwright::SchemaError> for CliError {
    fn from(err: textwright::SchemaError) -> Self {
        Self::Textwright(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad config");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad config"));
    }

    #[test]
    fn test_check_error() {
        let err = CliError::check("2 step(s) did not parse");
        assert!(err.to_string().starts_with("Check failed"));
    }

    #[test]
    fn test_test_failures_error() {
        let err = CliError::test_failures("1 of 3 cases failed");
        assert!(err.to_string().contains("1 of 3"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O"));
    }

    #[test]
    fn test_library_errors_convert() {
        let err: CliError = textwright::SchemaError::EmptyTests.into();
        assert!(matches!(err, CliError::Textwright(_)));

        let err: CliError = textwright::parse("Press \"Submit\" button.").unwrap_err().into();
        assert!(matches!(err, CliError::Textwright(_)));
    }
}
