//! Error types for flakewatch.

use thiserror::Error;

/// Main error type for the orchestrator.
#[derive(Error, Debug)]
pub enum WatchError {
    /// The external tool could not be started at all
    #[error("Failed to start `{command}`: {detail}")]
    Spawn { command: String, detail: String },

    /// The external tool did not finish within the configured timeout
    #[error("Command did not complete within timeout of {seconds} seconds")]
    Timeout { seconds: u64 },

    /// A second invocation was submitted while one is outstanding
    #[error("An invocation is already active for this sink")]
    InvocationActive,

    /// An invocation was constructed without any target paths
    #[error("Invocation requires at least one target path")]
    EmptyTargets,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, WatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_display() {
        let err = WatchError::Spawn {
            command: "flake8".to_string(),
            detail: "No such file or directory".to_string(),
        };
        assert!(err.to_string().contains("flake8"));
        assert!(err.to_string().contains("No such file"));
    }

    #[test]
    fn test_timeout_error_display() {
        let err = WatchError::Timeout { seconds: 10 };
        assert!(err.to_string().contains("10 seconds"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: WatchError = io.into();
        assert!(matches!(err, WatchError::Io(_)));
    }
}
