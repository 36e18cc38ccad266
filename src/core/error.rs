//! Error types for the logging core

use std::time::Duration;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Required options missing or invalid when configuring a component
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// The sink behind an appender rejected or failed a write
    #[error("Write to appender '{appender}' failed: {message}")]
    AppenderWrite { appender: String, message: String },

    /// A write was attempted after the appender began shutting down
    #[error("Appender '{appender}' is closed")]
    AppenderClosed { appender: String },

    /// An appender panicked while accepting an event
    #[error("Appender '{appender}' panicked: {message}")]
    AppenderPanicked { appender: String, message: String },

    /// An appender reported a failure through its shutdown completion
    #[error("Shutdown of appender '{appender}' failed: {message}")]
    AppenderShutdown { appender: String, message: String },

    /// Some appenders never signalled shutdown completion
    ///
    /// `failures` holds errors from appenders that did finish before the
    /// deadline.
    #[error("Shutdown timed out after {timeout:?} waiting for: {}", .pending.join(", "))]
    ShutdownTimeout {
        timeout: Duration,
        pending: Vec<String>,
        failures: Vec<LoggerError>,
    },

    /// Every ticket retired but at least one appender reported a failure
    #[error("Shutdown completed with {} failed appender(s)", .failures.len())]
    ShutdownFailed { failures: Vec<LoggerError> },

    /// Shutdown requested while another shutdown is still in progress
    #[error("Shutdown already in progress")]
    AlreadyShuttingDown,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn appender_write(appender: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::AppenderWrite {
            appender: appender.into(),
            message: message.into(),
        }
    }

    pub fn appender_closed(appender: impl Into<String>) -> Self {
        LoggerError::AppenderClosed {
            appender: appender.into(),
        }
    }

    pub fn appender_panicked(appender: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::AppenderPanicked {
            appender: appender.into(),
            message: message.into(),
        }
    }

    pub fn appender_shutdown(appender: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::AppenderShutdown {
            appender: appender.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether this error means the appender no longer accepts writes
    pub fn is_closed(&self) -> bool {
        matches!(self, LoggerError::AppenderClosed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::config("network-sink", "missing field `token`");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::appender_closed("console");
        assert!(err.is_closed());

        let err = LoggerError::appender_write("loggly", "HTTP 503");
        assert!(!err.is_closed());
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::ShutdownTimeout {
            timeout: Duration::from_millis(250),
            pending: vec!["loggly".to_string(), "file".to_string()],
            failures: Vec::new(),
        };
        assert_eq!(
            err.to_string(),
            "Shutdown timed out after 250ms waiting for: loggly, file"
        );

        let err = LoggerError::ShutdownFailed {
            failures: vec![LoggerError::appender_shutdown("file", "disk full")],
        };
        assert_eq!(err.to_string(), "Shutdown completed with 1 failed appender(s)");

        let err = LoggerError::config("pattern layout", "unknown conversion '%q'");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for pattern layout: unknown conversion '%q'"
        );
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("opening log file", "cannot open app.log", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("opening log file"));
        assert!(err.to_string().contains("cannot open app.log"));
    }
}
