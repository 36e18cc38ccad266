//! Logging macros for building payloads inline.
//!
//! Each argument becomes one payload element through `serde_json::json!`,
//! so object and array literals can be written directly. An argument must be
//! a single token tree: wrap compound expressions in parentheses.
//!
//! # Examples
//!
//! ```
//! use rust_log_dispatch::prelude::*;
//! use rust_log_dispatch::{info, warn};
//!
//! let system = LoggingSystem::new();
//! let logger = system.get_logger("http");
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // Several payload elements
//! let port = 8080;
//! info!(logger, "listening on", port);
//!
//! // Object literals and compound expressions
//! let retries = 2;
//! warn!(logger, "upstream slow", { "retries": retries }, (retries * 100));
//! ```

/// Log payload elements at a given level.
///
/// Expands to [`Logger::log`](crate::Logger::log) and evaluates to its
/// [`DispatchReport`](crate::DispatchReport).
///
/// # Examples
///
/// ```
/// # use rust_log_dispatch::prelude::*;
/// # let logger = LoggingSystem::new().get_logger("app");
/// use rust_log_dispatch::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code:", 500, { "tags": ["http"] });
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt),+ $(,)?) => {
        $logger.log($level, vec![$($crate::serde_json::json!($arg)),+])
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt),+ $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg),+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt),+ $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg),+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_dispatch::prelude::*;
/// # let logger = LoggingSystem::new().get_logger("app");
/// use rust_log_dispatch::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing", 100, "items");
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt),+ $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg),+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt),+ $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg),+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt),+ $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg),+)
    };
}

/// Log a fatal-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_dispatch::prelude::*;
/// # let logger = LoggingSystem::new().get_logger("app");
/// use rust_log_dispatch::fatal;
/// fatal!(logger, "Critical system failure:", { "component": "db" });
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt),+ $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg),+)
    };
}
