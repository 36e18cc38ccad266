//! # Rust Log Dispatch
//!
//! Category-routed logging with pluggable appenders and coordinated shutdown.
//!
//! Events logged under a category are rendered by each bound appender's
//! layout and handed to the appender synchronously. Appenders may finish
//! their I/O later; [`LoggingSystem::shutdown`] waits until every distinct
//! appender reports that its in-flight writes have drained.
//!
//! ## Features
//!
//! - **Category routing**: ordered appender lists per category with a
//!   `default` fallback
//! - **Layouts**: pass-through, basic, coloured, JSON and conversion patterns
//! - **Appenders**: console, file, closures and a network-sink adapter
//! - **Coordinated shutdown**: one ticket per distinct appender, bounded by a
//!   timeout
//!
//! ```
//! use rust_log_dispatch::prelude::*;
//! use std::sync::Arc;
//!
//! let system = LoggingSystem::new();
//! system.add_appender(Arc::new(FnAppender::new("stdout", |rendered| {
//!     println!("{}", rendered);
//!     Ok(())
//! })));
//!
//! let logger = system.get_logger("cheese");
//! rust_log_dispatch::info!(logger, "Gouda", { "age": 3 });
//!
//! system.shutdown(|result| assert!(result.is_ok()));
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

#[doc(hidden)]
pub use serde_json;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::appenders::ConsoleAppender;
    #[cfg(feature = "file")]
    pub use crate::appenders::FileAppender;
    pub use crate::appenders::{AppenderFactories, FnAppender, NetworkSinkAppender};
    pub use crate::core::{
        Appender, Completion, DispatchReport, LayoutConfig, LogEvent, LogLevel, Logger,
        LoggerError, LoggerMetrics, LoggingSystem, Rendered, Result, SharedAppender,
        TimestampFormat, DEFAULT_CATEGORY, DEFAULT_SHUTDOWN_TIMEOUT,
    };
}

#[cfg(feature = "console")]
pub use appenders::ConsoleAppender;
#[cfg(feature = "file")]
pub use appenders::FileAppender;
pub use appenders::FnAppender;
pub use core::logger::{add_appender, clear_appenders, get_logger, shutdown};
pub use core::{
    default_system, Appender, Completion, DispatchReport, LogEvent, LogLevel, Logger,
    LoggerError, LoggerMetrics, LoggingSystem, LoggingSystemBuilder, Result, SharedAppender,
    DEFAULT_CATEGORY, DEFAULT_SHUTDOWN_TIMEOUT,
};
