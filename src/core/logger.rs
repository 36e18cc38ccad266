//! Logging system and per-category loggers

use super::{
    appender::{Completion, SharedAppender},
    error::Result,
    layout::Rendered,
    log_event::LogEvent,
    log_level::LogLevel,
    metrics::LoggerMetrics,
    registry::{DispatchReport, Registry, DEFAULT_CATEGORY},
    shutdown::{ShutdownCoordinator, DEFAULT_SHUTDOWN_TIMEOUT},
};
use crate::appenders::FnAppender;
use serde_json::{Map, Value};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Owns the category registry and coordinates shutdown of its appenders
///
/// # Example
///
/// ```
/// use rust_log_dispatch::appenders::FnAppender;
/// use rust_log_dispatch::LoggingSystem;
/// use std::sync::Arc;
///
/// let system = LoggingSystem::new();
/// system.add_appender(Arc::new(FnAppender::new("stdout", |rendered| {
///     println!("{}", rendered);
///     Ok(())
/// })));
///
/// let logger = system.get_logger("http");
/// logger.info("listening on 8080");
///
/// system.shutdown_blocking().unwrap();
/// ```
#[derive(Debug)]
pub struct LoggingSystem {
    registry: Arc<Registry>,
    coordinator: ShutdownCoordinator,
}

impl LoggingSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::with_shutdown_timeout(DEFAULT_SHUTDOWN_TIMEOUT)
    }

    #[must_use]
    pub fn with_shutdown_timeout(timeout: Duration) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            coordinator: ShutdownCoordinator::new(timeout),
        }
    }

    #[must_use]
    pub fn builder() -> LoggingSystemBuilder {
        LoggingSystemBuilder::new()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        self.registry.metrics()
    }

    /// Logger for `category`; cheap, and every logger shares this registry
    pub fn get_logger(&self, category: impl Into<String>) -> Logger {
        Logger {
            category: category.into(),
            registry: Arc::clone(&self.registry),
        }
    }

    /// Bind `appender` to the default category
    pub fn add_appender(&self, appender: SharedAppender) {
        self.registry.register(DEFAULT_CATEGORY, appender);
    }

    pub fn add_appender_to(&self, category: impl Into<String>, appender: SharedAppender) {
        self.registry.register(category, appender);
    }

    /// Bind a write closure and a shutdown hook to `category`
    ///
    /// The hook receives the shutdown [`Completion`] and must signal it once
    /// the sink behind `write` has drained.
    pub fn add_fn_appender<W, S>(&self, category: &str, write: W, shutdown: S) -> SharedAppender
    where
        W: Fn(Rendered) -> Result<()> + Send + Sync + 'static,
        S: FnOnce(Completion) + Send + 'static,
    {
        let appender: SharedAppender =
            Arc::new(FnAppender::new(format!("fn:{}", category), write).on_shutdown(shutdown));
        self.registry.register(category, Arc::clone(&appender));
        appender
    }

    /// Drop every binding; appenders are not shut down
    pub fn clear_appenders(&self) {
        self.registry.clear();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.coordinator.is_shutting_down()
    }

    /// Shut down every distinct bound appender, then call `on_all_done`
    ///
    /// Appenders stay bound and reject writes afterwards. See
    /// [`ShutdownCoordinator::shutdown_with`] for the outcomes.
    pub fn shutdown<F>(&self, on_all_done: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.coordinator
            .shutdown_with(&self.registry.appenders(), on_all_done);
    }

    /// Shut down and wait for the outcome
    pub fn shutdown_blocking(&self) -> Result<()> {
        self.coordinator.shutdown(&self.registry.appenders())
    }

    /// Shut down without blocking the async runtime
    ///
    /// # Example
    ///
    /// ```
    /// # tokio_test::block_on(async {
    /// use rust_log_dispatch::LoggingSystem;
    ///
    /// let system = LoggingSystem::new();
    /// system.shutdown_async().await.unwrap();
    /// # });
    /// ```
    #[cfg(feature = "async-shutdown")]
    pub async fn shutdown_async(&self) -> Result<()> {
        let (sender, receiver) = tokio::sync::oneshot::channel();
        self.shutdown(move |result| {
            let _ = sender.send(result);
        });
        receiver.await.unwrap_or_else(|_| {
            Err(super::error::LoggerError::other(
                "shutdown finished without reporting an outcome",
            ))
        })
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for logging under one category
///
/// Each call builds a [`LogEvent`] and dispatches it synchronously. The
/// returned [`DispatchReport`] tells which appenders accepted it; appender
/// errors never panic the caller.
#[derive(Debug, Clone)]
pub struct Logger {
    category: String,
    registry: Arc<Registry>,
}

impl Logger {
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn level(&self) -> LogLevel {
        self.registry.level_for(&self.category)
    }

    /// Minimum level for this logger's category
    pub fn set_level(&self, level: LogLevel) {
        self.registry.set_level(self.category.clone(), level);
    }

    #[inline]
    pub fn is_level_enabled(&self, level: LogLevel) -> bool {
        self.registry.is_enabled(&self.category, level)
    }

    /// Dispatch `payload` at `level`
    ///
    /// Events below the category's level are dropped and report nothing.
    pub fn log(&self, level: LogLevel, payload: Vec<Value>) -> DispatchReport {
        if !self.is_level_enabled(level) {
            return DispatchReport::default();
        }
        self.registry
            .dispatch(&LogEvent::new(self.category.clone(), level, payload))
    }

    /// Dispatch with structured key/value extras attached
    pub fn log_with_extras(
        &self,
        level: LogLevel,
        payload: Vec<Value>,
        extras: Map<String, Value>,
    ) -> DispatchReport {
        if !self.is_level_enabled(level) {
            return DispatchReport::default();
        }
        let event = LogEvent::new(self.category.clone(), level, payload).with_extras(extras);
        self.registry.dispatch(&event)
    }

    #[inline]
    pub fn trace(&self, message: impl Into<Value>) -> DispatchReport {
        self.log(LogLevel::Trace, vec![message.into()])
    }

    #[inline]
    pub fn debug(&self, message: impl Into<Value>) -> DispatchReport {
        self.log(LogLevel::Debug, vec![message.into()])
    }

    #[inline]
    pub fn info(&self, message: impl Into<Value>) -> DispatchReport {
        self.log(LogLevel::Info, vec![message.into()])
    }

    #[inline]
    pub fn warn(&self, message: impl Into<Value>) -> DispatchReport {
        self.log(LogLevel::Warn, vec![message.into()])
    }

    #[inline]
    pub fn error(&self, message: impl Into<Value>) -> DispatchReport {
        self.log(LogLevel::Error, vec![message.into()])
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<Value>) -> DispatchReport {
        self.log(LogLevel::Fatal, vec![message.into()])
    }
}

/// Builder for constructing a [`LoggingSystem`] with a fluent API
///
/// # Example
/// ```
/// use rust_log_dispatch::appenders::FnAppender;
/// use rust_log_dispatch::{LogLevel, LoggingSystem};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let system = LoggingSystem::builder()
///     .appender(Arc::new(FnAppender::new("root", |_| Ok(()))))
///     .appender_for("db", Arc::new(FnAppender::new("db", |_| Ok(()))))
///     .level("db", LogLevel::Warn)
///     .shutdown_timeout(Duration::from_secs(2))
///     .build();
///
/// assert_eq!(system.registry().appenders().len(), 2);
/// ```
pub struct LoggingSystemBuilder {
    bindings: Vec<(String, SharedAppender)>,
    levels: Vec<(String, LogLevel)>,
    shutdown_timeout: Duration,
}

impl LoggingSystemBuilder {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            levels: Vec::new(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Bind an appender to the default category
    #[must_use = "builder methods return a new value"]
    pub fn appender(self, appender: SharedAppender) -> Self {
        self.appender_for(DEFAULT_CATEGORY, appender)
    }

    #[must_use = "builder methods return a new value"]
    pub fn appender_for(mut self, category: impl Into<String>, appender: SharedAppender) -> Self {
        self.bindings.push((category.into(), appender));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, category: impl Into<String>, level: LogLevel) -> Self {
        self.levels.push((category.into(), level));
        self
    }

    /// Bound on how long shutdown waits for appenders
    #[must_use = "builder methods return a new value"]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn build(self) -> LoggingSystem {
        let system = LoggingSystem::with_shutdown_timeout(self.shutdown_timeout);
        for (category, appender) in self.bindings {
            system.add_appender_to(category, appender);
        }
        for (category, level) in self.levels {
            system.registry.set_level(category, level);
        }
        system
    }
}

impl Default for LoggingSystemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_SYSTEM: OnceLock<LoggingSystem> = OnceLock::new();

/// Process-wide logging system, created on first use
pub fn default_system() -> &'static LoggingSystem {
    DEFAULT_SYSTEM.get_or_init(LoggingSystem::new)
}

/// [`LoggingSystem::get_logger`] on the [`default_system`]
pub fn get_logger(category: impl Into<String>) -> Logger {
    default_system().get_logger(category)
}

/// [`LoggingSystem::add_appender_to`] on the [`default_system`]
pub fn add_appender(category: impl Into<String>, appender: SharedAppender) {
    default_system().add_appender_to(category, appender);
}

/// [`LoggingSystem::clear_appenders`] on the [`default_system`]
pub fn clear_appenders() {
    default_system().clear_appenders();
}

/// [`LoggingSystem::shutdown`] on the [`default_system`]
pub fn shutdown<F>(on_all_done: F)
where
    F: FnOnce(Result<()>) + Send + 'static,
{
    default_system().shutdown(on_all_done);
}
