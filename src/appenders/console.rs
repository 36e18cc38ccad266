//! Console appender implementation

use crate::core::{
    Appender, Completion, LayoutConfig, Lifecycle, LogEvent, LoggerError, Result, SharedLayout,
};
use serde::Deserialize;
use serde_json::Value;
use std::io::Write;

/// Options accepted by [`ConsoleAppender::configure`]
///
/// `{"layout": {"type": "basic"}, "name": "stdout"}`; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleOptions {
    #[serde(default)]
    pub layout: Option<LayoutConfig>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Writes rendered events to stdout, Error and Fatal to stderr
pub struct ConsoleAppender {
    name: String,
    layout: SharedLayout,
    lifecycle: Lifecycle,
}

impl ConsoleAppender {
    /// Console appender with the coloured layout
    pub fn new() -> Result<Self> {
        Ok(Self::with_layout(LayoutConfig::new("colored").build()?))
    }

    pub fn with_layout(layout: SharedLayout) -> Self {
        Self {
            name: "console".to_string(),
            layout,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Build from mapping-style options
    ///
    /// # Example
    ///
    /// ```
    /// use rust_log_dispatch::appenders::ConsoleAppender;
    /// use rust_log_dispatch::core::Appender;
    /// use serde_json::json;
    ///
    /// let console = ConsoleAppender::configure(&json!({
    ///     "layout": {"type": "pattern", "pattern": "%-5p %c - %m"}
    /// }))
    /// .unwrap();
    /// assert_eq!(console.name(), "console");
    /// ```
    pub fn configure(options: &Value) -> Result<Self> {
        let options: ConsoleOptions = serde_json::from_value(options.clone())
            .map_err(|e| LoggerError::config("console appender", e.to_string()))?;

        let layout = match options.layout {
            Some(config) => config.build()?,
            None => LayoutConfig::new("colored").build()?,
        };
        let mut appender = Self::with_layout(layout);
        if let Some(name) = options.name {
            appender.name = name;
        }
        Ok(appender)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn flush() -> std::io::Result<()> {
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()
    }
}

impl Appender for ConsoleAppender {
    fn name(&self) -> &str {
        &self.name
    }

    fn append(&self, event: &LogEvent) -> Result<()> {
        self.lifecycle.ensure_open(&self.name)?;

        let output = self.layout.render(event);
        // Route Error and Fatal levels to stderr, others to stdout
        if event.level().is_severe() {
            eprintln!("{}", output);
        } else {
            println!("{}", output);
        }
        Ok(())
    }

    fn shutdown(&self, done: Completion) {
        self.lifecycle.begin_shutdown();
        let result = Self::flush().map_err(|e| {
            LoggerError::io_operation("flushing console", self.name.clone(), e)
        });
        self.lifecycle.finish_shutdown();
        done.complete(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AppenderState, LogLevel};
    use serde_json::json;

    #[test]
    fn test_configure_defaults() {
        let console = ConsoleAppender::configure(&json!({})).expect("console");
        assert_eq!(console.name(), "console");
        assert_eq!(console.layout.kind(), "colored");
    }

    #[test]
    fn test_configure_rejects_bad_layout() {
        let err = ConsoleAppender::configure(&json!({"layout": {"type": "nope"}}))
            .err()
            .expect("invalid layout");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_closed_after_shutdown() {
        let console = ConsoleAppender::configure(&json!({"name": "out"})).expect("console");
        let event = LogEvent::new("app", LogLevel::Info, vec![json!("before")]);
        assert!(console.append(&event).is_ok());

        let (done, outcomes) = Completion::channel("out");
        console.shutdown(done);
        assert!(outcomes.recv().expect("outcome").result.is_ok());
        assert_eq!(console.lifecycle().state(), AppenderState::ShutDown);

        let err = console.append(&event).unwrap_err();
        assert!(err.is_closed());
    }
}
