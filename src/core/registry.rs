//! Category registry and dispatcher
//!
//! Categories map to ordered lists of appenders. An unbound category falls
//! back to the [`DEFAULT_CATEGORY`] binding, or to nothing when that is not
//! bound either.

use super::appender::{panic_message, same_appender, SharedAppender};
use super::error::LoggerError;
use super::log_event::LogEvent;
use super::log_level::LogLevel;
use super::metrics::LoggerMetrics;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Root binding used for categories without their own appenders
pub const DEFAULT_CATEGORY: &str = "default";

#[derive(Default)]
struct Bindings {
    categories: HashMap<String, Vec<SharedAppender>>,
    /// Distinct appenders in first-registration order
    ordered: Vec<SharedAppender>,
}

/// What happened to one dispatched event
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Appenders the event was offered to
    pub attempted: usize,
    /// Appenders that accepted the event
    pub accepted: usize,
    /// Rejections, in appender order
    pub errors: Vec<LoggerError>,
}

impl DispatchReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether any appender refused the write because it is shutting down
    pub fn has_closed(&self) -> bool {
        self.errors.iter().any(LoggerError::is_closed)
    }
}

pub struct Registry {
    bindings: RwLock<Bindings>,
    levels: RwLock<HashMap<String, LogLevel>>,
    metrics: Arc<LoggerMetrics>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(Bindings::default()),
            levels: RwLock::new(HashMap::new()),
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }

    /// Bind `appender` to `category` after any appenders already bound there
    ///
    /// The same appender may be bound to several categories; it is still one
    /// appender for shutdown purposes.
    pub fn register(&self, category: impl Into<String>, appender: SharedAppender) {
        let mut bindings = self.bindings.write();
        if !bindings
            .ordered
            .iter()
            .any(|known| same_appender(known, &appender))
        {
            bindings.ordered.push(Arc::clone(&appender));
        }
        bindings
            .categories
            .entry(category.into())
            .or_default()
            .push(appender);
    }

    /// Appenders for `category`: its own binding, else the default binding
    pub fn lookup(&self, category: &str) -> Vec<SharedAppender> {
        let bindings = self.bindings.read();
        bindings
            .categories
            .get(category)
            .or_else(|| bindings.categories.get(DEFAULT_CATEGORY))
            .cloned()
            .unwrap_or_default()
    }

    /// Offer `event` to every appender bound to its category, in order
    ///
    /// The appender list is snapshotted first, so reconfiguration during a
    /// dispatch does not affect it. Each appender is isolated: an error or a
    /// panic in one is recorded and the remaining appenders still run.
    pub fn dispatch(&self, event: &LogEvent) -> DispatchReport {
        let appenders = self.lookup(event.category());
        self.metrics.record_dispatched();
        if appenders.is_empty() {
            self.metrics.record_unrouted();
        }

        let mut report = DispatchReport {
            attempted: appenders.len(),
            ..DispatchReport::default()
        };

        for appender in &appenders {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                appender.append(event)
            }));

            match result {
                Ok(Ok(())) => {
                    self.metrics.record_accepted();
                    report.accepted += 1;
                }
                Ok(Err(e)) => {
                    self.metrics.record_failure();
                    if !e.is_closed() {
                        eprintln!(
                            "[LOGGER ERROR] Appender '{}' failed: {}",
                            appender.name(),
                            e
                        );
                    }
                    report.errors.push(e);
                }
                Err(panic_info) => {
                    self.metrics.record_panic();
                    let message = panic_message(panic_info.as_ref());
                    eprintln!(
                        "[LOGGER CRITICAL] Appender '{}' panicked: {}. \
                         Other appenders continue to function.",
                        appender.name(),
                        message
                    );
                    report
                        .errors
                        .push(LoggerError::appender_panicked(appender.name(), message));
                }
            }
        }

        report
    }

    /// Remove every binding without shutting the appenders down
    pub fn clear(&self) {
        let mut bindings = self.bindings.write();
        bindings.categories.clear();
        bindings.ordered.clear();
    }

    /// Distinct bound appenders in first-registration order
    pub fn appenders(&self) -> Vec<SharedAppender> {
        self.bindings.read().ordered.clone()
    }

    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.read().categories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.read().ordered.is_empty()
    }

    /// Minimum level for `category`
    ///
    /// Setting the level of [`DEFAULT_CATEGORY`] changes the threshold of
    /// every category without its own.
    pub fn set_level(&self, category: impl Into<String>, level: LogLevel) {
        self.levels.write().insert(category.into(), level);
    }

    pub fn level_for(&self, category: &str) -> LogLevel {
        let levels = self.levels.read();
        levels
            .get(category)
            .or_else(|| levels.get(DEFAULT_CATEGORY))
            .copied()
            .unwrap_or(LogLevel::Trace)
    }

    pub fn is_enabled(&self, category: &str, level: LogLevel) -> bool {
        level >= self.level_for(category)
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = self.bindings.read();
        let mut map = f.debug_map();
        for (category, appenders) in &bindings.categories {
            let names: Vec<&str> = appenders.iter().map(|a| a.name()).collect();
            map.entry(category, &names);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Appender, Completion, Result};
    use parking_lot::Mutex;
    use serde_json::json;

    struct Recording {
        name: String,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Appender for Recording {
        fn name(&self) -> &str {
            &self.name
        }

        fn append(&self, event: &LogEvent) -> Result<()> {
            self.seen
                .lock()
                .push(format!("{}:{}", self.name, event.message()));
            Ok(())
        }

        fn shutdown(&self, done: Completion) {
            done.complete(Ok(()));
        }
    }

    fn recording(name: &str, seen: &Arc<Mutex<Vec<String>>>) -> SharedAppender {
        Arc::new(Recording {
            name: name.to_string(),
            seen: Arc::clone(seen),
        })
    }

    fn event(category: &str, text: &str) -> LogEvent {
        LogEvent::new(category, LogLevel::Info, vec![json!(text)])
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = Registry::new();
        registry.register("app", recording("a", &seen));
        registry.register("app", recording("b", &seen));
        registry.register("app", recording("c", &seen));

        let report = registry.dispatch(&event("app", "hi"));
        assert_eq!(report.accepted, 3);
        assert_eq!(*seen.lock(), vec!["a:hi", "b:hi", "c:hi"]);
    }

    #[test]
    fn test_lookup_falls_back_to_default() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = Registry::new();
        assert!(registry.lookup("anything").is_empty());

        registry.register(DEFAULT_CATEGORY, recording("root", &seen));
        registry.register("db", recording("db", &seen));

        assert_eq!(registry.lookup("anything")[0].name(), "root");
        assert_eq!(registry.lookup("db")[0].name(), "db");
        assert_eq!(registry.lookup("db").len(), 1);
    }

    #[test]
    fn test_unrouted_event() {
        let registry = Registry::new();
        let report = registry.dispatch(&event("nowhere", "lost"));
        assert_eq!(report.attempted, 0);
        assert!(report.is_ok());
        assert_eq!(registry.metrics().events_unrouted(), 1);
    }

    #[test]
    fn test_shared_appender_listed_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let shared = recording("shared", &seen);
        let registry = Registry::new();
        registry.register("a", Arc::clone(&shared));
        registry.register("b", Arc::clone(&shared));
        registry.register("c", recording("other", &seen));

        let names: Vec<String> = registry
            .appenders()
            .iter()
            .map(|a| a.name().to_string())
            .collect();
        assert_eq!(names, vec!["shared", "other"]);
        assert_eq!(registry.categories(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = Registry::new();
        registry.register("app", recording("a", &seen));

        registry.clear();
        assert!(registry.is_empty());
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.lookup("app").is_empty());
    }

    #[test]
    fn test_levels() {
        let registry = Registry::new();
        assert!(registry.is_enabled("any", LogLevel::Trace));

        registry.set_level(DEFAULT_CATEGORY, LogLevel::Info);
        registry.set_level("noisy", LogLevel::Error);

        assert!(!registry.is_enabled("any", LogLevel::Debug));
        assert!(registry.is_enabled("any", LogLevel::Info));
        assert!(!registry.is_enabled("noisy", LogLevel::Warn));
        assert_eq!(registry.level_for("noisy"), LogLevel::Error);
    }
}
