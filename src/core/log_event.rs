//! Log event structure

use super::inspect;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::cell::RefCell;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

fn current_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

fn current_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// One logging call, immutable once built
///
/// The payload keeps the arguments of the logging call in order. Appenders
/// receive events by shared reference; adapters that need a different
/// payload (tag extraction) derive a new event with [`LogEvent::with_payload`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEvent {
    category: String,
    level: LogLevel,
    payload: Vec<Value>,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extras: Option<Map<String, Value>>,
    thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_name: Option<String>,
}

impl LogEvent {
    pub fn new(category: impl Into<String>, level: LogLevel, payload: Vec<Value>) -> Self {
        Self {
            category: category.into(),
            level,
            payload,
            timestamp: Utc::now(),
            extras: None,
            thread_id: current_thread_id(),
            thread_name: current_thread_name(),
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_extras(mut self, extras: Map<String, Value>) -> Self {
        self.extras = Some(extras);
        self
    }

    /// Copy of this event carrying a different payload
    #[must_use]
    pub fn with_payload(&self, payload: Vec<Value>) -> Self {
        Self {
            payload,
            ..self.clone()
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn payload(&self) -> &[Value] {
        &self.payload
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    pub fn extras(&self) -> Option<&Map<String, Value>> {
        self.extras.as_ref()
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
    }

    /// Thread name if the thread has one, its id otherwise
    pub fn thread_label(&self) -> &str {
        self.thread_name.as_deref().unwrap_or(&self.thread_id)
    }

    /// Payload rendered as message text
    pub fn message(&self) -> String {
        inspect::render_payload(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_joins_payload() {
        let event = LogEvent::new(
            "app",
            LogLevel::Info,
            vec![json!("user"), json!(42), json!("logged in")],
        );
        assert_eq!(event.message(), "user 42 logged in");
        assert_eq!(event.category(), "app");
        assert_eq!(event.level(), LogLevel::Info);
    }

    #[test]
    fn test_with_payload_keeps_metadata() {
        let mut extras = Map::new();
        extras.insert("request_id".to_string(), json!("abc"));
        let event = LogEvent::new("http", LogLevel::Warn, vec![json!("a"), json!("b")])
            .with_extras(extras);

        let derived = event.with_payload(vec![json!("a")]);
        assert_eq!(derived.payload(), &[json!("a")]);
        assert_eq!(derived.timestamp(), event.timestamp());
        assert_eq!(derived.extras(), event.extras());
        assert_eq!(derived.category(), "http");
    }

    #[test]
    fn test_thread_label_is_cached_per_thread() {
        let first = LogEvent::new("t", LogLevel::Debug, vec![]);
        let second = LogEvent::new("t", LogLevel::Debug, vec![]);
        assert_eq!(first.thread_id(), second.thread_id());

        let other = std::thread::Builder::new()
            .name("worker-7".to_string())
            .spawn(|| LogEvent::new("t", LogLevel::Debug, vec![]))
            .expect("spawn")
            .join()
            .expect("join");
        assert_eq!(other.thread_label(), "worker-7");
    }
}
