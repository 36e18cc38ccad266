//! Layouts turn a [`LogEvent`] into something an appender can emit
//!
//! A layout is built once from a [`LayoutConfig`] and is immutable afterwards,
//! so rendering the same event twice always yields the same output.
//!
//! Built-in layout types:
//! - `messagePassThrough` (aliases `pass-through`, `message-pass-through`):
//!   the payload only, e.g. `Request processed in 15 ms`
//! - `basic`: `[2025-01-08T10:30:45.123Z] [INFO] http - Request processed`
//! - `colored` (alias `coloured`): `basic` with a level-coloured header
//! - `json`: a structured object with timestamp, level, category and message
//! - `pattern`: a conversion pattern, see [`PatternLayout`]

use super::error::{LoggerError, Result};
use super::log_event::LogEvent;
use super::pattern::PatternLayout;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Output of a layout: plain text or a structured object
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Text(String),
    Structured(Value),
}

impl Rendered {
    /// Text form; structured output is serialized as compact JSON
    pub fn into_text(self) -> String {
        match self {
            Rendered::Text(text) => text,
            Rendered::Structured(value) => value.to_string(),
        }
    }

    /// JSON form; text becomes a JSON string
    pub fn into_value(self) -> Value {
        match self {
            Rendered::Text(text) => Value::String(text),
            Rendered::Structured(value) => value,
        }
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rendered::Text(text) => f.write_str(text),
            Rendered::Structured(value) => write!(f, "{}", value),
        }
    }
}

/// A pure transformation from event to renderable output
pub trait Layout: Send + Sync + fmt::Debug {
    /// Layout type name as accepted by [`layout`]
    fn kind(&self) -> &'static str;

    fn render(&self, event: &LogEvent) -> Rendered;
}

pub type SharedLayout = Arc<dyn Layout>;

/// Configuration captured by a layout at construction
///
/// Deserializes from a mapping such as
/// `{"type": "pattern", "pattern": "%d{ABSOLUTE} %p %c - %m"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_format: Option<TimestampFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

fn default_kind() -> String {
    "messagePassThrough".to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new(default_kind())
    }
}

impl LayoutConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            timestamp_format: None,
            pattern: None,
        }
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = Some(format);
        self
    }

    pub fn build(&self) -> Result<SharedLayout> {
        layout(&self.kind, self)
    }
}

/// Build a layout by type name
///
/// # Errors
///
/// Returns [`LoggerError::InvalidConfiguration`] for an unknown type, or when
/// the `pattern` type has no pattern or an invalid one, or when a custom
/// timestamp format is not a valid strftime string.
///
/// # Example
///
/// ```
/// use rust_log_dispatch::core::{layout, LayoutConfig, LogEvent, LogLevel};
/// use serde_json::json;
///
/// let pass_through = layout("messagePassThrough", &LayoutConfig::default()).unwrap();
/// let event = LogEvent::new("app", LogLevel::Info, vec![json!("hello"), json!(1)]);
/// assert_eq!(pass_through.render(&event).into_text(), "hello 1");
/// ```
pub fn layout(kind: &str, config: &LayoutConfig) -> Result<SharedLayout> {
    let timestamp_format = config.timestamp_format.clone().unwrap_or_default();
    timestamp_format.validate()?;

    let built: SharedLayout = match kind {
        "messagePassThrough" | "message-pass-through" | "pass-through" => {
            Arc::new(MessagePassThroughLayout)
        }
        "basic" => Arc::new(BasicLayout::new(timestamp_format)),
        #[cfg(feature = "console")]
        "colored" | "coloured" => Arc::new(ColoredLayout::new(timestamp_format)),
        "json" => Arc::new(JsonLayout::new(timestamp_format)),
        "pattern" => {
            let pattern = config
                .pattern
                .as_deref()
                .ok_or_else(|| LoggerError::config("layout", "pattern layout requires 'pattern'"))?;
            Arc::new(PatternLayout::new(pattern)?)
        }
        other => {
            return Err(LoggerError::config(
                "layout",
                format!("unknown layout type '{}'", other),
            ))
        }
    };

    Ok(built)
}

/// Renders only the payload
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePassThroughLayout;

impl Layout for MessagePassThroughLayout {
    fn kind(&self) -> &'static str {
        "messagePassThrough"
    }

    fn render(&self, event: &LogEvent) -> Rendered {
        Rendered::Text(event.message())
    }
}

/// `[timestamp] [LEVEL] category - message`
#[derive(Debug, Clone, Default)]
pub struct BasicLayout {
    timestamp_format: TimestampFormat,
}

impl BasicLayout {
    pub fn new(timestamp_format: TimestampFormat) -> Self {
        Self { timestamp_format }
    }

    fn header(&self, event: &LogEvent) -> String {
        format!(
            "[{}] [{}] {} - ",
            self.timestamp_format.format(event.timestamp()),
            event.level(),
            event.category()
        )
    }
}

impl Layout for BasicLayout {
    fn kind(&self) -> &'static str {
        "basic"
    }

    fn render(&self, event: &LogEvent) -> Rendered {
        Rendered::Text(format!("{}{}", self.header(event), event.message()))
    }
}

/// Basic layout with the header coloured by level
#[cfg(feature = "console")]
#[derive(Debug, Clone, Default)]
pub struct ColoredLayout {
    basic: BasicLayout,
}

#[cfg(feature = "console")]
impl ColoredLayout {
    pub fn new(timestamp_format: TimestampFormat) -> Self {
        Self {
            basic: BasicLayout::new(timestamp_format),
        }
    }
}

#[cfg(feature = "console")]
impl Layout for ColoredLayout {
    fn kind(&self) -> &'static str {
        "colored"
    }

    fn render(&self, event: &LogEvent) -> Rendered {
        use colored::Colorize;

        let header = self.basic.header(event);
        let header = header.as_str().color(event.level().color_code());
        Rendered::Text(format!("{}{}", header, event.message()))
    }
}

/// Structured output for machine consumers
///
/// Produces `{"timestamp", "level", "category", "message", "data"}` where
/// `data` is the raw payload array. Extras are merged at top level without
/// overwriting those keys.
#[derive(Debug, Clone, Default)]
pub struct JsonLayout {
    timestamp_format: TimestampFormat,
}

impl JsonLayout {
    pub fn new(timestamp_format: TimestampFormat) -> Self {
        Self { timestamp_format }
    }

    fn timestamp_value(&self, event: &LogEvent) -> Value {
        match self.timestamp_format {
            TimestampFormat::UnixMillis => Value::from(event.timestamp().timestamp_millis()),
            _ => Value::String(self.timestamp_format.format(event.timestamp())),
        }
    }
}

impl Layout for JsonLayout {
    fn kind(&self) -> &'static str {
        "json"
    }

    fn render(&self, event: &LogEvent) -> Rendered {
        let mut json_obj = serde_json::Map::new();
        json_obj.insert("timestamp".to_string(), self.timestamp_value(event));
        json_obj.insert(
            "level".to_string(),
            Value::String(event.level().to_str().to_string()),
        );
        json_obj.insert(
            "category".to_string(),
            Value::String(event.category().to_string()),
        );
        json_obj.insert("message".to_string(), Value::String(event.message()));
        json_obj.insert("data".to_string(), Value::Array(event.payload().to_vec()));

        if let Some(extras) = event.extras() {
            for (key, value) in extras {
                json_obj
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }

        Rendered::Structured(Value::Object(json_obj))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_event() -> LogEvent {
        let at = chrono::Utc
            .with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime");
        LogEvent::new("cheese", LogLevel::Error, vec![json!("Gouda"), json!({ "age": 3 })])
            .with_timestamp(at)
    }

    #[test]
    fn test_pass_through_ignores_metadata() {
        let layout = layout("pass-through", &LayoutConfig::default()).expect("layout");
        assert_eq!(layout.render(&sample_event()).into_text(), "Gouda { age: 3 }");
        assert_eq!(layout.kind(), "messagePassThrough");
    }

    #[test]
    fn test_basic_layout() {
        let layout = layout("basic", &LayoutConfig::new("basic")).expect("layout");
        assert_eq!(
            layout.render(&sample_event()).into_text(),
            "[2025-01-08T10:30:45.000Z] [ERROR] cheese - Gouda { age: 3 }"
        );
    }

    #[test]
    fn test_basic_layout_timestamp_format() {
        let config = LayoutConfig::new("basic").with_timestamp_format(TimestampFormat::Absolute);
        let layout = config.build().expect("layout");
        assert_eq!(
            layout.render(&sample_event()).into_text(),
            "[10:30:45.000] [ERROR] cheese - Gouda { age: 3 }"
        );
    }

    #[test]
    fn test_json_layout() {
        let mut extras = serde_json::Map::new();
        extras.insert("request_id".to_string(), json!("r-1"));
        extras.insert("level".to_string(), json!("ignored"));
        let event = sample_event().with_extras(extras);

        let layout = JsonLayout::new(TimestampFormat::UnixMillis);
        let value = layout.render(&event).into_value();

        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["category"], "cheese");
        assert_eq!(value["message"], "Gouda { age: 3 }");
        assert_eq!(value["data"][1]["age"], 3);
        assert_eq!(value["request_id"], "r-1");
        assert_eq!(value["timestamp"], 1736332245000_i64);
    }

    #[test]
    fn test_unknown_layout_type() {
        let err = layout("fancy", &LayoutConfig::new("fancy")).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_pattern_requires_pattern() {
        let err = LayoutConfig::new("pattern").build().unwrap_err();
        assert!(err.to_string().contains("requires 'pattern'"));
    }

    #[test]
    fn test_bad_custom_timestamp_rejected_at_build() {
        for kind in ["basic", "json", "pattern"] {
            let config = LayoutConfig::new(kind)
                .with_pattern("%d %m")
                .with_timestamp_format(TimestampFormat::Custom("%Q".to_string()));
            let err = config.build().err().expect("invalid timestamp format");
            assert!(matches!(err, LoggerError::InvalidConfiguration { .. }), "{}", kind);
        }

        let err = LayoutConfig::new("pattern")
            .with_pattern("%d{%Q} %m")
            .build()
            .err()
            .expect("invalid date specifier");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_config_deserializes_from_mapping() {
        let config: LayoutConfig = serde_json::from_value(json!({
            "type": "pattern",
            "pattern": "%p %m",
            "timestampFormat": "absolute"
        }))
        .expect("valid config");
        assert_eq!(config.kind, "pattern");
        assert_eq!(config.pattern.as_deref(), Some("%p %m"));
        assert_eq!(config.timestamp_format, Some(TimestampFormat::Absolute));

        let config: LayoutConfig = serde_json::from_value(json!({})).expect("valid config");
        assert_eq!(config.kind, "messagePassThrough");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let event = sample_event();
        for kind in ["messagePassThrough", "basic", "json"] {
            let layout = LayoutConfig::new(kind).build().expect("layout");
            assert_eq!(layout.render(&event), layout.render(&event), "{}", kind);
        }
    }
}
