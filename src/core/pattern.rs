//! Conversion-pattern layout
//!
//! | Conversion | Output |
//! |---|---|
//! | `%c` | category |
//! | `%d`, `%d{spec}` | timestamp, ISO 8601 by default; `spec` is `ISO8601`, `ABSOLUTE`, `DATE` or strftime |
//! | `%r` | time of day (`ABSOLUTE`) |
//! | `%p` | level |
//! | `%m` | message |
//! | `%n` | newline |
//! | `%t` | thread name, or id when unnamed |
//! | `%z` | process id |
//! | `%x{key}` | extras field `key`, empty when absent |
//! | `%%` | a literal `%` |
//!
//! Each conversion may carry a width and a truncation: `%-5p` left-justifies
//! to 5 columns, `%5p` right-justifies, `%.3c` keeps the first three
//! characters and `%.-3c` the last three. Truncation applies before padding.

use super::error::{LoggerError, Result};
use super::inspect;
use super::layout::{Layout, Rendered};
use super::log_event::LogEvent;
use super::timestamp::TimestampFormat;
use serde_json::Value;

const COMPONENT: &str = "pattern layout";

#[derive(Debug, Clone, PartialEq)]
enum Field {
    Category,
    Date(TimestampFormat),
    Level,
    Message,
    Thread,
    Pid,
    Extra(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Width {
    padding: Option<i32>,
    truncation: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field(Field, Width),
}

/// Layout driven by a conversion pattern compiled at construction
///
/// # Example
///
/// ```
/// use rust_log_dispatch::core::{Layout, LogEvent, LogLevel, PatternLayout};
/// use serde_json::json;
///
/// let layout = PatternLayout::new("%-5p %c: %m").unwrap();
/// let event = LogEvent::new("db", LogLevel::Warn, vec![json!("slow query")]);
/// assert_eq!(layout.render(&event).into_text(), "WARN  db: slow query");
/// ```
#[derive(Debug, Clone)]
pub struct PatternLayout {
    pattern: String,
    segments: Vec<Segment>,
}

impl PatternLayout {
    /// Compile a pattern
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown conversion,
    /// a dangling `%`, an unterminated `{`, or `%x` without a key.
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: pattern.to_string(),
            segments: parse(pattern)?,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn field_text(field: &Field, event: &LogEvent) -> String {
        match field {
            Field::Category => event.category().to_string(),
            Field::Date(format) => format.format(event.timestamp()),
            Field::Level => event.level().to_str().to_string(),
            Field::Message => event.message(),
            Field::Thread => event.thread_label().to_string(),
            Field::Pid => std::process::id().to_string(),
            Field::Extra(key) => match event.extras().and_then(|extras| extras.get(key)) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => inspect::inspect(other),
                None => String::new(),
            },
        }
    }
}

impl Layout for PatternLayout {
    fn kind(&self) -> &'static str {
        "pattern"
    }

    fn render(&self, event: &LogEvent) -> Rendered {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field, width) => {
                    out.push_str(&width.apply(Self::field_text(field, event)))
                }
            }
        }
        Rendered::Text(out)
    }
}

impl Width {
    fn apply(&self, text: String) -> String {
        let text = match self.truncation {
            Some(len) if len >= 0 => text.chars().take(len as usize).collect(),
            Some(len) => {
                let keep = len.unsigned_abs() as usize;
                let count = text.chars().count();
                text.chars().skip(count.saturating_sub(keep)).collect()
            }
            None => text,
        };

        match self.padding {
            Some(width) if width < 0 => format!("{:<w$}", text, w = width.unsigned_abs() as usize),
            Some(width) => format!("{:>w$}", text, w = width as usize),
            None => text,
        }
    }
}

fn parse(pattern: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }

        let padding = parse_number(&mut chars)?;
        let truncation = if chars.peek() == Some(&'.') {
            chars.next();
            Some(parse_number(&mut chars)?.ok_or_else(|| {
                LoggerError::config(COMPONENT, format!("missing truncation length in '{}'", pattern))
            })?)
        } else {
            None
        };

        let conversion = chars
            .next()
            .ok_or_else(|| LoggerError::config(COMPONENT, format!("dangling '%' in '{}'", pattern)))?;

        let spec = if chars.peek() == Some(&'{') {
            chars.next();
            let mut spec = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(ch) => spec.push(ch),
                    None => {
                        return Err(LoggerError::config(
                            COMPONENT,
                            format!("unterminated '{{' in '{}'", pattern),
                        ))
                    }
                }
            }
            Some(spec)
        } else {
            None
        };

        let field = match conversion {
            '%' => {
                literal.push('%');
                continue;
            }
            'n' => {
                literal.push('\n');
                continue;
            }
            'c' => Field::Category,
            'd' => {
                let format = spec
                    .as_deref()
                    .map(TimestampFormat::from_specifier)
                    .unwrap_or_default();
                format.validate()?;
                Field::Date(format)
            }
            'r' => Field::Date(TimestampFormat::Absolute),
            'p' => Field::Level,
            'm' => Field::Message,
            't' => Field::Thread,
            'z' => Field::Pid,
            'x' => match spec {
                Some(key) if !key.is_empty() => Field::Extra(key),
                _ => {
                    return Err(LoggerError::config(
                        COMPONENT,
                        "'%x' needs a key, e.g. %x{user}",
                    ))
                }
            },
            other => {
                return Err(LoggerError::config(
                    COMPONENT,
                    format!("unknown conversion '%{}'", other),
                ))
            }
        };

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Field(field, Width { padding, truncation }));
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

// Optional signed integer; `None` when no digits follow.
fn parse_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<Option<i32>> {
    let mut digits = String::new();
    if chars.peek() == Some(&'-') {
        digits.push('-');
        chars.next();
    }
    while let Some(d) = chars.peek().copied().filter(|d| d.is_ascii_digit()) {
        digits.push(d);
        chars.next();
    }

    match digits.as_str() {
        "" => Ok(None),
        "-" => Err(LoggerError::config(COMPONENT, "'-' must be followed by a width")),
        text => text
            .parse()
            .map(Some)
            .map_err(|e| LoggerError::config(COMPONENT, format!("invalid width '{}': {}", text, e))),
    }
}
