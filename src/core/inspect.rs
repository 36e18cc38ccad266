//! Inspection-style stringification of payload values
//!
//! Payload elements are `serde_json::Value`s. A top-level string is rendered
//! as-is; everything else uses a stable single-line representation:
//!
//! - strings nested inside arrays or objects are quoted: `'text'`
//! - arrays: `[ 1, 'two' ]`, empty array `[]`
//! - objects: `{ key: 'value', 'odd-key': 2 }`, empty object `{}`
//! - `null`, `true`, `false` and numbers as written, `1.0` rendered as `1`
//!
//! Object keys keep their insertion order.

use serde_json::{Map, Value};

/// Join payload elements with a single space
pub fn render_payload(payload: &[Value]) -> String {
    let mut out = String::new();
    for (idx, value) in payload.iter().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        match value {
            Value::String(s) => out.push_str(s),
            other => write_value(&mut out, other),
        }
    }
    out
}

/// Render one value in inspection style, quoting strings
pub fn inspect(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => out.push_str(&i.to_string()),
            (_, Some(u), _) => out.push_str(&u.to_string()),
            (_, _, Some(f)) => out.push_str(&f.to_string()),
            _ => out.push_str(&n.to_string()),
        },
        Value::String(s) => write_quoted(out, s),
        Value::Array(items) => write_array(out, items),
        Value::Object(map) => write_object(out, map),
    }
}

fn write_array(out: &mut String, items: &[Value]) {
    if items.is_empty() {
        out.push_str("[]");
        return;
    }
    out.push_str("[ ");
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        write_value(out, item);
    }
    out.push_str(" ]");
}

fn write_object(out: &mut String, map: &Map<String, Value>) {
    if map.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{ ");
    for (idx, (key, value)) in map.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        if is_identifier(key) {
            out.push_str(key);
        } else {
            write_quoted(out, key);
        }
        out.push_str(": ");
        write_value(out, value);
    }
    out.push_str(" }");
}

// Single quotes unless the text contains one and no double quote.
fn write_quoted(out: &mut String, s: &str) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
