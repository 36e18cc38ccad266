//! Timestamp formats used by the layouts
//!
//! The named formats match the date tokens accepted by the pattern layout
//! (`%d{ISO8601}`, `%d{ABSOLUTE}`, `%d{DATE}`); anything else is treated as a
//! strftime string.

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an event timestamp is rendered
///
/// # Examples
///
/// ```
/// use rust_log_dispatch::core::TimestampFormat;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
/// assert_eq!(TimestampFormat::Absolute.format(&at), "10:30:45.000");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// Time of day only: `10:30:45.123`
    Absolute,

    /// Day first: `08 01 2025 10:30:45.123`
    Date,

    /// Milliseconds since the epoch: `1736332245123`
    UnixMillis,

    /// Any strftime-compatible format string
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Absolute => datetime.format("%H:%M:%S%.3f").to_string(),
            TimestampFormat::Date => datetime.format("%d %m %Y %H:%M:%S%.3f").to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }

    /// Reject custom strftime strings chrono cannot render
    ///
    /// Formatting an invalid string panics, so layouts call this at
    /// construction.
    pub fn validate(&self) -> Result<()> {
        match self {
            TimestampFormat::Custom(format_str) => {
                if StrftimeItems::new(format_str).any(|item| matches!(item, Item::Error)) {
                    Err(LoggerError::config(
                        "timestamp format",
                        format!("invalid strftime string '{}'", format_str),
                    ))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// Resolve a pattern-layout date specifier
    ///
    /// Named formats are matched case-insensitively; other text becomes a
    /// custom strftime format.
    pub fn from_specifier(spec: &str) -> Self {
        match spec.to_ascii_uppercase().as_str() {
            "ISO8601" | "ISO8601_FORMAT" => TimestampFormat::Iso8601,
            "ABSOLUTE" | "ABSOLUTETIME_FORMAT" => TimestampFormat::Absolute,
            "DATE" | "DATETIME_FORMAT" => TimestampFormat::Date,
            "UNIX_MILLIS" => TimestampFormat::UnixMillis,
            _ => TimestampFormat::Custom(spec.to_string()),
        }
    }
}
