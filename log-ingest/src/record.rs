//! Canonical log record shared by all drains.
//!
//! Every drain normalizes its wire format into a [`LogRecord`] before handing
//! it to the sink. The builder enforces that the message is non-empty and that
//! the timestamp is a valid UTC instant.

use crate::errors::DrainError;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;

/// Level used when the source payload carries none.
pub const DEFAULT_LEVEL: &str = "info";

/// Millisecond precision, always rendered in UTC with a literal `Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Attribute key holding the emitting service.
pub const SERVICE_NAME_ATTRIBUTE: &str = "service_name";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogRecord {
    pub message: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub attributes: HashMap<String, String>,
}

impl LogRecord {
    pub fn new(
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, DrainError> {
        let message = message.into();
        if message.is_empty() {
            return Err(DrainError::MalformedEnvelope(
                "log message is empty".to_string(),
            ));
        }

        Ok(Self {
            message,
            timestamp,
            level: DEFAULT_LEVEL.to_string(),
            attributes: HashMap::new(),
        })
    }

    /// Sets the level, keeping the default for a missing or blank value.
    pub fn with_level(mut self, level: Option<String>) -> Self {
        if let Some(level) = level.filter(|l| !l.is_empty()) {
            self.level = level;
        }
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Inserts or overwrites an attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Coerces and inserts a JSON value; values without a string form are dropped.
    pub fn set_json_attribute(&mut self, key: impl Into<String>, value: &Value) {
        if let Some(value) = coerce_attribute(value) {
            self.set_attribute(key, value);
        }
    }

    pub fn formatted_timestamp(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn serialize_timestamp<S: Serializer>(
    timestamp: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&timestamp.format(TIMESTAMP_FORMAT))
}

/// Converts epoch milliseconds into a UTC instant.
pub fn timestamp_from_millis(millis: i64) -> Result<DateTime<Utc>, DrainError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        DrainError::MalformedEnvelope(format!("timestamp {millis} is out of range"))
    })
}

/// String form of an attribute value.
///
/// Strings are copied, integers are rendered in base 10 and floats in
/// scientific notation. Booleans, nulls, arrays and objects have no string
/// form and yield `None`.
pub fn coerce_attribute(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(format_scientific)
            }
        }
        _ => None,
    }
}

/// Shortest round-trip mantissa with a signed, two digit minimum exponent,
/// e.g. `1.5E+00` or `2.5E-07`.
pub fn format_scientific(value: f64) -> String {
    let formatted = format!("{value:E}");
    let Some((mantissa, exponent)) = formatted.split_once('E') else {
        return formatted;
    };

    match exponent.parse::<i32>() {
        Ok(exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}E{sign}{:02}", exp.unsigned_abs())
        }
        Err(_) => formatted,
    }
}
