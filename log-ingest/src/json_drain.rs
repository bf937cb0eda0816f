//! Single-record JSON intake (`POST /v1/logs/json`).
//!
//! The body is one flat JSON object. `message`, `timestamp` and `level` are
//! read by name; every other top-level field with a string form becomes an
//! attribute. A body without a message is carried whole as the message text.
//! The owning project and the service name come from headers.

use crate::drain::{Drain, DrainContext, header_str};
use crate::errors::DrainError;
use crate::record::{self, LogRecord, SERVICE_NAME_ATTRIBUTE};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyper::body::Bytes;
use hyper::{Request, Response};
use serde::Deserialize;
use serde_json::{Map, Value};

pub const PROJECT_HEADER: &str = "x-highlight-project";
pub const SERVICE_HEADER: &str = "x-highlight-service";

/// Keys read by the typed parse; they are not repeated as attributes.
const TYPED_KEYS: &[&str] = &["message", "timestamp", "level", "attributes"];

#[derive(Deserialize, Debug, Default)]
struct JsonLog {
    message: Option<String>,
    timestamp: Option<JsonTimestamp>,
    level: Option<String>,
    attributes: Option<Map<String, Value>>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum JsonTimestamp {
    Millis(i64),
    Text(String),
}

impl JsonTimestamp {
    fn resolve(self, now: DateTime<Utc>) -> Result<DateTime<Utc>, DrainError> {
        match self {
            JsonTimestamp::Millis(millis) => record::timestamp_from_millis(millis),
            JsonTimestamp::Text(text) if text.is_empty() => Ok(now),
            JsonTimestamp::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| DrainError::MalformedEnvelope(format!("timestamp {text:?}: {e}"))),
        }
    }
}

/// Builds the record from a JSON body, without header enrichment.
///
/// `now` stands in for a missing timestamp.
pub fn parse_json_log(body: &[u8], now: DateTime<Utc>) -> Result<LogRecord, DrainError> {
    let typed: JsonLog = serde_json::from_slice(body)
        .map_err(|e| DrainError::MalformedEnvelope(e.to_string()))?;
    let fields: Map<String, Value> = serde_json::from_slice(body)
        .map_err(|e| DrainError::MalformedEnvelope(e.to_string()))?;

    let timestamp = match typed.timestamp {
        Some(ts) => ts.resolve(now)?,
        None => now,
    };

    let message = typed
        .message
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
    let mut log = LogRecord::new(message, timestamp)?.with_level(typed.level);

    for (key, value) in typed.attributes.iter().flatten() {
        log.set_json_attribute(key.as_str(), value);
    }

    for (key, value) in fields
        .iter()
        .filter(|(key, _)| !TYPED_KEYS.contains(&key.as_str()))
    {
        log.set_json_attribute(key.as_str(), value);
    }

    Ok(log)
}

pub struct JsonDrain {
    ctx: DrainContext,
}

impl JsonDrain {
    pub fn new(ctx: DrainContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Drain for JsonDrain {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn handle(&self, request: Request<Bytes>) -> Result<Response<Bytes>, DrainError> {
        let (parts, body) = request.into_parts();

        let mut log = parse_json_log(&body, Utc::now())?;
        let project_id = self
            .ctx
            .resolve_project(header_str(&parts.headers, PROJECT_HEADER))?;
        log.set_attribute(
            SERVICE_NAME_ATTRIBUTE,
            header_str(&parts.headers, SERVICE_HEADER),
        );

        self.ctx.submit(self.name(), project_id, log).await?;
        tracing::debug!(project_id = %project_id, "Accepted json log");

        Ok(Response::new(Bytes::new()))
    }
}
