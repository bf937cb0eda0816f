//! Downstream log sinks.
//!
//! A sink accepts one canonical record at a time. Ownership of the record moves
//! into the sink on submit; the drains never retry a failed submission.

use crate::config::SinkConfig;
use crate::record::LogRecord;
use crate::tenant::ProjectId;
use async_trait::async_trait;
use http::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("sink request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("sink rejected log with status {0}")]
    Rejected(StatusCode),
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait LogSink: Send + Sync {
    async fn submit(&self, project_id: ProjectId, record: LogRecord) -> Result<(), SinkError>;

    fn is_ready(&self) -> bool {
        true
    }
}

pub fn from_config(config: &SinkConfig) -> Result<Arc<dyn LogSink>, SinkError> {
    match config {
        SinkConfig::Http { url, timeout_secs } => Ok(Arc::new(HttpSink::new(
            url.clone(),
            Duration::from_secs(*timeout_secs),
        )?)),
        SinkConfig::Log => Ok(Arc::new(TracingSink)),
    }
}

#[derive(Serialize)]
struct SinkPayload<'a> {
    project_id: ProjectId,
    log: &'a LogRecord,
}

/// Posts every record as a JSON document to a collector endpoint.
pub struct HttpSink {
    client: reqwest::Client,
    url: Url,
}

impl HttpSink {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl LogSink for HttpSink {
    async fn submit(&self, project_id: ProjectId, record: LogRecord) -> Result<(), SinkError> {
        let payload = SinkPayload {
            project_id,
            log: &record,
        };

        let response = self
            .client
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            status => Err(SinkError::Rejected(status)),
        }
    }
}

/// Writes records into this process' own log output.
pub struct TracingSink;

#[async_trait]
impl LogSink for TracingSink {
    async fn submit(&self, project_id: ProjectId, record: LogRecord) -> Result<(), SinkError> {
        let attributes = serde_json::to_string(&record.attributes)
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;

        tracing::info!(
            target: "log_ingest::sink",
            project_id = %project_id,
            timestamp = %record.formatted_timestamp(),
            level = %record.level,
            attributes = %attributes,
            "{}",
            record.message
        );
        Ok(())
    }
}
