use crate::errors::DrainError;
use crate::metrics_defs::RECORDS_SUBMITTED;
use crate::record::LogRecord;
use crate::sink::LogSink;
use crate::tenant::{self, ProjectId, TenantCodec};
use async_trait::async_trait;
use http::HeaderMap;
use hyper::body::Bytes;
use hyper::{Request, Response};
use std::sync::Arc;

/// One ingestion entry point accepting a specific wire format.
///
/// The drain receives the fully read request body and either returns the
/// response to send, or the first error that aborted processing. Records are
/// submitted to the sink while the request is being processed, in order.
#[async_trait]
pub trait Drain: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, request: Request<Bytes>) -> Result<Response<Bytes>, DrainError>;
}

/// Collaborators shared by all drains of one service.
#[derive(Clone)]
pub struct DrainContext {
    codec: Arc<dyn TenantCodec>,
    sink: Arc<dyn LogSink>,
    max_body_size: usize,
}

impl DrainContext {
    pub fn new(
        codec: Arc<dyn TenantCodec>,
        sink: Arc<dyn LogSink>,
        max_body_size: usize,
    ) -> Self {
        Self {
            codec,
            sink,
            max_body_size,
        }
    }

    /// Upper bound for any payload a drain inflates, in bytes.
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// Resolves the opaque project id and records it on the current request span.
    pub fn resolve_project(&self, opaque_id: &str) -> Result<ProjectId, DrainError> {
        let project_id = tenant::resolve(self.codec.as_ref(), opaque_id).inspect_err(|e| {
            tracing::warn!(project_verbose_id = %opaque_id, error = %e, "Unresolvable project id");
        })?;
        tracing::Span::current().record("project_id", project_id.value());
        Ok(project_id)
    }

    pub async fn submit(
        &self,
        drain: &'static str,
        project_id: ProjectId,
        record: LogRecord,
    ) -> Result<(), DrainError> {
        self.sink.submit(project_id, record).await?;
        shared::counter!(RECORDS_SUBMITTED, "drain" => drain).increment(1);
        Ok(())
    }
}

/// Header value as text; missing or non-UTF-8 values read as empty.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}
