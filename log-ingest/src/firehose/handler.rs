use crate::drain::{Drain, DrainContext, header_str};
use crate::errors::DrainError;
use crate::firehose::decode::{self, Payload};
use crate::firehose::protocol::{
    BatchEnvelope, COMMON_ATTRIBUTES_HEADER, CommonAttributesHeader, DeliveryResponse,
};
use crate::record;
use crate::tenant::{ProjectId, TenantError};
use async_trait::async_trait;
use chrono::Utc;
use http::HeaderMap;
use http::header::{CONTENT_ENCODING, CONTENT_TYPE, HeaderValue};
use hyper::body::Bytes;
use hyper::{Request, Response};
use uuid::Uuid;

pub struct FirehoseDrain {
    ctx: DrainContext,
}

impl FirehoseDrain {
    pub fn new(ctx: DrainContext) -> Self {
        Self { ctx }
    }

    fn project_id(&self, headers: &HeaderMap) -> Result<ProjectId, DrainError> {
        let raw = headers
            .get(COMMON_ATTRIBUTES_HEADER)
            .ok_or_else(|| TenantError::InvalidAttributes("header is missing".to_string()))?;
        let attributes: CommonAttributesHeader = serde_json::from_slice(raw.as_bytes())
            .map_err(|e| TenantError::InvalidAttributes(e.to_string()))?;
        self.ctx
            .resolve_project(&attributes.common_attributes.project_id)
    }

    /// Decodes one batch record and submits what it holds, in order.
    ///
    /// `batch_timestamp` (epoch millis) is only read for raw payloads.
    async fn process_record(
        &self,
        project_id: ProjectId,
        data: &str,
        batch_timestamp: Option<i64>,
    ) -> Result<usize, DrainError> {
        let payload = decode::decode_record(data, self.ctx.max_body_size())?;
        match decode::classify(&payload) {
            Payload::Structured(envelope) => {
                for event in &envelope.log_events {
                    let log = envelope.event_record(event, &payload)?;
                    self.ctx.submit(self.name(), project_id, log).await?;
                }
                Ok(envelope.log_events.len())
            }
            Payload::Raw(raw) => {
                let timestamp = match batch_timestamp {
                    Some(millis) => record::timestamp_from_millis(millis)?,
                    None => Utc::now(),
                };
                let Some(log) = decode::raw_record(raw, timestamp)? else {
                    return Ok(0);
                };
                self.ctx.submit(self.name(), project_id, log).await?;
                Ok(1)
            }
        }
    }
}

/// Body with any `content-encoding: gzip` layer removed, inflated to at most
/// `limit` bytes.
fn decompress_body<'a>(
    headers: &HeaderMap,
    body: &'a Bytes,
    limit: usize,
) -> Result<std::borrow::Cow<'a, [u8]>, DrainError> {
    let gzipped = header_str(headers, CONTENT_ENCODING.as_str())
        .trim()
        .eq_ignore_ascii_case("gzip");
    if gzipped {
        Ok(decode::gunzip(body, limit)?.into())
    } else {
        Ok(body.as_ref().into())
    }
}

#[async_trait]
impl Drain for FirehoseDrain {
    fn name(&self) -> &'static str {
        "firehose"
    }

    async fn handle(&self, request: Request<Bytes>) -> Result<Response<Bytes>, DrainError> {
        let (parts, body) = request.into_parts();

        let body = decompress_body(&parts.headers, &body, self.ctx.max_body_size())?;
        let envelope: BatchEnvelope = serde_json::from_slice(&body)
            .map_err(|e| DrainError::MalformedEnvelope(e.to_string()))?;

        let request_id = envelope
            .request_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let project_id = self.project_id(&parts.headers)?;

        let mut submitted = 0;
        for (index, batch_record) in envelope.records.iter().enumerate() {
            submitted += self
                .process_record(project_id, &batch_record.data, envelope.timestamp)
                .await
                .inspect_err(|e| {
                    tracing::warn!(
                        request_id = %request_id,
                        record_index = index,
                        error = %e,
                        "Aborting firehose batch"
                    );
                })?;
        }
        tracing::debug!(
            request_id = %request_id,
            records = envelope.records.len(),
            submitted,
            "Accepted firehose batch"
        );

        let ack = DeliveryResponse {
            request_id,
            timestamp: Utc::now().timestamp_millis(),
        };
        let body = serde_json::to_vec(&ack)
            .map_err(|e| DrainError::MalformedEnvelope(e.to_string()))?;

        let mut response = Response::new(Bytes::from(body));
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(response)
    }
}
