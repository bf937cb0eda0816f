use crate::sink::SinkError;
use crate::tenant::TenantError;
use thiserror::Error;

/// Errors that abort the processing of a single drain request.
///
/// Every variant is terminal for its request and is reported to the caller as
/// a 400 with the `Display` text as body.
#[derive(Error, Debug)]
pub enum DrainError {
    #[error("failed to read request body: {0}")]
    BodyReadError(String),

    #[error("failed to decompress payload: {0}")]
    DecompressionError(String),

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("invalid project id: {0}")]
    InvalidTenantId(#[from] TenantError),

    #[error("failed to submit log: {0}")]
    SinkSubmitError(#[from] SinkError),
}

impl DrainError {
    /// Short label used for metric tags and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            DrainError::BodyReadError(_) => "body_read",
            DrainError::DecompressionError(_) => "decompression",
            DrainError::MalformedEnvelope(_) => "malformed_envelope",
            DrainError::InvalidEncoding(_) => "invalid_encoding",
            DrainError::InvalidTenantId(_) => "invalid_tenant_id",
            DrainError::SinkSubmitError(_) => "sink_submit",
        }
    }
}

/// Errors surfaced by the running service itself rather than by one request.
#[derive(Error, Debug)]
pub enum LogIngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink setup failed: {0}")]
    SinkSetup(#[from] SinkError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] crate::config::ValidationError),
}
