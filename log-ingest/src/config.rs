use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("max_body_size cannot be 0")]
    InvalidBodyLimit,

    #[error("Sink timeout cannot be 0")]
    InvalidSinkTimeout,

    #[error("Empty project alias")]
    EmptyAlias,

    #[error("Project alias {0} maps to project id 0")]
    InvalidAliasTarget(String),
}

/// Log drain configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for the drain endpoints
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    pub admin_listener: Listener,
    /// Upper bound for a request body, compressed size, in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Where normalized records are submitted
    pub sink: SinkConfig,
    /// Opaque project id resolution
    #[serde(default)]
    pub tenants: TenantConfig,
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}

impl Config {
    /// Validates the drain configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.max_body_size == 0 {
            return Err(ValidationError::InvalidBodyLimit);
        }

        self.sink.validate()?;
        self.tenants.validate()
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Downstream sink for normalized records
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum SinkConfig {
    /// POST each record as JSON to a collector
    Http {
        url: Url,
        #[serde(default = "default_sink_timeout_secs")]
        timeout_secs: u64,
    },
    /// Emit each record as a structured log line of this process
    Log,
}

fn default_sink_timeout_secs() -> u64 {
    10
}

impl SinkConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            SinkConfig::Http { timeout_secs, .. } if *timeout_secs == 0 => {
                Err(ValidationError::InvalidSinkTimeout)
            }
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct TenantConfig {
    /// Verbose project ids accepted in addition to plain numeric ids
    #[serde(default)]
    pub aliases: HashMap<String, u64>,
}

impl TenantConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (alias, id) in &self.aliases {
            if alias.is_empty() {
                return Err(ValidationError::EmptyAlias);
            }
            if *id == 0 {
                return Err(ValidationError::InvalidAliasTarget(alias.clone()));
            }
        }
        Ok(())
    }
}
