//! Resolution of opaque, externally visible project ids into internal ids.

use crate::config::TenantConfig;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Internal numeric project identifier used to route records in the sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProjectId(u64);

impl ProjectId {
    pub fn new(id: u64) -> Option<Self> {
        (id != 0).then_some(Self(id))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TenantError {
    #[error("project id is missing")]
    Missing,
    #[error("{0:?} is not a valid project id")]
    Malformed(String),
    #[error("{0:?} does not match any project")]
    Unknown(String),
    #[error("invalid common attributes header: {0}")]
    InvalidAttributes(String),
}

/// Decodes an opaque project identifier.
pub trait TenantCodec: Send + Sync {
    fn decode(&self, verbose_id: &str) -> Result<ProjectId, TenantError>;
}

/// Resolves an opaque id with the given codec. Empty ids never reach the codec.
pub fn resolve(codec: &dyn TenantCodec, opaque_id: &str) -> Result<ProjectId, TenantError> {
    if opaque_id.is_empty() {
        return Err(TenantError::Missing);
    }
    codec.decode(opaque_id)
}

/// Accepts plain base-10 project ids and the verbose aliases from the config.
#[derive(Debug, Default)]
pub struct VerboseIdCodec {
    aliases: HashMap<String, ProjectId>,
}

impl VerboseIdCodec {
    pub fn new(aliases: HashMap<String, ProjectId>) -> Self {
        Self { aliases }
    }

    /// Aliases mapped to 0 are skipped; config validation rejects them upfront.
    pub fn from_config(config: &TenantConfig) -> Self {
        let aliases = config
            .aliases
            .iter()
            .filter_map(|(alias, id)| ProjectId::new(*id).map(|id| (alias.clone(), id)))
            .collect();
        Self::new(aliases)
    }
}

impl TenantCodec for VerboseIdCodec {
    fn decode(&self, verbose_id: &str) -> Result<ProjectId, TenantError> {
        if let Some(id) = self.aliases.get(verbose_id) {
            return Ok(*id);
        }

        if !verbose_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TenantError::Unknown(verbose_id.to_string()));
        }

        verbose_id
            .parse::<u64>()
            .ok()
            .and_then(ProjectId::new)
            .ok_or_else(|| TenantError::Malformed(verbose_id.to_string()))
    }
}
