use crate::drain::DrainContext;
use crate::record::LogRecord;
use crate::sink::{LogSink, SinkError};
use crate::tenant::{ProjectId, VerboseIdCodec};
use async_trait::async_trait;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Sink that keeps every submitted record. Fails once `fail_after` records
/// have been accepted, when set.
#[derive(Default)]
pub struct RecordingSink {
    records: Mutex<Vec<(ProjectId, LogRecord)>>,
    fail_after: Option<usize>,
}

impl RecordingSink {
    pub fn failing_after(accepted: usize) -> Self {
        Self {
            records: Mutex::default(),
            fail_after: Some(accepted),
        }
    }

    pub fn records(&self) -> Vec<(ProjectId, LogRecord)> {
        self.records.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .map(|(_, record)| record.message)
            .collect()
    }
}

#[async_trait]
impl LogSink for RecordingSink {
    async fn submit(&self, project_id: ProjectId, record: LogRecord) -> Result<(), SinkError> {
        let mut records = self.records.lock().unwrap();
        if self.fail_after.is_some_and(|limit| records.len() >= limit) {
            return Err(SinkError::Unavailable("sink is full".to_string()));
        }
        records.push((project_id, record));
        Ok(())
    }
}

/// Inflation limit of [`test_context`].
pub const TEST_BODY_LIMIT: usize = 64 * 1024;

/// Context resolving numeric ids plus the `acme-prod` alias (project 42).
pub fn test_context(sink: Arc<RecordingSink>) -> DrainContext {
    let codec = VerboseIdCodec::new(HashMap::from([(
        "acme-prod".to_string(),
        ProjectId::new(42).unwrap(),
    )]));
    DrainContext::new(Arc::new(codec), sink, TEST_BODY_LIMIT)
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}
