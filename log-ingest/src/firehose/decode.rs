//! Decoding of a single batch record into canonical records.
//!
//! A record goes through base64, an optional gzip layer, and a shape sniff
//! deciding whether it holds a subscription payload or a raw log line.

use crate::errors::DrainError;
use crate::firehose::protocol::{LogEvent, SubEnvelope};
use crate::record::{self, LogRecord, SERVICE_NAME_ATTRIBUTE};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use flate2::read::MultiGzDecoder;
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Service name given to records unpacked from subscription payloads.
pub const SUBSCRIPTION_SERVICE_NAME: &str = "firehose";

/// Shape of a decoded batch record.
#[derive(Debug, PartialEq)]
pub enum Payload<'a> {
    /// A subscription payload; one record per log event
    Structured(SubEnvelope),
    /// Anything else; one record carrying the payload text
    Raw(&'a [u8]),
}

/// Decompresses a complete gzip stream, including concatenated members.
///
/// Output larger than `limit` bytes is an error; inflation stops right after
/// the limit is crossed.
pub fn gunzip(data: &[u8], limit: usize) -> Result<Vec<u8>, DrainError> {
    let mut decompressed = Vec::new();
    MultiGzDecoder::new(data)
        .take(limit as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| DrainError::DecompressionError(e.to_string()))?;

    if decompressed.len() > limit {
        return Err(DrainError::DecompressionError(format!(
            "decompressed payload exceeds {limit} bytes"
        )));
    }
    Ok(decompressed)
}

/// Base64-decodes a record and strips its gzip layer when there is one.
///
/// Data without the gzip magic is returned as is. Data with the magic but a
/// broken stream, or inflating past `limit` bytes, is an error.
pub fn decode_record(data: &str, limit: usize) -> Result<Vec<u8>, DrainError> {
    let decoded = STANDARD
        .decode(data.as_bytes())
        .map_err(|e| DrainError::InvalidEncoding(format!("invalid base64: {e}")))?;

    if decoded.starts_with(&GZIP_MAGIC) {
        gunzip(&decoded, limit)
    } else {
        Ok(decoded)
    }
}

/// Sniffs the payload shape. Any JSON object is a subscription payload.
pub fn classify(payload: &[u8]) -> Payload<'_> {
    // serde would also map a JSON array onto the struct
    if payload.trim_ascii_start().first() != Some(&b'{') {
        return Payload::Raw(payload);
    }
    match serde_json::from_slice::<SubEnvelope>(payload) {
        Ok(envelope) => Payload::Structured(envelope),
        Err(_) => Payload::Raw(payload),
    }
}

impl SubEnvelope {
    /// Record for one of this payload's log events.
    ///
    /// An event without a message carries `payload`, the subscription payload
    /// text, instead.
    pub fn event_record(
        &self,
        event: &LogEvent,
        payload: &[u8],
    ) -> Result<LogRecord, DrainError> {
        let timestamp = record::timestamp_from_millis(event.timestamp)?;
        let message = match event.message.as_str() {
            "" => String::from_utf8_lossy(payload).into_owned(),
            message => message.to_string(),
        };
        Ok(LogRecord::new(message, timestamp)?
            .with_attribute(SERVICE_NAME_ATTRIBUTE, SUBSCRIPTION_SERVICE_NAME)
            .with_attribute("message_type", self.message_type.as_str())
            .with_attribute("owner", self.owner.as_str())
            .with_attribute("log_group", self.log_group.as_str())
            .with_attribute("log_stream", self.log_stream.as_str()))
    }
}

/// Record for a payload that is not a subscription payload. An empty payload
/// holds no log line and yields no record.
pub fn raw_record(
    payload: &[u8],
    timestamp: DateTime<Utc>,
) -> Result<Option<LogRecord>, DrainError> {
    if payload.is_empty() {
        return Ok(None);
    }
    LogRecord::new(String::from_utf8_lossy(payload), timestamp).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::gzip;
    use chrono::TimeZone;

    const LIMIT: usize = 1024;

    fn encode(data: &[u8]) -> String {
        STANDARD.encode(data)
    }

    #[test]
    fn test_decode_plain_record() {
        let decoded = decode_record(&encode(b"plain log line"), LIMIT).unwrap();
        assert_eq!(decoded, b"plain log line");
    }

    #[test]
    fn test_decode_gzip_record() {
        let decoded = decode_record(&encode(&gzip(b"compressed line")), LIMIT).unwrap();
        assert_eq!(decoded, b"compressed line");
    }

    #[test]
    fn test_decode_concatenated_gzip_members() {
        let mut data = gzip(b"first ");
        data.extend(gzip(b"second"));
        assert_eq!(decode_record(&encode(&data), LIMIT).unwrap(), b"first second");
    }

    #[test]
    fn test_decode_inflation_limit() {
        let at_limit = vec![b'x'; LIMIT];
        let decoded = decode_record(&encode(&gzip(&at_limit)), LIMIT).unwrap();
        assert_eq!(decoded.len(), LIMIT);

        // A few hundred bytes of gzip inflating to a megabyte
        let bomb = gzip(&vec![b'x'; 1024 * 1024]);
        assert!(bomb.len() < 4 * LIMIT);
        let result = decode_record(&encode(&bomb), LIMIT);
        assert!(matches!(result, Err(DrainError::DecompressionError(_))));

        // Plain records are bounded by the body limit already
        let decoded = decode_record(&encode(&vec![b'x'; 2 * LIMIT]), LIMIT).unwrap();
        assert_eq!(decoded.len(), 2 * LIMIT);
    }

    #[test]
    fn test_decode_invalid_base64() {
        let result = decode_record("not base64!", LIMIT);
        assert!(matches!(result, Err(DrainError::InvalidEncoding(_))));
    }

    #[test]
    fn test_decode_truncated_gzip() {
        let compressed = gzip(b"a log line long enough to be cut in half");
        let truncated = &compressed[..compressed.len() / 2];
        let result = decode_record(&encode(truncated), LIMIT);
        assert!(matches!(result, Err(DrainError::DecompressionError(_))));
    }

    #[test]
    fn test_classify() {
        let payload = br#"{"messageType":"DATA_MESSAGE","logEvents":[{"id":"1","timestamp":1,"message":"m"}]}"#;
        match classify(payload) {
            Payload::Structured(envelope) => assert_eq!(envelope.log_events.len(), 1),
            Payload::Raw(_) => panic!("expected a structured payload"),
        }

        // Any object matches, even without subscription fields
        assert_eq!(
            classify(br#"{"msg":"hi"}"#),
            Payload::Structured(SubEnvelope::default())
        );

        for raw in [
            &b"plain text"[..],
            b"[]",
            b"[1,2,3]",
            b"\"a string\"",
            b"null",
            b"{\"logEvents\": 5}",
        ] {
            assert_eq!(classify(raw), Payload::Raw(raw));
        }
    }

    #[test]
    fn test_event_record() {
        let envelope = SubEnvelope {
            message_type: "DATA_MESSAGE".to_string(),
            owner: "123456789012".to_string(),
            log_group: "/aws/lambda/checkout".to_string(),
            log_stream: "stream-1".to_string(),
            subscription_filters: vec![],
            log_events: vec![],
        };
        let event = LogEvent {
            id: "1".to_string(),
            timestamp: 1_700_000_000_123,
            message: "started".to_string(),
        };

        let log = envelope.event_record(&event, b"{}").unwrap();
        assert_eq!(log.message, "started");
        assert_eq!(log.level, "info");
        assert_eq!(log.formatted_timestamp(), "2023-11-14T22:13:20.123Z");
        assert_eq!(log.attributes.len(), 5);
        assert_eq!(log.attributes["service_name"], "firehose");
        assert_eq!(log.attributes["message_type"], "DATA_MESSAGE");
        assert_eq!(log.attributes["owner"], "123456789012");
        assert_eq!(log.attributes["log_group"], "/aws/lambda/checkout");
        assert_eq!(log.attributes["log_stream"], "stream-1");
    }

    #[test]
    fn test_event_without_message_carries_payload() {
        let payload = br#"{"logGroup":"g","logEvents":[{"id":"1","timestamp":1700000000000,"message":""}]}"#;
        let Payload::Structured(envelope) = classify(payload) else {
            panic!("expected a structured payload");
        };

        let log = envelope
            .event_record(&envelope.log_events[0], payload)
            .unwrap();
        assert_eq!(log.message.as_bytes(), payload);
        assert_eq!(log.attributes["log_group"], "g");
    }

    #[test]
    fn test_raw_record() {
        let fallback = Utc.timestamp_millis_opt(1_578_090_901_599).unwrap();
        let log = raw_record(b"plain text\n", fallback).unwrap().unwrap();
        assert_eq!(log.message, "plain text\n");
        assert_eq!(log.timestamp, fallback);
        assert_eq!(log.level, "info");
        assert!(log.attributes.is_empty());

        assert_eq!(raw_record(b"", fallback).unwrap(), None);

        let log = raw_record(b"\xffbroken utf-8", fallback).unwrap().unwrap();
        assert_eq!(log.message, "\u{fffd}broken utf-8");
    }
}
