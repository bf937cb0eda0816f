//! Batched firehose intake (`POST /v1/logs/firehose`).
//!
//! A delivery carries a JSON envelope of base64 records. Each record is either
//! a CloudWatch Logs subscription payload, unpacked into one log per event,
//! or an arbitrary payload kept as a single raw log. The first failing record
//! aborts the rest of the batch; records submitted before it stay submitted.

mod decode;
mod handler;
pub mod protocol;

pub use decode::{Payload, classify, decode_record};
pub use handler::FirehoseDrain;
