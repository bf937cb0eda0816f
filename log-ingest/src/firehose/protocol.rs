//! Wire types of the firehose HTTP delivery and of CloudWatch Logs
//! subscription payloads.

use serde::{Deserialize, Serialize};

/// Header carrying the per-stream common attributes as JSON.
pub const COMMON_ATTRIBUTES_HEADER: &str = "x-amz-firehose-common-attributes";

/// Common attribute naming the owning project.
pub const PROJECT_ATTRIBUTE: &str = "x-highlight-project";

/// Outer request body of one firehose delivery.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchEnvelope {
    #[serde(default)]
    pub request_id: Option<String>,
    /// Epoch milliseconds
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub records: Vec<BatchRecord>,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct BatchRecord {
    /// Base64 of the record, possibly gzip compressed
    pub data: String,
}

/// CloudWatch Logs subscription payload found inside a batch record.
///
/// Every field is optional; any JSON object is accepted. Keys are matched in
/// camelCase or PascalCase.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SubEnvelope {
    #[serde(alias = "MessageType")]
    pub message_type: String,
    #[serde(alias = "Owner")]
    pub owner: String,
    #[serde(alias = "LogGroup")]
    pub log_group: String,
    #[serde(alias = "LogStream")]
    pub log_stream: String,
    #[serde(alias = "SubscriptionFilters")]
    pub subscription_filters: Vec<String>,
    #[serde(alias = "LogEvents")]
    pub log_events: Vec<LogEvent>,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct LogEvent {
    #[serde(alias = "Id")]
    pub id: String,
    /// Epoch milliseconds
    #[serde(alias = "Timestamp")]
    pub timestamp: i64,
    #[serde(alias = "Message")]
    pub message: String,
}

/// `{"commonAttributes": {"x-highlight-project": "<id>"}}`
#[derive(Deserialize, Debug, Default)]
pub struct CommonAttributesHeader {
    #[serde(rename = "commonAttributes", default)]
    pub common_attributes: CommonAttributes,
}

#[derive(Deserialize, Debug, Default)]
pub struct CommonAttributes {
    #[serde(rename = "x-highlight-project", default)]
    pub project_id: String,
}

/// Acknowledgement expected by the delivery stream.
#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResponse {
    pub request_id: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}
