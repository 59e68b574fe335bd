use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a record's `timestamp_millis` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampSource {
    /// Parsed from the vendor's `timestamp` field.
    Vendor,
    /// The vendor value was missing or unparsable; ingestion time was used.
    Received,
}

/// Flat view of a single inbound WhatsApp message.
///
/// Records are produced by the webhook normalizer (or the history parser) and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMessage {
    pub id: String,
    pub from: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub timestamp_millis: i64,
    pub timestamp_source: TimestampSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub raw: Value,
}

pub(crate) const UNKNOWN_KIND: &str = "unknown";

/// Fields shared by webhook and history message objects.
pub(crate) struct MessageFields {
    pub id: String,
    pub from: Option<String>,
    pub kind: String,
    pub text: Option<String>,
    pub timestamp_millis: i64,
    pub timestamp_source: TimestampSource,
}

impl MessageFields {
    /// Reads the common fields, returning `None` when the object has no string `id`.
    pub(crate) fn read(message: &Value, now_millis: i64) -> Option<Self> {
        let object = message.as_object()?;
        let id = object.get("id")?.as_str()?.to_string();
        let from = object
            .get("from")
            .and_then(Value::as_str)
            .map(str::to_string);
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_KIND)
            .to_string();
        let text = if kind == "text" {
            object
                .get("text")
                .and_then(Value::as_object)
                .and_then(|text| text.get("body"))
                .and_then(Value::as_str)
                .map(str::to_string)
        } else {
            None
        };
        let (timestamp_millis, timestamp_source) = object
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(parse_vendor_timestamp)
            .map(|millis| (millis, TimestampSource::Vendor))
            .unwrap_or((now_millis, TimestampSource::Received));

        Some(Self {
            id,
            from,
            kind,
            text,
            timestamp_millis,
            timestamp_source,
        })
    }

    pub(crate) fn into_message(self, raw: Value) -> NormalizedMessage {
        NormalizedMessage {
            id: self.id,
            from: self.from,
            kind: self.kind,
            text: self.text,
            timestamp_millis: self.timestamp_millis,
            timestamp_source: self.timestamp_source,
            name: None,
            phone_number: None,
            raw,
        }
    }
}

/// Converts a vendor timestamp (decimal seconds as a string) to milliseconds.
///
/// Trailing garbage makes the value unparsable; it is never truncated to a
/// numeric prefix.
pub fn parse_vendor_timestamp(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()?.checked_mul(1000)
}
