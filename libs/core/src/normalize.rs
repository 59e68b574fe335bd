//! Webhook envelope normalization.
//!
//! Meta posts `{ entry: [ { changes: [ { value: { messages, contacts } } ] } ] }`.
//! The walk below never fails: any branch that does not have the expected
//! shape is skipped and reported as a [`SkippedFragment`], while its siblings
//! keep being processed.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::message::{MessageFields, NormalizedMessage};

/// Why a fragment of the envelope was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotAnObject,
    MissingEntries,
    MissingChanges,
    MissingValue,
    MissingMessages,
    MissingId,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotAnObject => "not_an_object",
            SkipReason::MissingEntries => "missing_entries",
            SkipReason::MissingChanges => "missing_changes",
            SkipReason::MissingValue => "missing_value",
            SkipReason::MissingMessages => "missing_messages",
            SkipReason::MissingId => "missing_id",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A branch of the payload that produced no message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFragment {
    pub path: String,
    pub reason: SkipReason,
}

/// Result of normalizing one webhook delivery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub messages: Vec<NormalizedMessage>,
    pub skipped: Vec<SkippedFragment>,
}

impl Normalized {
    fn skip(&mut self, path: impl Into<String>, reason: SkipReason) {
        self.skipped.push(SkippedFragment {
            path: path.into(),
            reason,
        });
    }
}

/// Normalizes a webhook body. `now_millis` is used for messages whose vendor
/// timestamp is missing or unparsable.
pub fn normalize_webhook(payload: &Value, now_millis: i64) -> Normalized {
    let mut out = Normalized::default();

    let Some(root) = payload.as_object() else {
        out.skip("$", SkipReason::NotAnObject);
        return out;
    };
    let Some(entries) = root.get("entry").and_then(Value::as_array) else {
        out.skip("entry", SkipReason::MissingEntries);
        return out;
    };

    for (entry_idx, entry) in entries.iter().enumerate() {
        let entry_path = format!("entry[{entry_idx}]");
        let Some(changes) = entry.get("changes").and_then(Value::as_array) else {
            out.skip(entry_path, SkipReason::MissingChanges);
            continue;
        };

        for (change_idx, change) in changes.iter().enumerate() {
            let change_path = format!("{entry_path}.changes[{change_idx}]");
            let Some(value) = change.get("value").and_then(Value::as_object) else {
                out.skip(format!("{change_path}.value"), SkipReason::MissingValue);
                continue;
            };
            let Some(messages) = value.get("messages").and_then(Value::as_array) else {
                out.skip(
                    format!("{change_path}.value.messages"),
                    SkipReason::MissingMessages,
                );
                continue;
            };
            let contacts = value
                .get("contacts")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();

            for (message_idx, message) in messages.iter().enumerate() {
                let message_path = format!("{change_path}.value.messages[{message_idx}]");
                if !message.is_object() {
                    out.skip(message_path, SkipReason::NotAnObject);
                    continue;
                }
                let Some(fields) = MessageFields::read(message, now_millis) else {
                    out.skip(message_path, SkipReason::MissingId);
                    continue;
                };
                let contact = fields
                    .from
                    .as_deref()
                    .and_then(|from| find_contact(contacts, from));
                let mut normalized = fields.into_message(message.clone());
                if let Some(contact) = contact {
                    normalized.name = contact
                        .get("profile")
                        .and_then(|profile| profile.get("name"))
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    normalized.phone_number = contact
                        .get("wa_id")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                }
                out.messages.push(normalized);
            }
        }
    }

    out
}

fn find_contact<'a>(contacts: &'a [Value], wa_id: &str) -> Option<&'a Map<String, Value>> {
    contacts
        .iter()
        .filter_map(Value::as_object)
        .find(|contact| contact.get("wa_id").and_then(Value::as_str) == Some(wa_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::TimestampSource;
    use serde_json::json;

    const NOW: i64 = 1_234_567;

    fn envelope(messages: Value, contacts: Value) -> Value {
        json!({
            "object": "whatsapp_business_account",
            "entry": [
                {"id": "waba", "changes": [
                    {"field": "messages", "value": {
                        "messaging_product": "whatsapp",
                        "contacts": contacts,
                        "messages": messages
                    }}
                ]}
            ]
        })
    }

    #[test]
    fn non_envelopes_yield_nothing() {
        for payload in [
            json!(null),
            json!(42),
            json!("entry"),
            json!([{"entry": []}]),
            json!({}),
            json!({"entry": {"changes": []}}),
        ] {
            let out = normalize_webhook(&payload, NOW);
            assert!(out.messages.is_empty(), "payload {payload} produced messages");
            assert_eq!(out.skipped.len(), 1);
        }
    }

    #[test]
    fn text_message_with_contact_is_fully_resolved() {
        let payload = envelope(
            json!([{
                "id": "m1",
                "from": "15551234567",
                "type": "text",
                "text": {"body": "hi"},
                "timestamp": "1700000000"
            }]),
            json!([{"wa_id": "15551234567", "profile": {"name": "Alice"}}]),
        );

        let out = normalize_webhook(&payload, NOW);
        assert_eq!(out.messages.len(), 1);
        assert!(out.skipped.is_empty());
        let message = &out.messages[0];
        assert_eq!(message.id, "m1");
        assert_eq!(message.from.as_deref(), Some("15551234567"));
        assert_eq!(message.kind, "text");
        assert_eq!(message.text.as_deref(), Some("hi"));
        assert_eq!(message.timestamp_millis, 1_700_000_000_000);
        assert_eq!(message.timestamp_source, TimestampSource::Vendor);
        assert_eq!(message.name.as_deref(), Some("Alice"));
        assert_eq!(message.phone_number.as_deref(), Some("15551234567"));
        assert_eq!(message.raw["text"]["body"], "hi");
    }

    #[test]
    fn message_without_id_is_dropped_but_siblings_survive() {
        let payload = envelope(
            json!([
                {"id": "a", "from": "1", "type": "text", "text": {"body": "one"}},
                {"from": "2", "type": "text", "text": {"body": "lost"}},
                {"id": 7, "from": "3"},
                "not a message",
                {"id": "b", "from": "4"}
            ]),
            json!([]),
        );

        let out = normalize_webhook(&payload, NOW);
        let ids: Vec<_> = out.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(
            out.skipped,
            vec![
                SkippedFragment {
                    path: "entry[0].changes[0].value.messages[1]".into(),
                    reason: SkipReason::MissingId,
                },
                SkippedFragment {
                    path: "entry[0].changes[0].value.messages[2]".into(),
                    reason: SkipReason::MissingId,
                },
                SkippedFragment {
                    path: "entry[0].changes[0].value.messages[3]".into(),
                    reason: SkipReason::NotAnObject,
                },
            ]
        );
    }

    #[test]
    fn malformed_entries_and_changes_do_not_abort_the_walk() {
        let payload = json!({
            "entry": [
                {"id": "no-changes"},
                {"changes": [
                    {"value": "status update"},
                    {"value": {"statuses": []}},
                    {"value": {"messages": [{"id": "kept", "timestamp": "10"}]}}
                ]}
            ]
        });

        let out = normalize_webhook(&payload, NOW);
        assert_eq!(out.messages.len(), 1);
        assert_eq!(out.messages[0].id, "kept");
        assert_eq!(out.messages[0].timestamp_millis, 10_000);
        let reasons: Vec<_> = out.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            [
                SkipReason::MissingChanges,
                SkipReason::MissingValue,
                SkipReason::MissingMessages
            ]
        );
    }

    #[test]
    fn defaults_apply_when_optional_fields_are_missing() {
        let payload = envelope(json!([{"id": "m", "from": 15551234567u64}]), json!(null));

        let out = normalize_webhook(&payload, NOW);
        let message = &out.messages[0];
        assert_eq!(message.from, None);
        assert_eq!(message.kind, "unknown");
        assert_eq!(message.text, None);
        assert_eq!(message.timestamp_millis, NOW);
        assert_eq!(message.timestamp_source, TimestampSource::Received);
        assert_eq!(message.name, None);
        assert_eq!(message.phone_number, None);
    }

    #[test]
    fn unparsable_timestamp_falls_back_to_now() {
        let payload = envelope(json!([{"id": "m", "timestamp": "yesterday"}]), json!([]));
        let message = &normalize_webhook(&payload, NOW).messages[0];
        assert_eq!(message.timestamp_millis, NOW);
        assert_eq!(message.timestamp_source, TimestampSource::Received);
    }

    #[test]
    fn text_requires_text_type_and_object_body() {
        let payload = envelope(
            json!([
                {"id": "a", "type": "text", "text": "flat"},
                {"id": "b", "type": "text", "text": {}},
                {"id": "c", "type": "reaction", "text": {"body": "x"}}
            ]),
            json!([]),
        );
        let out = normalize_webhook(&payload, NOW);
        assert!(out.messages.iter().all(|m| m.text.is_none()));
    }

    #[test]
    fn first_matching_contact_wins_and_missing_profile_is_tolerated() {
        let payload = envelope(
            json!([{"id": "m", "from": "99"}]),
            json!([
                "garbage",
                {"wa_id": "11", "profile": {"name": "Other"}},
                {"wa_id": "99"},
                {"wa_id": "99", "profile": {"name": "Second"}}
            ]),
        );
        let message = &normalize_webhook(&payload, NOW).messages[0];
        assert_eq!(message.name, None);
        assert_eq!(message.phone_number.as_deref(), Some("99"));
    }

    #[test]
    fn order_is_preserved_across_entries_and_changes() {
        let payload = json!({
            "entry": [
                {"changes": [
                    {"value": {"messages": [{"id": "1"}, {"id": "2"}]}},
                    {"value": {"messages": [{"id": "3"}]}}
                ]},
                {"changes": [
                    {"value": {"messages": [{"id": "4"}, {"id": "1"}]}}
                ]}
            ]
        });
        let ids: Vec<_> = normalize_webhook(&payload, NOW)
            .messages
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, ["1", "2", "3", "4", "1"]);
    }
}
