//! Interpretation of Graph API history pages.

use reqwest::Url;
use serde::Serialize;
use serde_json::Value;

use crate::message::{MessageFields, NormalizedMessage};

/// Paging cursors of a history page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageCursors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryPage {
    pub messages: Vec<NormalizedMessage>,
    pub cursors: PageCursors,
}

/// Reads `messages.data[]` and `messages.paging` from a history response.
///
/// Entries without a string `id` are dropped. Cursors come from
/// `paging.cursors` and fall back to the `after`/`before` query parameter of
/// `paging.next`/`paging.previous`.
pub fn parse_history(response: &Value, now_millis: i64) -> HistoryPage {
    let messages = response.get("messages");
    let data = messages
        .and_then(|m| m.get("data"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let parsed = data
        .iter()
        .filter_map(|message| {
            MessageFields::read(message, now_millis).map(|fields| fields.into_message(message.clone()))
        })
        .collect();

    let paging = messages.and_then(|m| m.get("paging"));
    let cursors = PageCursors {
        after: cursor(paging, "after", "next"),
        before: cursor(paging, "before", "previous"),
    };

    HistoryPage {
        messages: parsed,
        cursors,
    }
}

fn cursor(paging: Option<&Value>, name: &str, link: &str) -> Option<String> {
    let paging = paging?;
    paging
        .get("cursors")
        .and_then(|cursors| cursors.get(name))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            paging
                .get(link)
                .and_then(Value::as_str)
                .and_then(|link| cursor_from_link(link, name))
        })
}

/// Returns the value of query parameter `name` in `link`, if `link` is a URL.
pub fn cursor_from_link(link: &str, name: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
