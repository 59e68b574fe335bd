//! Validation of history (Graph API) requests.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Request body accepted by the history proxy, before validation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub phone_number_id: Option<String>,
    /// Any JSON number; only positive integers pass validation.
    #[serde(default)]
    pub limit: Option<Number>,
    /// Forward paging cursor, sent upstream as `after`.
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
}

/// A validated history request.
#[derive(Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub access_token: String,
    pub phone_number_id: String,
    pub limit: Option<u64>,
    pub after: Option<String>,
    pub before: Option<String>,
}

impl fmt::Debug for HistoryQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryQuery")
            .field("access_token", &"<redacted>")
            .field("phone_number_id", &self.phone_number_id)
            .field("limit", &self.limit)
            .field("after", &self.after)
            .field("before", &self.before)
            .finish()
    }
}

/// Structured validation failure: errors about the whole body plus errors
/// keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("invalid history request")]
pub struct ValidationError {
    pub form_errors: Vec<String>,
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    pub fn form(message: impl Into<String>) -> Self {
        Self {
            form_errors: vec![message.into()],
            ..Default::default()
        }
    }

    fn field(&mut self, name: &str, message: &str) {
        self.field_errors
            .entry(name.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.field_errors.is_empty()
    }
}

impl HistoryRequest {
    /// Parses and validates a raw JSON body.
    pub fn parse(body: &[u8]) -> Result<HistoryQuery, ValidationError> {
        let request: HistoryRequest = serde_json::from_slice(body)
            .map_err(|err| ValidationError::form(format!("malformed request body: {err}")))?;
        request.validate()
    }

    pub fn validate(self) -> Result<HistoryQuery, ValidationError> {
        let mut errors = ValidationError::default();

        let access_token = required(self.access_token, "accessToken", &mut errors);
        let phone_number_id = required(self.phone_number_id, "phoneNumberId", &mut errors);
        let limit = match self.limit {
            None => None,
            Some(limit) => match limit.as_u64() {
                Some(limit) if limit > 0 => Some(limit),
                _ => {
                    errors.field("limit", "must be a positive integer");
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(HistoryQuery {
            access_token: access_token.unwrap_or_default(),
            phone_number_id: phone_number_id.unwrap_or_default(),
            limit,
            after: self.cursor,
            before: self.before,
        })
    }
}

fn required(value: Option<String>, name: &str, errors: &mut ValidationError) -> Option<String> {
    match value {
        Some(value) if !value.is_empty() => Some(value),
        Some(_) => {
            errors.field(name, "must not be empty");
            None
        }
        None => {
            errors.field(name, "is required");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<HistoryQuery, ValidationError> {
        HistoryRequest::parse(value.to_string().as_bytes())
    }

    #[test]
    fn accepts_minimal_request() {
        let query = parse(json!({"accessToken": "EAAG", "phoneNumberId": "123"})).unwrap();
        assert_eq!(query.access_token, "EAAG");
        assert_eq!(query.phone_number_id, "123");
        assert_eq!(query.limit, None);
        assert_eq!(query.after, None);
    }

    #[test]
    fn cursor_becomes_after() {
        let query = parse(json!({
            "accessToken": "t",
            "phoneNumberId": "p",
            "limit": 25,
            "cursor": "QVFI",
            "before": "QkFD"
        }))
        .unwrap();
        assert_eq!(query.limit, Some(25));
        assert_eq!(query.after.as_deref(), Some("QVFI"));
        assert_eq!(query.before.as_deref(), Some("QkFD"));
    }

    #[test]
    fn empty_and_missing_fields_are_reported_per_field() {
        let err = parse(json!({"accessToken": "", "limit": 0})).unwrap_err();
        assert!(err.form_errors.is_empty());
        assert_eq!(err.field_errors["accessToken"], ["must not be empty"]);
        assert_eq!(err.field_errors["phoneNumberId"], ["is required"]);
        assert_eq!(err.field_errors["limit"], ["must be a positive integer"]);
    }

    #[test]
    fn negative_limit_is_rejected() {
        let err = parse(json!({"accessToken": "t", "phoneNumberId": "p", "limit": -3})).unwrap_err();
        assert_eq!(err.field_errors.len(), 1);
        assert!(err.field_errors.contains_key("limit"));
    }

    #[test]
    fn large_limits_are_accepted() {
        let big = u64::from(u32::MAX) + 1;
        let query = parse(json!({"accessToken": "t", "phoneNumberId": "p", "limit": big})).unwrap();
        assert_eq!(query.limit, Some(big));
    }

    #[test]
    fn fractional_limit_is_a_field_error() {
        let err = parse(json!({"accessToken": "t", "phoneNumberId": "p", "limit": 1.5}))
            .unwrap_err();
        assert!(err.form_errors.is_empty());
        assert_eq!(err.field_errors["limit"], ["must be a positive integer"]);
    }

    #[test]
    fn malformed_bodies_become_form_errors() {
        let err = HistoryRequest::parse(b"{not json").unwrap_err();
        assert_eq!(err.form_errors.len(), 1);
        assert!(err.form_errors[0].starts_with("malformed request body"));

        let err = parse(json!({"accessToken": "t", "phoneNumberId": "p", "limit": "10"}))
            .unwrap_err();
        assert_eq!(err.form_errors.len(), 1);
    }

    #[test]
    fn serializes_like_a_flattened_error_report() {
        let err = parse(json!({"phoneNumberId": "p"})).unwrap_err();
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "formErrors": [],
                "fieldErrors": {"accessToken": ["is required"]}
            })
        );
    }

    #[test]
    fn debug_output_hides_the_token() {
        let query = parse(json!({"accessToken": "secret-token", "phoneNumberId": "p"})).unwrap();
        let rendered = format!("{query:?}");
        assert!(!rendered.contains("secret-token"));
    }
}
