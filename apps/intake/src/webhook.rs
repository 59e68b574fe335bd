//! Meta webhook endpoint: subscription verification and event ingestion.
//!
//! The `x-hub-signature-256` header is captured and echoed back but not
//! verified.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use subtle::ConstantTimeEq;
use wai_core::normalize_webhook;
use wai_telemetry::{record_verification, record_webhook_delivery};

use crate::error::IntakeError;
use crate::http::AppState;
use crate::now_millis;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

#[derive(Debug, Default)]
pub struct VerifyQs {
    pub mode: Option<String>,
    pub token: Option<String>,
    pub challenge: Option<String>,
}

impl VerifyQs {
    /// Picks the `hub.*` parameters out of a query string. A repeated key
    /// keeps its first value.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut q = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "hub.mode" => &mut q.mode,
                "hub.verify_token" => &mut q.token,
                "hub.challenge" => &mut q.challenge,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        q
    }
}

/// Checks a subscription handshake and returns the challenge to echo.
pub fn check_subscription(q: VerifyQs, secret: Option<&str>) -> Result<String, IntakeError> {
    let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
    let (Some("subscribe"), Some(token), Some(challenge)) = (
        q.mode.as_deref(),
        non_empty(q.token),
        non_empty(q.challenge),
    ) else {
        record_verification("malformed");
        return Err(IntakeError::VerificationRequest);
    };

    let Some(secret) = secret else {
        record_verification("misconfigured");
        return Err(IntakeError::Configuration);
    };

    if bool::from(token.as_bytes().ct_eq(secret.as_bytes())) {
        record_verification("accepted");
        Ok(challenge)
    } else {
        record_verification("rejected");
        Err(IntakeError::Auth)
    }
}

pub async fn verify(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<String, IntakeError> {
    let challenge = check_subscription(
        VerifyQs::from_pairs(pairs),
        state.verify_token.as_deref(),
    )?;
    tracing::info!("webhook subscription verified");
    Ok(challenge)
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookAck {
    pub success: bool,
    pub received: usize,
    pub signature: Option<String>,
}

pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, IntakeError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let payload: Value = serde_json::from_slice(&body).map_err(IntakeError::Parse)?;
    let normalized = normalize_webhook(&payload, now_millis());
    for fragment in &normalized.skipped {
        tracing::debug!(path = %fragment.path, reason = %fragment.reason, "webhook fragment skipped");
    }

    let received = normalized.messages.len();
    record_webhook_delivery(received, normalized.skipped.len());
    state.store.extend(normalized.messages).await?;
    tracing::info!(
        received,
        skipped = normalized.skipped.len(),
        signed = signature.is_some(),
        "webhook delivery stored"
    );

    Ok(Json(WebhookAck {
        success: true,
        received,
        signature,
    }))
}
