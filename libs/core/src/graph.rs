//! Client for the WhatsApp Cloud (Graph) API message history endpoint.

use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::query::HistoryQuery;

pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v19.0";

#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Fetches one page of message history and returns the vendor body as-is.
    async fn fetch_messages(&self, query: &HistoryQuery) -> Result<Value, GraphError>;
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph api configuration error: {0}")]
    Config(anyhow::Error),
    #[error("graph api transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("graph api remote error (status {status}): {message}")]
    Remote { status: StatusCode, message: String },
    #[error("graph api response decode error: {0}")]
    Decode(#[source] reqwest::Error),
}

impl GraphError {
    /// Message suitable for relaying to the caller of the proxy.
    pub fn upstream_message(&self) -> String {
        match self {
            GraphError::Remote { message, .. } => message.clone(),
            GraphError::Transport(err) => format!("Graph API request failed: {err}"),
            GraphError::Decode(_) => "Graph API returned an invalid response".to_string(),
            GraphError::Config(err) => format!("Graph API is misconfigured: {err}"),
        }
    }
}

pub struct ReqwestGraphApi {
    http: Client,
    base_url: Url,
}

impl ReqwestGraphApi {
    pub fn new(http: Client, api_base: Option<&str>) -> Result<Self, GraphError> {
        let base = api_base.unwrap_or(DEFAULT_GRAPH_API_BASE);
        let base_url = Url::parse(base.trim_end_matches('/'))
            .map_err(|err| GraphError::Config(err.into()))?;
        if base_url.cannot_be_a_base() {
            return Err(GraphError::Config(anyhow::anyhow!(
                "{base} cannot be used as a base url"
            )));
        }
        Ok(Self { http, base_url })
    }

    pub fn api_base(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn messages_url(&self, phone_number_id: &str) -> Result<Url, GraphError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GraphError::Config(anyhow::anyhow!("graph api base url has no path")))?
            .pop_if_empty()
            .push(phone_number_id)
            .push("messages");
        Ok(url)
    }
}

#[async_trait]
impl GraphApi for ReqwestGraphApi {
    #[instrument(name = "graph.fetch_messages", skip(self, query), fields(phone_number_id = %query.phone_number_id))]
    async fn fetch_messages(&self, query: &HistoryQuery) -> Result<Value, GraphError> {
        let url = self.messages_url(&query.phone_number_id)?;
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(after) = &query.after {
            params.push(("after", after.clone()));
        }
        if let Some(before) = &query.before {
            params.push(("before", before.clone()));
        }

        let started = Instant::now();
        let response = self
            .http
            .get(url)
            .bearer_auth(&query.access_token)
            .query(&params)
            .send()
            .await
            .map_err(|err| {
                counter!("graph_requests_total", "outcome" => "transport_error").increment(1);
                GraphError::Transport(err)
            })?;

        let status = response.status();
        histogram!(
            "graph_roundtrip_seconds",
            "status" => status.as_str().to_string()
        )
        .record(started.elapsed().as_secs_f64());

        if !status.is_success() {
            counter!("graph_requests_total", "outcome" => "remote_error").increment(1);
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Remote {
                status,
                message: remote_error_message(status, &body),
            });
        }

        let body = response.json::<Value>().await.map_err(|err| {
            counter!("graph_requests_total", "outcome" => "decode_error").increment(1);
            GraphError::Decode(err)
        })?;
        counter!("graph_requests_total", "outcome" => "ok").increment(1);
        Ok(body)
    }
}

/// Extracts `error.message` from a Graph error envelope, falling back to a
/// status-based description.
pub fn remote_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("Graph API request failed with status {}", status.as_u16()))
}

/// Canned reply returned by [`MockGraphApi`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Ok(Value),
    Remote { status: StatusCode, message: String },
}

/// Records every query and answers with a fixed reply.
pub struct MockGraphApi {
    pub queries: Mutex<Vec<HistoryQuery>>,
    pub reply: MockReply,
}

impl MockGraphApi {
    pub fn new(reply: MockReply) -> Self {
        Self {
            queries: Mutex::new(Vec::new()),
            reply,
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(MockReply::Ok(body))
    }
}

#[async_trait]
impl GraphApi for MockGraphApi {
    async fn fetch_messages(&self, query: &HistoryQuery) -> Result<Value, GraphError> {
        self.queries.lock().await.push(query.clone());
        match &self.reply {
            MockReply::Ok(body) => Ok(body.clone()),
            MockReply::Remote { status, message } => Err(GraphError::Remote {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}
