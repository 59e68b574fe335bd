use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse},
    routing::get,
    routing::post,
};
use serde::Serialize;
use wai_core::{GraphApi, NormalizedMessage, SharedMessageStore};

use crate::error::IntakeError;
use crate::messages::fetch_history;
use crate::reqid::with_request_id;
use crate::webhook::{receive, verify};

/// Composition root shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedMessageStore,
    pub graph: Arc<dyn GraphApi>,
    /// Secret expected in `hub.verify_token`; `None` makes verification fail
    /// closed.
    pub verify_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        store: SharedMessageStore,
        graph: Arc<dyn GraphApi>,
        verify_token: Option<String>,
    ) -> Self {
        Self {
            store,
            graph,
            verify_token: verify_token
                .filter(|token| !token.is_empty())
                .map(Arc::from),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/webhook", get(verify).post(receive))
        .route("/messages", post(fetch_history))
        .route("/local-messages", get(list_local).delete(clear_local))
        .layer(middleware::from_fn(with_request_id))
        .with_state(state)
}

async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize)]
pub struct LocalMessages {
    pub messages: Vec<NormalizedMessage>,
}

#[derive(Serialize)]
pub struct Cleared {
    pub success: bool,
}

async fn list_local(State(state): State<AppState>) -> Result<Json<LocalMessages>, IntakeError> {
    let messages = state.store.get_all().await?;
    Ok(Json(LocalMessages { messages }))
}

async fn clear_local(State(state): State<AppState>) -> Result<Json<Cleared>, IntakeError> {
    state.store.clear().await?;
    tracing::info!("webhook buffer cleared");
    Ok(Json(Cleared { success: true }))
}

const INDEX_HTML: &str = include_str!("index.html");
