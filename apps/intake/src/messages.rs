use axum::{Json, body::Bytes, extract::State};
use serde_json::Value;
use wai_core::HistoryRequest;

use crate::error::IntakeError;
use crate::http::AppState;

/// `POST /messages`: validates the credentials and relays one page of Graph
/// API history unmodified.
pub async fn fetch_history(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, IntakeError> {
    let query = HistoryRequest::parse(&body)?;
    tracing::info!(
        phone_number_id = %query.phone_number_id,
        limit = ?query.limit,
        paging = query.after.is_some() || query.before.is_some(),
        "fetching message history"
    );
    let history = state.graph.fetch_messages(&query).await?;
    Ok(Json(history))
}
