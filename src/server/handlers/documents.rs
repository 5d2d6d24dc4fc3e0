use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Document not found: {id}")))?;

    Ok(Json(json!({
        "id": document.id,
        "date": document.date,
        "sender": document.sender,
        "content": document.text,
        "origin": document.origin,
    })))
}

/// Administrative full reset, used between re-ingestion cycles.
pub async fn reset_documents(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.store.delete_all().await?;
    tracing::info!("Document store reset, {} rows deleted", deleted);

    Ok(Json(json!({ "deleted": deleted })))
}
