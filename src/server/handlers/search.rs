use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;
use crate::store::SearchResult;

const EXCERPT_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub k: Option<usize>,
    pub threshold: Option<f32>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let k = params.k.unwrap_or(state.config.search.default_k);
    let threshold = params
        .threshold
        .unwrap_or(state.config.search.default_threshold);

    let response = state.search.answer_query(&params.q, k, threshold).await?;

    Ok(Json(json!({
        "answer": response.answer,
        "results": response
            .results
            .iter()
            .map(result_projection)
            .collect::<Vec<_>>(),
    })))
}

fn result_projection(result: &SearchResult) -> serde_json::Value {
    json!({
        "id": result.document.id,
        "excerpt": excerpt(&result.document.text),
        "origin": result.document.origin,
        "similarity": result.similarity,
    })
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(EXCERPT_CHARS).collect();
    cut.push_str("...");
    cut
}
