use std::sync::Arc;

use serde::Serialize;

use super::embedder::EmbeddingService;
use super::synthesizer::{AnswerSynthesizer, FALLBACK_ANSWER};
use crate::core::errors::ApiError;
use crate::store::{Document, DocumentStore, SearchResult};
use crate::vector::reconcile;

/// Outcome of one retrieval call: ranked results plus a synthesized answer.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub results: Vec<SearchResult>,
}

/// The retrieval orchestrator.
///
/// Stateless and reentrant: holds only shared handles to its collaborators,
/// all injected at construction. Concurrent queries are independent.
#[derive(Clone)]
pub struct SearchService {
    embedder: EmbeddingService,
    synthesizer: AnswerSynthesizer,
    store: Arc<dyn DocumentStore>,
    dimension: usize,
}

impl SearchService {
    pub fn new(
        embedder: EmbeddingService,
        synthesizer: AnswerSynthesizer,
        store: Arc<dyn DocumentStore>,
        dimension: usize,
    ) -> Self {
        Self {
            embedder,
            synthesizer,
            store,
            dimension,
        }
    }

    /// Answer a natural-language query against the document store.
    ///
    /// The only error that escapes is `BadRequest` for a blank query.
    /// Provider and store failures degrade stage by stage: empty embedding
    /// short-circuits to the fallback answer, a store failure becomes an
    /// empty result set, a synthesis failure becomes the fallback string.
    pub async fn answer_query(
        &self,
        query: &str,
        k: usize,
        threshold: f32,
    ) -> Result<QueryResponse, ApiError> {
        if query.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Query parameter is required".to_string(),
            ));
        }

        let raw = self.embedder.embed(query).await;
        if raw.is_empty() {
            // Reconciling an empty vector would produce an all-zero query
            // that matches nothing; skip the store round-trip entirely.
            tracing::warn!("Empty query embedding, returning fallback response");
            return Ok(QueryResponse {
                answer: FALLBACK_ANSWER.to_string(),
                results: Vec::new(),
            });
        }

        let query_vector = reconcile(&raw, self.dimension);

        let results = match self
            .store
            .find_nearest(&query_vector, k.max(1), threshold)
            .await
        {
            Ok(results) => results,
            Err(err) => {
                tracing::warn!("Similarity query failed: {}", err);
                Vec::new()
            }
        };

        let documents: Vec<Document> = results.iter().map(|r| r.document.clone()).collect();
        let answer = self.synthesizer.synthesize(query, &documents).await;

        Ok(QueryResponse { answer, results })
    }
}
