//! Document store boundary.
//!
//! The retrieval pipeline treats the store as a black box exposing a
//! nearest-neighbor primitive plus point lookups; `SqliteDocStore` is the
//! in-process implementation.

mod sqlite;

pub use sqlite::SqliteDocStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A chat message persisted as a searchable document.
///
/// `embedding` is either exactly the store dimension (embedded) or empty
/// (pending). Pending documents never appear in similarity results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub date: Option<String>,
    pub sender: Option<String>,
    pub text: String,
    pub origin: Option<String>,
    pub embedding: Vec<f32>,
}

impl Document {
    pub fn is_embedded(&self) -> bool {
        !self.embedding.is_empty()
    }
}

/// Read-only projection produced by a similarity query; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Document,
    /// Cosine similarity in [-1, 1].
    pub similarity: f32,
}

/// Abstract interface over the document store.
///
/// `find_nearest` applies the similarity threshold inside the store, so
/// callers see only results at or above it, ordered by descending
/// similarity. Tie order is the store's native order and must not be
/// relied on.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_nearest(
        &self,
        query: &[f32],
        k: usize,
        threshold: f32,
    ) -> Result<Vec<SearchResult>, ApiError>;

    async fn get(&self, id: i64) -> Result<Option<Document>, ApiError>;

    /// Insert or overwrite by `id`.
    async fn upsert(&self, document: &Document) -> Result<(), ApiError>;

    /// Full reset for re-ingestion cycles. Returns the deleted row count.
    async fn delete_all(&self) -> Result<usize, ApiError>;

    async fn count(&self) -> Result<usize, ApiError>;
}
