//! SQLite-backed document store.
//!
//! In-process store using SQLite for rows and brute-force cosine
//! similarity for the nearest-neighbor primitive. Embeddings are stored as
//! little-endian f32 BLOBs.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::{Document, DocumentStore, SearchResult};
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;
use crate::vector::cosine_similarity;

pub struct SqliteDocStore {
    pool: SqlitePool,
    #[allow(dead_code)]
    db_path: PathBuf,
}

impl SqliteDocStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool, db_path };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY,
                date TEXT,
                sender TEXT,
                text TEXT NOT NULL,
                origin TEXT,
                embedding BLOB NOT NULL DEFAULT x'',
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Document {
        let embedding_bytes: Vec<u8> = row.get("embedding");

        Document {
            id: row.get("id"),
            date: row.get("date"),
            sender: row.get("sender"),
            text: row.get("text"),
            origin: row.get("origin"),
            embedding: Self::deserialize_embedding(&embedding_bytes),
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocStore {
    async fn find_nearest(
        &self,
        query: &[f32],
        k: usize,
        threshold: f32,
    ) -> Result<Vec<SearchResult>, ApiError> {
        let rows = sqlx::query(
            "SELECT id, date, sender, text, origin, embedding
             FROM documents
             WHERE LENGTH(embedding) > 0",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut scored: Vec<SearchResult> = rows
            .iter()
            .filter_map(|row| {
                let document = Self::row_to_document(row);
                let similarity = cosine_similarity(query, &document.embedding);
                if similarity < threshold {
                    return None;
                }

                Some(SearchResult {
                    document,
                    similarity,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k.max(1));

        Ok(scored)
    }

    async fn get(&self, id: i64) -> Result<Option<Document>, ApiError> {
        let row = sqlx::query(
            "SELECT id, date, sender, text, origin, embedding
             FROM documents
             WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(row.as_ref().map(Self::row_to_document))
    }

    async fn upsert(&self, document: &Document) -> Result<(), ApiError> {
        let blob = Self::serialize_embedding(&document.embedding);

        sqlx::query(
            "INSERT OR REPLACE INTO documents (id, date, sender, text, origin, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(document.id)
        .bind(&document.date)
        .bind(&document.sender)
        .bind(&document.text)
        .bind(&document.origin)
        .bind(&blob)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    async fn delete_all(&self) -> Result<usize, ApiError> {
        let result = sqlx::query("DELETE FROM documents")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(result.rows_affected() as usize)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteDocStore {
        let tmp = std::env::temp_dir().join(format!("recollect-test-{}.db", uuid::Uuid::new_v4()));
        SqliteDocStore::with_path(tmp).await.unwrap()
    }

    fn make_document(id: i64, text: &str, embedding: Vec<f32>) -> Document {
        Document {
            id,
            date: Some("2024-03-01".to_string()),
            sender: Some("alice".to_string()),
            text: text.to_string(),
            origin: Some(format!("https://t.me/c/1/{id}")),
            embedding,
        }
    }

    #[tokio::test]
    async fn upsert_and_get_round_trip() {
        let store = test_store().await;

        let doc = make_document(1, "Hello world", vec![1.0, 0.0, 0.0]);
        store.upsert(&doc).await.unwrap();

        let loaded = store.get(1).await.unwrap().unwrap();
        assert_eq!(loaded.text, "Hello world");
        assert_eq!(loaded.embedding, vec![1.0, 0.0, 0.0]);
        assert_eq!(loaded.sender.as_deref(), Some("alice"));

        assert!(store.get(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_overwrites_by_id() {
        let store = test_store().await;

        store
            .upsert(&make_document(42, "first", vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert(&make_document(42, "second", vec![0.0, 1.0]))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let doc = store.get(42).await.unwrap().unwrap();
        assert_eq!(doc.text, "second");
        assert_eq!(doc.embedding, vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn find_nearest_orders_by_descending_similarity() {
        let store = test_store().await;

        store
            .upsert(&make_document(1, "close", vec![0.9, 0.1, 0.0]))
            .await
            .unwrap();
        store
            .upsert(&make_document(2, "closer", vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert(&make_document(3, "far", vec![0.0, 1.0, 0.0]))
            .await
            .unwrap();

        let results = store
            .find_nearest(&[1.0, 0.0, 0.0], 10, 0.0)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].document.id, 2);
        assert_eq!(results[1].document.id, 1);
        for pair in results.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[tokio::test]
    async fn find_nearest_applies_threshold() {
        let store = test_store().await;

        store
            .upsert(&make_document(1, "aligned", vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert(&make_document(2, "orthogonal", vec![0.0, 1.0]))
            .await
            .unwrap();

        let results = store.find_nearest(&[1.0, 0.0], 10, 0.7).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, 1);
        assert!(results.iter().all(|r| r.similarity >= 0.7));
    }

    #[tokio::test]
    async fn find_nearest_returns_fewer_than_k_when_store_is_small() {
        let store = test_store().await;

        store
            .upsert(&make_document(1, "one", vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert(&make_document(2, "two", vec![0.9, 0.1]))
            .await
            .unwrap();

        let results = store.find_nearest(&[1.0, 0.0], 5, 0.0).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn pending_documents_are_excluded_from_search() {
        let store = test_store().await;

        store
            .upsert(&make_document(1, "embedded", vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert(&make_document(2, "pending", Vec::new()))
            .await
            .unwrap();

        let results = store.find_nearest(&[1.0, 0.0], 10, 0.0).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, 1);

        // Pending rows still exist and are reachable by point lookup.
        assert_eq!(store.count().await.unwrap(), 2);
        let pending = store.get(2).await.unwrap().unwrap();
        assert!(!pending.is_embedded());
    }

    #[tokio::test]
    async fn delete_all_resets_the_store() {
        let store = test_store().await;

        store
            .upsert(&make_document(1, "a", vec![1.0]))
            .await
            .unwrap();
        store
            .upsert(&make_document(2, "b", vec![1.0]))
            .await
            .unwrap();

        let deleted = store.delete_all().await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
