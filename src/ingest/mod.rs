//! Offline ingestion of parsed chat exports.
//!
//! The runner walks message records in input order, embeds the ones that
//! still need it, and upserts each finished document immediately, so a
//! crash loses at most the in-flight record. Provider calls are spaced by
//! a token-bucket rate limiter; the quota is an external contract with the
//! provider, enforced serially between consecutive calls.

use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};

use crate::core::config::IngestConfig;
use crate::core::errors::ApiError;
use crate::search::EmbeddingService;
use crate::store::{Document, DocumentStore};
use crate::vector::reconcile;

/// One parsed chat message, as produced by the external export parser.
/// `text` is optional at this boundary; records without usable text never
/// become searchable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub run_id: String,
    pub total: usize,
    pub embedded: usize,
    pub skipped_existing: usize,
    pub skipped_empty: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct IngestRunner {
    store: Arc<dyn DocumentStore>,
    embedder: EmbeddingService,
    limiter: DefaultDirectRateLimiter,
    dimension: usize,
}

impl IngestRunner {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embedder: EmbeddingService,
        config: &IngestConfig,
        dimension: usize,
    ) -> Self {
        let quota = NonZeroU32::new(config.requests_per_minute.max(1)).unwrap_or(NonZeroU32::MIN);

        Self {
            store,
            embedder,
            limiter: RateLimiter::direct(Quota::per_minute(quota)),
            dimension,
        }
    }

    /// Process a batch of records. Re-running over the same input is
    /// idempotent: documents that already carry an embedding are skipped
    /// by `id` before any provider call.
    pub async fn run(&self, records: &[MessageRecord]) -> Result<IngestReport, ApiError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();

        let mut embedded = 0usize;
        let mut skipped_existing = 0usize;
        let mut skipped_empty = 0usize;
        let mut failed = 0usize;

        for record in records {
            if let Some(existing) = self.store.get(record.id).await? {
                if existing.is_embedded() {
                    skipped_existing += 1;
                    continue;
                }
            }

            let text = match record.text.as_deref().map(str::trim) {
                Some(text) if !text.is_empty() => text.to_string(),
                _ => {
                    tracing::debug!("Skipping message {} with no usable text", record.id);
                    skipped_empty += 1;
                    continue;
                }
            };

            self.limiter.until_ready().await;

            let raw = self.embedder.embed(&text).await;
            let document = Document {
                id: record.id,
                date: record.date.clone(),
                sender: record.sender.clone(),
                text,
                origin: record.origin.clone(),
                embedding: if raw.is_empty() {
                    Vec::new()
                } else {
                    reconcile(&raw, self.dimension)
                },
            };

            if document.is_embedded() {
                embedded += 1;
            } else {
                // Persist the metadata anyway; the record stays pending and
                // a later run retries it.
                tracing::warn!("Embedding failed for message {}, left pending", record.id);
                failed += 1;
            }

            self.store.upsert(&document).await?;
        }

        let report = IngestReport {
            run_id,
            total: records.len(),
            embedded,
            skipped_existing,
            skipped_empty,
            failed,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            "Ingest run {} finished: {}/{} embedded, {} already embedded, {} without text, {} failed",
            report.run_id,
            report.embedded,
            report.total,
            report.skipped_existing,
            report.skipped_empty,
            report.failed
        );

        Ok(report)
    }
}

/// Read a parsed chat-export JSON array from disk.
pub fn load_records(path: &Path) -> Result<Vec<MessageRecord>, ApiError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ApiError::NotFound(format!("Cannot read {}: {e}", path.display())))?;

    serde_json::from_str(&contents).map_err(ApiError::internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::provider::EmbeddingProvider;
    use crate::store::SqliteDocStore;

    const DIM: usize = 4;

    struct CountingEmbedder {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingEmbedder {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ApiError::Internal("rate limited".to_string()))
            } else {
                Ok(vec![0.5, 0.5])
            }
        }
    }

    async fn temp_store() -> Arc<SqliteDocStore> {
        let tmp =
            std::env::temp_dir().join(format!("recollect-ingest-{}.db", uuid::Uuid::new_v4()));
        Arc::new(SqliteDocStore::with_path(tmp).await.unwrap())
    }

    fn runner(store: Arc<dyn DocumentStore>, provider: Arc<CountingEmbedder>) -> IngestRunner {
        let config = IngestConfig {
            requests_per_minute: 60_000,
            ..IngestConfig::default()
        };
        IngestRunner::new(
            store,
            EmbeddingService::new(provider, Duration::from_secs(1)),
            &config,
            DIM,
        )
    }

    fn record(id: i64, text: Option<&str>) -> MessageRecord {
        MessageRecord {
            id,
            date: Some("2024-02-02T10:00:00".to_string()),
            sender: Some("misha".to_string()),
            text: text.map(str::to_string),
            origin: Some(format!("https://t.me/c/1/{id}")),
        }
    }

    #[tokio::test]
    async fn embeds_usable_records_and_skips_empty_text() {
        let store = temp_store().await;
        let provider = CountingEmbedder::new(false);
        let runner = runner(store.clone(), provider.clone());

        let records = vec![
            record(1, Some("Пришла идея для проекта")),
            record(2, Some("   ")),
            record(3, None),
            record(4, Some("обсудили план")),
        ];

        let report = runner.run(&records).await.unwrap();

        assert_eq!(report.embedded, 2);
        assert_eq!(report.skipped_empty, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.count().await.unwrap(), 2);

        // Embeddings land reconciled to the store width.
        let doc = store.get(1).await.unwrap().unwrap();
        assert_eq!(doc.embedding.len(), DIM);
        assert_eq!(&doc.embedding[..2], &[0.5, 0.5]);
    }

    #[tokio::test]
    async fn rerunning_the_same_input_is_idempotent() {
        let store = temp_store().await;
        let provider = CountingEmbedder::new(false);
        let runner = runner(store.clone(), provider.clone());

        let records = vec![record(1, Some("раз")), record(2, Some("два"))];

        let first = runner.run(&records).await.unwrap();
        assert_eq!(first.embedded, 2);
        let embedding_after_first = store.get(1).await.unwrap().unwrap().embedding;

        let second = runner.run(&records).await.unwrap();
        assert_eq!(second.embedded, 0);
        assert_eq!(second.skipped_existing, 2);

        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            store.get(1).await.unwrap().unwrap().embedding,
            embedding_after_first
        );
    }

    #[tokio::test]
    async fn duplicate_id_within_one_batch_is_ingested_once() {
        let store = temp_store().await;
        let provider = CountingEmbedder::new(false);
        let runner = runner(store.clone(), provider.clone());

        let records = vec![
            record(42, Some("первое сообщение")),
            record(42, Some("первое сообщение")),
        ];

        let report = runner.run(&records).await.unwrap();

        assert_eq!(report.embedded, 1);
        assert_eq!(report.skipped_existing, 1);
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_failure_leaves_record_pending_and_retryable() {
        let store = temp_store().await;

        let failing = CountingEmbedder::new(true);
        let report = runner(store.clone(), failing)
            .run(&[record(7, Some("текст"))])
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.embedded, 0);

        let pending = store.get(7).await.unwrap().unwrap();
        assert!(!pending.is_embedded());
        assert_eq!(pending.text, "текст");

        // A later run with a healthy provider picks the record back up.
        let healthy = CountingEmbedder::new(false);
        let retry = runner(store.clone(), healthy)
            .run(&[record(7, Some("текст"))])
            .await
            .unwrap();

        assert_eq!(retry.embedded, 1);
        assert!(store.get(7).await.unwrap().unwrap().is_embedded());
    }

    #[test]
    fn load_records_parses_the_export_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge_base.json");
        std::fs::write(
            &path,
            r#"[
                {"id": 1, "date": "2024-01-01", "sender": "misha", "text": "привет", "origin": "https://t.me/c/1/1"},
                {"id": 2, "sender": "lena"}
            ]"#,
        )
        .unwrap();

        let records = load_records(&path).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text.as_deref(), Some("привет"));
        assert!(records[1].text.is_none());
        assert!(records[1].date.is_none());
    }
}
