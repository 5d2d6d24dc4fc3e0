//! Batch ingestion entry point.
//!
//! Reads a parsed chat-export JSON file and embeds every message that does
//! not already carry an embedding. Safe to re-run; already-embedded
//! documents are untouched.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use recollect_backend::core::config::{AppPaths, ConfigService};
use recollect_backend::ingest::{load_records, IngestRunner};
use recollect_backend::logging;
use recollect_backend::provider::build_providers;
use recollect_backend::search::EmbeddingService;
use recollect_backend::store::{DocumentStore, SqliteDocStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);

    let config = ConfigService::new(paths.clone()).load()?;

    let input_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.project_root.join(&config.ingest.input_path));

    let records = load_records(&input_path)
        .with_context(|| format!("Failed to load records from {}", input_path.display()))?;
    tracing::info!(
        "Loaded {} records from {}",
        records.len(),
        input_path.display()
    );

    let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocStore::new(paths.as_ref()).await?);

    let (embedding_provider, _) = build_providers(&config.providers)?;
    let embedder = EmbeddingService::new(
        embedding_provider,
        Duration::from_secs(config.search.embed_timeout_secs),
    );

    let runner = IngestRunner::new(store, embedder, &config.ingest, config.store.dimension);
    let report = runner.run(&records).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
