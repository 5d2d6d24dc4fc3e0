use std::sync::Arc;
use std::time::Duration;

use crate::core::config::{AppConfig, AppPaths, ConfigService};
use crate::core::errors::ApiError;
use crate::provider::build_providers;
use crate::search::{AnswerSynthesizer, EmbeddingService, SearchService};
use crate::store::{DocumentStore, SqliteDocStore};

/// Global application state shared across all routes.
///
/// The search service receives its collaborators here, at construction;
/// there is no process-wide mutable client state.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: AppConfig,
    pub store: Arc<dyn DocumentStore>,
    pub search: SearchService,
}

impl AppState {
    pub async fn initialize() -> Result<Arc<Self>, ApiError> {
        let paths = Arc::new(AppPaths::new());
        let config = ConfigService::new(paths.clone()).load()?;

        let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocStore::new(paths.as_ref()).await?);

        let (embedding_provider, generation_provider) = build_providers(&config.providers)?;

        let embedder = EmbeddingService::new(
            embedding_provider,
            Duration::from_secs(config.search.embed_timeout_secs),
        );
        let synthesizer = AnswerSynthesizer::new(
            generation_provider,
            Duration::from_secs(config.search.generate_timeout_secs),
            config.search.max_context_docs,
            config.search.max_chars_per_doc,
        );

        let search = SearchService::new(
            embedder,
            synthesizer,
            store.clone(),
            config.store.dimension,
        );

        Ok(Arc::new(AppState {
            paths,
            config,
            store,
            search,
        }))
    }
}
