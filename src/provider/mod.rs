//! Networked provider boundaries.
//!
//! Both providers are opaque HTTP services: the embedding provider maps
//! text to a numeric vector of its native width (the caller reconciles),
//! the generation provider maps a prompt to natural-language text.

mod gemini;
mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::config::ProvidersConfig;
use crate::core::errors::ApiError;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `text` into the provider's native width. The width is opaque
    /// to the caller; observed values are 768 and 1536.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError>;
}

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ApiError>;
}

/// Build the active provider pair from config.
///
/// One backend serves both roles; the selection is a config concern so
/// nothing downstream hard-codes a vendor.
pub fn build_providers(
    config: &ProvidersConfig,
) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn GenerationProvider>), ApiError> {
    match config.active.as_str() {
        "gemini" => {
            let provider = Arc::new(GeminiProvider::new(config.gemini.clone()));
            Ok((provider.clone(), provider))
        }
        "openai" => {
            let provider = Arc::new(OpenAiProvider::new(config.openai.clone()));
            Ok((provider.clone(), provider))
        }
        other => Err(ApiError::BadRequest(format!(
            "Unknown provider backend: {other}"
        ))),
    }
}
