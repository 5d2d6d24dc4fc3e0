use std::sync::Arc;
use std::time::Duration;

use crate::provider::EmbeddingProvider;

/// Fail-closed wrapper around the embedding provider.
///
/// Provider errors and timeouts degrade to an empty vector; callers must
/// check for that degenerate case before reconciling, because reconciling
/// an empty vector yields an all-zero query that matches nothing.
#[derive(Clone)]
pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
}

impl EmbeddingService {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn embed(&self, text: &str) -> Vec<f32> {
        match tokio::time::timeout(self.timeout, self.provider.embed(text)).await {
            Ok(Ok(vector)) => vector,
            Ok(Err(err)) => {
                tracing::warn!("Embedding provider failed: {}", err);
                Vec::new()
            }
            Err(_) => {
                tracing::warn!("Embedding provider timed out after {:?}", self.timeout);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::core::errors::ApiError;

    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ApiError> {
            Ok(self.0.clone())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ApiError> {
            Err(ApiError::Internal("provider down".to_string()))
        }
    }

    struct SlowEmbedder;

    #[async_trait]
    impl EmbeddingProvider for SlowEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ApiError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(vec![1.0])
        }
    }

    #[tokio::test]
    async fn returns_provider_vector_on_success() {
        let service = EmbeddingService::new(
            Arc::new(FixedEmbedder(vec![0.1, 0.2])),
            Duration::from_secs(1),
        );

        assert_eq!(service.embed("hello").await, vec![0.1, 0.2]);
    }

    #[tokio::test]
    async fn fails_closed_to_empty_vector_on_provider_error() {
        let service = EmbeddingService::new(Arc::new(FailingEmbedder), Duration::from_secs(1));

        assert!(service.embed("hello").await.is_empty());
    }

    #[tokio::test]
    async fn fails_closed_to_empty_vector_on_timeout() {
        let service = EmbeddingService::new(Arc::new(SlowEmbedder), Duration::from_millis(10));

        assert!(service.embed("hello").await.is_empty());
    }
}
