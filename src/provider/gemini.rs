use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{EmbeddingProvider, GenerationProvider};
use crate::core::config::GeminiConfig;
use crate::core::errors::ApiError;

/// Google Generative Language API client (embedContent / generateContent).
#[derive(Clone)]
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(mut config: GeminiConfig) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            config,
            client: Client::new(),
        }
    }

    fn model_url(&self, model: &str, action: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}?key={}",
            self.config.base_url, model, action, self.config.api_key
        )
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let url = self.model_url(&self.config.embedding_model, "embedContent");

        let body = json!({
            "content": { "parts": [{ "text": text }] }
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Gemini embed error ({status}): {text}"
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;

        let values = payload["embedding"]["values"]
            .as_array()
            .ok_or_else(|| ApiError::Internal("Gemini embed response missing values".to_string()))?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        Ok(values)
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let url = self.model_url(&self.config.generation_model, "generateContent");

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Gemini generate error ({status}): {text}"
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;

        let content = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }
}
