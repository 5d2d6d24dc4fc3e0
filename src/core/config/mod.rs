pub mod paths;
pub mod service;

pub use paths::AppPaths;
pub use service::ConfigService;

use serde::{Deserialize, Serialize};

/// Top-level typed configuration, one struct per `config.yml` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub providers: ProvidersConfig,
    pub store: StoreConfig,
    pub search: SearchConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8787,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Which provider backs both embedding and answer generation
    /// ("gemini" or "openai").
    pub active: String,
    pub gemini: GeminiConfig,
    pub openai: OpenAiConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            active: "gemini".to_string(),
            gemini: GeminiConfig::default(),
            openai: OpenAiConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: String,
    pub embedding_model: String,
    pub generation_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            embedding_model: "embedding-001".to_string(),
            generation_model: "gemini-1.5-flash".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub embedding_model: String,
    pub generation_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            embedding_model: "text-embedding-ada-002".to_string(),
            generation_model: "gpt-4o-mini".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Fixed vector width of the similarity index. Every embedding entering
    /// the store is reconciled to this length.
    pub dimension: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { dimension: 1536 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result count when the request does not specify `k`.
    pub default_k: usize,
    /// Minimum similarity when the request does not specify a threshold.
    pub default_threshold: f32,
    /// Documents fed to answer synthesis, in ranking order.
    pub max_context_docs: usize,
    /// Per-document character cap inside the synthesis context block.
    pub max_chars_per_doc: usize,
    pub embed_timeout_secs: u64,
    pub generate_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: 5,
            default_threshold: 0.7,
            max_context_docs: 5,
            max_chars_per_doc: 500,
            embed_timeout_secs: 20,
            generate_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Token-bucket quota for embedding calls. The provider rate limit is
    /// an external contract, not something derived from workload size.
    pub requests_per_minute: u32,
    /// Parsed chat-export JSON consumed when no path is passed on the
    /// command line.
    pub input_path: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 300,
            input_path: "knowledge_base.json".to_string(),
        }
    }
}
