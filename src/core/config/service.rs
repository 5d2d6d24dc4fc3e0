use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::AppConfig;
use crate::core::errors::ApiError;

/// Loads and merges the application configuration.
///
/// The public `config.yml` is deep-merged with `secrets.yaml` from the user
/// data dir, so provider API keys never live in the checked-in config file.
#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("RECOLLECT_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Raw merged configuration as a JSON value.
    pub fn load_raw(&self) -> Value {
        let public_config = load_yaml_file(&self.config_path());
        let secrets_config = load_yaml_file(&self.secrets_path());
        deep_merge(&public_config, &secrets_config)
    }

    /// Typed configuration; missing sections and fields fall back to their
    /// serde defaults.
    pub fn load(&self) -> Result<AppConfig, ApiError> {
        serde_json::from_value(self.load_raw()).map_err(ApiError::internal)
    }
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value) => match value {
                Value::Object(_) => value,
                _ => Value::Object(Map::new()),
            },
            Err(_) => Value::Object(Map::new()),
        },
        Err(_) => Value::Object(Map::new()),
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "a": 1,
            "b": { "c": 2, "d": 3 },
            "arr": [1, 2]
        });
        let override_value = json!({
            "b": { "c": 99 },
            "arr": [3],
            "e": "x"
        });

        let merged = deep_merge(&base, &override_value);

        assert_eq!(
            merged,
            json!({
                "a": 1,
                "b": { "c": 99, "d": 3 },
                "arr": [3],
                "e": "x"
            })
        );
    }

    #[test]
    fn secrets_overlay_supplies_api_key() {
        let base = json!({
            "providers": {
                "active": "gemini",
                "gemini": { "embedding_model": "embedding-001" }
            }
        });
        let secrets = json!({
            "providers": {
                "gemini": { "api_key": "k-123" }
            }
        });

        let merged = deep_merge(&base, &secrets);

        assert_eq!(
            merged["providers"]["gemini"]["api_key"],
            json!("k-123")
        );
        assert_eq!(
            merged["providers"]["gemini"]["embedding_model"],
            json!("embedding-001")
        );
    }

    #[test]
    fn typed_config_falls_back_to_defaults() {
        let config: AppConfig = serde_json::from_value(json!({})).unwrap();

        assert_eq!(config.search.default_k, 5);
        assert!((config.search.default_threshold - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.store.dimension, 1536);
    }
}
