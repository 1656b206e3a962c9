//! JSON runtime configuration with environment-supplied API keys.
//!
//! ```rust
//! use tandem::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_json_str(
//!     r#"{
//!         "memory": {"kind": "in_memory"},
//!         "candidates": [{"model": "gemini-2.5-flash"}, {"model": "gemini-2.5-pro"}],
//!         "driver": {"history": {"char_budget": 20000}}
//!     }"#,
//! )
//! .expect("config should parse");
//!
//! assert_eq!(config.candidates.len(), 2);
//! assert_eq!(config.driver.history.char_budget, 20_000);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tchat::DriverConfig;
use tmemory::MemoryBackendConfig;
use tprovider::{KeyPoolConfig, ModelCandidate, SafetyPolicy};

use crate::error::RuntimeError;
use crate::util::parse_provider_id;

pub const API_KEYS_ENV: &str = "TANDEM_API_KEYS";

fn default_memory() -> MemoryBackendConfig {
    MemoryBackendConfig::InMemory
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model: String,
}

impl CandidateConfig {
    pub fn to_candidate(&self) -> Result<ModelCandidate, RuntimeError> {
        let provider = parse_provider_id(&self.provider).ok_or_else(|| {
            RuntimeError::config(format!("unknown provider '{}'", self.provider))
        })?;
        Ok(ModelCandidate::new(provider, self.model.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_memory")]
    pub memory: MemoryBackendConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub key_pool: KeyPoolConfig,
    #[serde(default)]
    pub safety: SafetyPolicy,
    /// Default fallback order for requests that name no candidates.
    #[serde(default)]
    pub candidates: Vec<CandidateConfig>,
    /// Static keys; those in `TANDEM_API_KEYS` are appended by [`RuntimeConfig::with_env_api_keys`].
    #[serde(default)]
    pub api_keys: Vec<String>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            memory: default_memory(),
            driver: DriverConfig::default(),
            key_pool: KeyPoolConfig::default(),
            safety: SafetyPolicy::default(),
            candidates: Vec::new(),
            api_keys: Vec::new(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, RuntimeError> {
        serde_json::from_str(json)
            .map_err(|error| RuntimeError::config(format!("invalid runtime config: {error}")))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|error| {
            RuntimeError::config(format!(
                "failed to read runtime config {}: {error}",
                path.display()
            ))
        })?;
        Self::from_json_str(&json)
    }

    /// Appends comma-separated keys from `TANDEM_API_KEYS`, when set.
    pub fn with_env_api_keys(self) -> Self {
        match std::env::var(API_KEYS_ENV) {
            Ok(value) => self.with_api_keys_from(&value),
            Err(_) => self,
        }
    }

    pub fn with_api_keys_from(mut self, comma_separated: &str) -> Self {
        for key in comma_separated.split(',').map(str::trim) {
            if !key.is_empty() && !self.api_keys.iter().any(|existing| existing == key) {
                self.api_keys.push(key.to_string());
            }
        }
        self
    }

    pub fn model_candidates(&self) -> Result<Vec<ModelCandidate>, RuntimeError> {
        self.candidates
            .iter()
            .map(CandidateConfig::to_candidate)
            .collect()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use tprovider::ProviderId;

    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let config = RuntimeConfig::from_json_str("{}").expect("config should parse");

        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.memory, MemoryBackendConfig::InMemory);
        assert_eq!(config.key_pool.reclaim_threshold, 20);
        assert_eq!(config.safety, SafetyPolicy::BlockNone);
    }

    #[test]
    fn api_keys_merge_without_duplicates() {
        let config = RuntimeConfig::from_json_str(r#"{"api_keys": ["k1"]}"#)
            .expect("config should parse")
            .with_api_keys_from(" k1, k2 ,,k3 ");

        assert_eq!(config.api_keys, vec!["k1", "k2", "k3"]);
    }

    #[test]
    fn candidates_resolve_provider_names() {
        let config = RuntimeConfig::from_json_str(
            r#"{"candidates": [{"model": "flash"}, {"provider": "Google", "model": "pro"}]}"#,
        )
        .expect("config should parse");

        let candidates = config.model_candidates().expect("candidates should resolve");
        assert_eq!(candidates[1], ModelCandidate::new(ProviderId::Gemini, "pro"));

        let config = RuntimeConfig::from_json_str(
            r#"{"candidates": [{"provider": "nope", "model": "x"}]}"#,
        )
        .expect("config should parse");
        let error = config
            .model_candidates()
            .expect_err("unknown provider must fail");
        assert_eq!(error.kind, crate::RuntimeErrorKind::Config);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let error = RuntimeConfig::from_json_str("{").expect_err("must fail");
        assert_eq!(error.kind, crate::RuntimeErrorKind::Config);
    }
}
