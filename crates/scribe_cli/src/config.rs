//! Optional RON settings file layered over the engine defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use scribe_engine::SessionConfig;
use scribe_logging::scribe_info;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Every field is optional; absent fields keep the engine default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub backoff_base_ms: Option<u64>,
    pub backoff_cap_ms: Option<u64>,
    pub optimistic_updates: Option<bool>,
    pub graceful_degradation: Option<bool>,
    pub cache_responses: Option<bool>,
    pub debounce_requests: Option<bool>,
    pub cache_ttl_secs: Option<u64>,
    pub max_cache_entries: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ron::from_str(&content).map_err(|err| CliError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        scribe_info!("Loaded settings from {}", path.display());
        Ok(config)
    }

    pub fn apply(&self, config: &mut SessionConfig) {
        let ms = Duration::from_millis;
        if let Some(endpoint) = &self.endpoint {
            config.endpoint.base_url = endpoint.clone();
        }
        if let Some(value) = self.connect_timeout_ms {
            config.endpoint.connect_timeout = ms(value);
        }

        let orchestrator = &mut config.orchestrator;
        if let Some(value) = self.request_timeout_ms {
            orchestrator.request_timeout = ms(value);
        }
        if let Some(value) = self.max_retries {
            orchestrator.max_retries = value;
        }
        if let Some(value) = self.backoff_base_ms {
            orchestrator.backoff_base = ms(value);
        }
        if let Some(value) = self.backoff_cap_ms {
            orchestrator.backoff_cap = ms(value);
        }
        if let Some(value) = self.optimistic_updates {
            orchestrator.optimistic_updates = value;
        }
        if let Some(value) = self.graceful_degradation {
            orchestrator.graceful_degradation = value;
        }
        if let Some(value) = self.cache_responses {
            orchestrator.cache_responses = value;
        }
        if let Some(value) = self.debounce_requests {
            orchestrator.debounce_requests = value;
        }

        if let Some(value) = self.cache_ttl_secs {
            config.optimizer.cache_ttl = Duration::from_secs(value);
        }
        if let Some(value) = self.max_cache_entries {
            config.optimizer.max_cache_entries = value;
        }
    }
}

/// Defaults, then the config file, then the `--endpoint` flag.
pub fn session_config(
    file: Option<&Path>,
    endpoint_override: Option<&str>,
) -> Result<SessionConfig, CliError> {
    let mut config = SessionConfig::default();
    if let Some(path) = file {
        FileConfig::load(path)?.apply(&mut config);
    }
    if let Some(endpoint) = endpoint_override {
        config.endpoint.base_url = endpoint.to_string();
    }
    Ok(config)
}
