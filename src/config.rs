//! Configuration management for Formscope Server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::project::Tag;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub service: ServiceConfig,
    pub polling: PollingConfig,
    pub project: ProjectConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Remote form analysis service
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service endpoint, e.g. `https://westus2.api.cognitive.microsoft.com/`
    pub api_uri_base: String,
    pub api_key: String,
    /// Path of the custom models collection below `api_uri_base`
    pub models_path: String,
    /// Attempts after the first one for transient failures
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub timeout_ms: u64,
    pub interval_ms: u64,
}

impl PollingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Initial project state, loaded into the project store at startup
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Trained model used for prediction
    pub model_id: Option<String>,
    pub tags: Vec<Tag>,
    /// Overrides the bundled analysis script template
    pub analyze_script_path: Option<PathBuf>,
}

/// Error loading configuration from the environment
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(#[from] env::VarError),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            service: ServiceConfig {
                api_uri_base: "http://localhost:5000/".to_string(),
                api_key: String::new(),
                models_path: DEFAULT_MODELS_PATH.to_string(),
                max_retries: 3,
                retry_base_delay_ms: 500,
            },
            polling: PollingConfig {
                timeout_ms: 120_000,
                interval_ms: 500,
            },
            project: ProjectConfig {
                model_id: None,
                tags: Vec::new(),
                analyze_script_path: None,
            },
        }
    }
}

pub const DEFAULT_MODELS_PATH: &str = "formrecognizer/v2.0/custom/models";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let tags = match env::var("PROJECT_TAGS") {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| ConfigError::Invalid {
                name: "PROJECT_TAGS",
                reason: e.to_string(),
            })?,
            Err(_) => Vec::new(),
        };

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_or("SERVER_PORT", defaults.server.port),
            },
            service: ServiceConfig {
                api_uri_base: env::var("FORM_API_BASE")?,
                api_key: env::var("FORM_API_KEY")?,
                models_path: env::var("FORM_MODELS_PATH").unwrap_or(defaults.service.models_path),
                max_retries: parse_or("HTTP_MAX_RETRIES", defaults.service.max_retries),
                retry_base_delay_ms: parse_or(
                    "HTTP_RETRY_DELAY_MS",
                    defaults.service.retry_base_delay_ms,
                ),
            },
            polling: PollingConfig {
                timeout_ms: parse_or("POLL_TIMEOUT_MS", defaults.polling.timeout_ms),
                interval_ms: parse_or("POLL_INTERVAL_MS", defaults.polling.interval_ms),
            },
            project: ProjectConfig {
                model_id: env::var("FORM_MODEL_ID").ok().filter(|id| !id.is_empty()),
                tags,
                analyze_script_path: env::var("ANALYZE_SCRIPT_PATH").ok().map(PathBuf::from),
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.service.models_path, DEFAULT_MODELS_PATH);
        assert_eq!(config.polling.timeout(), Duration::from_secs(120));
        assert_eq!(config.polling.interval(), Duration::from_millis(500));
        assert!(config.project.model_id.is_none());
    }

    #[test]
    fn test_parse_or_falls_back() {
        assert_eq!(parse_or("FORMSCOPE_TEST_UNSET_VARIABLE", 42u32), 42);
    }
}
