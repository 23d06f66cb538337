use btca_session::RetryPolicy;
use btca_types::ModelConfig;
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub persistence: PersistenceConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_url")]
    pub url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Model used when the server does not report one
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelSection {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
}

impl From<ModelSection> for ModelConfig {
    fn from(section: ModelSection) -> Self {
        ModelConfig::new(section.provider, section.model)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceBackend {
    #[default]
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub backend: PersistenceBackend,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: PersistenceBackend::default(),
            database: default_database(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl PersistenceConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_backoff_ms))
    }
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_database() -> String {
    "btca".to_string()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    100
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{BTCA_ENV}.toml (if BTCA_ENV is set)
    /// 3. Environment variables (BTCA__SERVER__URL, BTCA__PERSISTENCE__BACKEND, ...)
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = ConfigLoader::builder().add_source(File::with_name("config/default").required(false));

        if let Ok(env) = std::env::var("BTCA_ENV") {
            builder = builder.add_source(File::with_name(&format!("config/{}", env)).required(false));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("BTCA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: Config = config.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.mongodb_uri = std::env::var("MONGODB_URI").ok();

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [server]
            url = "http://127.0.0.1:9000"

            [logging]
            level = "debug"
            format = "json"

            [model]
            provider = "anthropic"
            model = "claude-sonnet"

            [persistence]
            backend = "mongodb"
            database = "test"
            retry_attempts = 5
            retry_backoff_ms = 10
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.url, "http://127.0.0.1:9000");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.persistence.backend, PersistenceBackend::Mongodb);
        assert_eq!(
            config.persistence.retry_policy(),
            RetryPolicy::new(5, Duration::from_millis(10))
        );
        assert_eq!(ModelConfig::from(config.model).to_string(), "anthropic/claude-sonnet");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.url, "http://localhost:8080");
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.persistence.backend, PersistenceBackend::Memory);
        assert_eq!(config.persistence.retry_policy(), RetryPolicy::default());
        assert!(config.mongodb_uri.is_none());
    }

    #[test]
    fn test_partial_section_fills_missing_fields() {
        let config: Config = toml::from_str("[persistence]\nretry_attempts = 1\n").unwrap();
        assert_eq!(config.persistence.retry_attempts, 1);
        assert_eq!(config.persistence.retry_backoff_ms, 100);
        assert_eq!(config.persistence.database, "btca");
    }

    #[test]
    fn test_shipped_default_file_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
        let config = Config::from_file(path).unwrap();
        assert_eq!(config.persistence.backend, PersistenceBackend::Memory);
        assert_eq!(config.server.url, "http://localhost:8080");
    }
}
