//! Server configuration types

use crate::middleware::rate_limit::RateLimitSettings;
use anyhow::{bail, Result};
use homefix_core::{ChatConfig, EngineConfig, MediaConfig, ServiceConfig};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }
        if self.server.max_body_bytes == 0 {
            bail!("server.max_body_bytes must be non-zero");
        }
        if !matches!(self.llm.provider.as_str(), "gemini" | "mock") {
            bail!(
                "llm.provider must be \"gemini\" or \"mock\", got {:?}",
                self.llm.provider
            );
        }
        if self.llm.timeout_secs == 0 || self.llm.max_tokens == 0 || self.llm.chat_max_tokens == 0 {
            bail!("llm.timeout_secs, llm.max_tokens and llm.chat_max_tokens must be non-zero");
        }
        if self.media.max_files == 0 || self.media.max_file_bytes == 0 || self.media.max_dimension == 0 {
            bail!("media.max_files, media.max_file_bytes and media.max_dimension must be non-zero");
        }
        if !(1..=100).contains(&self.media.jpeg_quality) {
            bail!("media.jpeg_quality must be between 1 and 100");
        }
        if self.rate_limit.enabled
            && (self.rate_limit.requests_per_minute == 0
                || self.rate_limit.global_requests_per_minute == 0)
        {
            bail!("rate_limit limits must be non-zero when rate limiting is enabled");
        }
        Ok(())
    }

    /// Core service settings derived from this configuration
    pub fn service_config(&self) -> ServiceConfig {
        let model = Some(self.llm.model.clone()).filter(|m| !m.is_empty());
        ServiceConfig {
            engine: EngineConfig {
                model: model.clone(),
                max_tokens: self.llm.max_tokens,
                temperature: self.llm.temperature,
            },
            chat: ChatConfig {
                model,
                max_tokens: self.llm.chat_max_tokens,
                temperature: self.llm.chat_temperature,
            },
            media: self.media,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whole-request body ceiling in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_max_body_bytes() -> usize {
    84 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Generation provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "gemini" or "mock"
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model name; empty means the provider default
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_chat_max_tokens")]
    pub chat_max_tokens: u32,
    #[serde(default = "default_chat_temperature")]
    pub chat_temperature: f32,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_tokens() -> u32 {
    8192
}
fn default_temperature() -> f32 {
    0.4
}
fn default_chat_max_tokens() -> u32 {
    1024
}
fn default_chat_temperature() -> f32 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: String::new(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            chat_max_tokens: default_chat_max_tokens(),
            chat_temperature: default_chat_temperature(),
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL; empty disables persistence
    #[serde(default)]
    pub url: String,
}

impl DatabaseConfig {
    /// The configured URL, if persistence is enabled
    pub fn url(&self) -> Option<&str> {
        Some(self.url.trim()).filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::loader::DEFAULT_CONFIG;
    use config::{Config, File, FileFormat};

    fn embedded() -> AppConfig {
        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_embedded_defaults_are_valid() {
        let config = embedded();
        config.validate().unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.media.max_files, 4);
        assert_eq!(config.media.max_file_bytes, 20 * 1024 * 1024);
        assert_eq!(config.media.max_dimension, 1600);
        assert_eq!(config.llm.provider, "gemini");
        assert!(config.database.url().is_some());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = AppConfig::default();
        config.llm.provider = "carrier-pigeon".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = AppConfig::default();
        config.media.max_files = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.rate_limit.requests_per_minute = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.requests_per_minute = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_database_url_disables_persistence() {
        let config = DatabaseConfig {
            url: "  ".to_string(),
        };
        assert!(config.url().is_none());
    }

    #[test]
    fn test_service_config_carries_model() {
        let mut config = AppConfig::default();
        config.llm.model = "gemini-2.5-pro".to_string();
        let service = config.service_config();

        assert_eq!(service.engine.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(service.chat.max_tokens, 1024);
        assert_eq!(service.media.max_dimension, 1600);
    }
}
