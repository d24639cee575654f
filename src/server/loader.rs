//! Configuration loading
//!
//! Layers, lowest priority first: the embedded `config/default.toml`, then
//! optional `config/default`, `config/{HOMEFIX_ENV}` and `config/local`
//! files, then `HOMEFIX_*` environment variables (`HOMEFIX_LLM__MODEL`).

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

/// Compiled-in defaults, so the binary runs with no config directory
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

const PROFILE_VAR: &str = "HOMEFIX_ENV";
const DEFAULT_PROFILE: &str = "development";

fn file_layers(profile: &str) -> ConfigBuilder<DefaultState> {
    Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{}", profile)).required(false))
        .add_source(File::with_name("config/local").required(false))
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig> {
    let config: AppConfig = builder
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Load and validate the server configuration
pub fn load_config() -> Result<AppConfig> {
    let profile = std::env::var(PROFILE_VAR).unwrap_or_else(|_| DEFAULT_PROFILE.to_string());

    // prefix_separator keeps a single underscore after the prefix;
    // config 0.14 would otherwise expect HOMEFIX__LLM__MODEL
    let env = Environment::with_prefix("HOMEFIX")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true);

    finish(file_layers(&profile).add_source(env))
}
