//! Generation provider resolution

use super::config::LlmConfig;
use anyhow::{bail, Context, Result};
use homefix_llm::{GeminiConfig, GeminiProvider, GenerationProvider, MockProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Build the configured generation provider
pub fn resolve_provider(llm_config: &LlmConfig) -> Result<Arc<dyn GenerationProvider>> {
    match llm_config.provider.as_str() {
        "gemini" => {
            let mut config = GeminiConfig::from_env()
                .context("Gemini provider needs GEMINI_API_KEY or GOOGLE_API_KEY")?
                .with_max_tokens(llm_config.max_tokens)
                .with_timeout(Duration::from_secs(llm_config.timeout_secs));
            if !llm_config.model.is_empty() {
                config = config.with_model(llm_config.model.clone());
            }
            let provider = GeminiProvider::new(config).context("Failed to create Gemini provider")?;
            info!(model = %provider.default_model(), "Registered Gemini provider");
            Ok(Arc::new(provider))
        }
        "mock" => {
            warn!("Using mock generation provider; every diagnosis will be a canned reply");
            Ok(Arc::new(MockProvider::new()))
        }
        other => bail!("Unknown llm.provider {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider() {
        let config = LlmConfig {
            provider: "mock".to_string(),
            ..Default::default()
        };
        let provider = resolve_provider(&config).unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn test_unknown_provider() {
        let config = LlmConfig {
            provider: "nope".to_string(),
            ..Default::default()
        };
        assert!(resolve_provider(&config).is_err());
    }
}
