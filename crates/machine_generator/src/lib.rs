pub mod fallback;
pub mod generator;
pub mod llm;
pub mod prompts;
pub mod providers;

pub use fallback::FallbackGenerator;
pub use generator::{parse_generated, AiBriefGenerator};
pub use llm::{CompletionParams, LlmClient};

use anyhow::Result;
use machine_core::config::LlmConfig;
use machine_core::BriefGenerator;
use std::sync::Arc;

/// Pick the generator for this configuration.
///
/// Without an API key the bot runs on the static fallback set; AI failures
/// are only possible (and alerted) when a real provider is configured.
pub fn build_generator(config: &LlmConfig) -> Result<Arc<dyn BriefGenerator>> {
    let params = CompletionParams::from_config(config);
    match config.provider.as_str() {
        "mock" => {
            tracing::info!("Using mock LLM provider for brief generation");
            let client = Arc::new(providers::MockProvider::new(&config.model));
            Ok(Arc::new(AiBriefGenerator::new(client, params)))
        }
        "openai" => match config.api_key.as_deref() {
            Some(key) => {
                tracing::info!("OpenAI client initialized (model {})", config.model);
                let client = Arc::new(providers::OpenAiClient::new(config, key)?);
                Ok(Arc::new(AiBriefGenerator::new(client, params)))
            }
            None => {
                tracing::warn!("No OpenAI API key provided. Briefs will use fallback content.");
                Ok(Arc::new(FallbackGenerator::new()))
            }
        },
        "fallback" => Ok(Arc::new(FallbackGenerator::new())),
        other => anyhow::bail!("Unknown LLM provider: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_key_selects_fallback() {
        let cfg = LlmConfig::default();
        let generator = build_generator(&cfg).unwrap();
        assert_eq!(generator.name(), "fallback");
    }

    #[test]
    fn test_key_selects_ai() {
        let cfg = LlmConfig {
            api_key: Some("sk-test".into()),
            ..Default::default()
        };
        let generator = build_generator(&cfg).unwrap();
        assert_eq!(generator.name(), "ai");
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let cfg = LlmConfig {
            provider: "carrier-pigeon".into(),
            ..Default::default()
        };
        assert!(build_generator(&cfg).is_err());
    }
}
