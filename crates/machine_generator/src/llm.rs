use anyhow::Result;
use async_trait::async_trait;
use machine_core::config::LlmConfig;

/// Parameters for a single completion request.
#[derive(Debug, Clone)]
pub struct CompletionParams {
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            temperature: 0.9,
        }
    }
}

impl CompletionParams {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature.clamp(0.0, 2.0),
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a system + user prompt and return the raw JSON text of the reply.
    async fn complete_json(&self, system: &str, user: &str, params: CompletionParams)
        -> Result<String>;
}
