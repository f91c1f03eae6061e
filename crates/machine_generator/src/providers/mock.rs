//! Mock LLM Provider: deterministic responses for testing without API keys.

use crate::llm::{CompletionParams, LlmClient};
use anyhow::Result;
use machine_core::Language;

#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
}

impl MockProvider {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
        }
    }

    fn canned(&self, system: &str) -> String {
        // The English prompt asks for the title/description shape.
        if system == crate::prompts::system_prompt(Language::En) {
            serde_json::json!({
                "title": format!("Mock brief ({})", self.model),
                "description": "A **poster** for a community radio station.",
                "requirements": ["Use two colors", "Include the station name"],
                "constraints": ["A3 format"],
                "deadline": "3 days"
            })
            .to_string()
        } else {
            serde_json::json!({
                "companyName": format!("Brief simulé ({})", self.model),
                "companyDescription": "Une **radio associative** de quartier.",
                "jobDescription": "Créer une **affiche** pour la fête de la radio.",
                "deadline": "3 jours"
            })
            .to_string()
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MockProvider {
    async fn complete_json(
        &self,
        system: &str,
        _user: &str,
        _params: CompletionParams,
    ) -> Result<String> {
        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        Ok(self.canned(system))
    }
}
