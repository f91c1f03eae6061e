use crate::llm::{CompletionParams, LlmClient};
use anyhow::{Context, Result};
use machine_core::config::LlmConfig;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?,
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    async fn complete_json(
        &self,
        system: &str,
        user: &str,
        params: CompletionParams,
    ) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "response_format": { "type": "json_object" },
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .context("Failed to send request to OpenAI")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API Error ({}): {}", status, error_text);
        }

        let resp_json: Value = response
            .json()
            .await
            .context("Failed to decode OpenAI response")?;

        match resp_json["choices"][0]["message"]["content"].as_str() {
            Some(content) if !content.trim().is_empty() => Ok(content.to_string()),
            _ => anyhow::bail!("No response from OpenAI"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> LlmConfig {
        LlmConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_complete_json_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "response_format": { "type": "json_object" },
                "max_tokens": 500
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "{\"companyName\":\"X\"}" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&config(&server.uri()), "sk-test").unwrap();
        let out = client
            .complete_json("system", "user", CompletionParams::default())
            .await
            .unwrap();
        assert_eq!(out, "{\"companyName\":\"X\"}");
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&config(&server.uri()), "sk-bad").unwrap();
        let err = client
            .complete_json("system", "user", CompletionParams::default())
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("401"), "unexpected error: {msg}");
        assert!(msg.contains("invalid api key"));
    }

    #[tokio::test]
    async fn test_empty_content_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": null } }]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&config(&server.uri()), "sk-test").unwrap();
        let err = client
            .complete_json("system", "user", CompletionParams::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No response"));
    }
}
