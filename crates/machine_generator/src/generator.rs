//! AI-backed brief generator.
//!
//! Sends the language-specific prompt to an [`LlmClient`] and maps either of
//! the two reply shapes onto [`BriefContent`]:
//! - `{companyName, companyDescription, jobDescription, deadline}` (fr prompt)
//! - `{title, description, requirements[], constraints[], deadline?}` (en prompt)
//!
//! Any transport or parse failure is returned to the caller; there is no
//! silent fallback here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use machine_core::{BriefContent, BriefGenerator, Language};
use serde_json::Value;
use std::sync::Arc;

use crate::llm::{CompletionParams, LlmClient};
use crate::prompts;

pub struct AiBriefGenerator {
    client: Arc<dyn LlmClient>,
    params: CompletionParams,
}

impl AiBriefGenerator {
    pub fn new(client: Arc<dyn LlmClient>, params: CompletionParams) -> Self {
        Self { client, params }
    }
}

#[async_trait]
impl BriefGenerator for AiBriefGenerator {
    async fn generate(&self, language: Language) -> Result<BriefContent> {
        let raw = self
            .client
            .complete_json(
                prompts::system_prompt(language),
                prompts::user_prompt(language),
                self.params.clone(),
            )
            .await?;
        let content = parse_generated(&raw, language)?;
        tracing::info!("Brief generated successfully: {}", content.company_name);
        Ok(content)
    }

    fn name(&self) -> &'static str {
        "ai"
    }
}

/// Parse a model reply into brief content.
pub fn parse_generated(raw: &str, language: Language) -> Result<BriefContent> {
    let json: Value = serde_json::from_str(extract_json_object(raw))
        .context("Generated brief is not valid JSON")?;

    let content = if json.get("companyName").is_some() {
        BriefContent {
            company_name: text_field(&json, "companyName"),
            company_description: text_field(&json, "companyDescription"),
            job_description: text_field(&json, "jobDescription"),
            deadline_label: deadline_label(&json, language),
        }
    } else if json.get("title").is_some() {
        BriefContent {
            company_name: text_field(&json, "title"),
            company_description: text_field(&json, "description"),
            job_description: project_details(&json, language),
            deadline_label: deadline_label(&json, language),
        }
    } else {
        anyhow::bail!("Generated brief has an unknown shape");
    };

    if content.company_name.is_empty()
        || content.company_description.is_empty()
        || content.job_description.is_empty()
    {
        anyhow::bail!("Generated brief is missing required fields");
    }
    Ok(content)
}

/// Strip markdown fences or chatter around the first JSON object.
fn extract_json_object(raw: &str) -> &str {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => &raw[start..=end],
        _ => raw.trim(),
    }
}

fn text_field(json: &Value, key: &str) -> String {
    json.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// The deadline may come back as "5 jours", "5" or a bare number.
fn deadline_label(json: &Value, language: Language) -> String {
    match json.get("deadline") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => match language {
            Language::Fr => format!("{} jours", n),
            Language::En => format!("{} days", n),
        },
        _ => String::new(),
    }
}

fn project_details(json: &Value, language: Language) -> String {
    let list = |key: &str| -> Vec<String> {
        json.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    };

    let (req_label, con_label) = match language {
        Language::Fr => ("Exigences", "Contraintes"),
        Language::En => ("Requirements", "Constraints"),
    };

    let mut sections = Vec::new();
    let requirements = list("requirements");
    if !requirements.is_empty() {
        sections.push(format!("**{}**: {}", req_label, requirements.join(" · ")));
    }
    let constraints = list("constraints");
    if !constraints.is_empty() {
        sections.push(format!("**{}**: {}", con_label, constraints.join(" · ")));
    }
    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;

    struct FailingClient;

    #[async_trait]
    impl LlmClient for FailingClient {
        async fn complete_json(&self, _: &str, _: &str, _: CompletionParams) -> Result<String> {
            anyhow::bail!("connection refused")
        }
    }

    #[test]
    fn test_parse_company_shape() {
        let raw = r#"{"companyName":"Café Nuage","companyDescription":"Un café","jobDescription":"Un packaging","deadline":"5 jours"}"#;
        let c = parse_generated(raw, Language::Fr).unwrap();
        assert_eq!(c.company_name, "Café Nuage");
        assert_eq!(c.deadline_label, "5 jours");
    }

    #[test]
    fn test_parse_project_shape() {
        let raw = r#"{"title":"Radio","description":"A poster","requirements":["Two colors"],"constraints":["A3"]}"#;
        let c = parse_generated(raw, Language::En).unwrap();
        assert_eq!(c.company_name, "Radio");
        assert!(c.job_description.contains("Two colors"));
        assert!(c.job_description.contains("A3"));
        // No deadline in this shape: the caller's fallback duration applies.
        assert_eq!(c.deadline_label, "");
    }

    #[test]
    fn test_parse_numeric_deadline_and_fences() {
        let raw = "```json\n{\"companyName\":\"A\",\"companyDescription\":\"B\",\"jobDescription\":\"C\",\"deadline\":7}\n```";
        let c = parse_generated(raw, Language::Fr).unwrap();
        assert_eq!(c.deadline_label, "7 jours");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_generated("not json", Language::Fr).is_err());
        assert!(parse_generated(r#"{"foo":1}"#, Language::Fr).is_err());
        assert!(parse_generated(r#"{"companyName":""}"#, Language::Fr).is_err());
    }

    #[tokio::test]
    async fn test_generate_with_mock() {
        let generator =
            AiBriefGenerator::new(Arc::new(MockProvider::new("m")), CompletionParams::default());
        let fr = generator.generate(Language::Fr).await.unwrap();
        assert_eq!(fr.deadline_label, "3 jours");
        let en = generator.generate(Language::En).await.unwrap();
        assert_eq!(en.deadline_label, "3 days");
    }

    #[tokio::test]
    async fn test_generate_propagates_client_error() {
        let generator = AiBriefGenerator::new(Arc::new(FailingClient), CompletionParams::default());
        let err = generator.generate(Language::Fr).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
