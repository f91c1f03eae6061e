//! Channel-facing formatting of briefs and admin alerts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::brief::Brief;
use crate::settings::Language;

pub const BRIEF_COLOR: u32 = 0x5865F2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn new(name: &str, value: String, inline: bool) -> Self {
        Self {
            name: name.to_string(),
            value,
            inline,
        }
    }
}

/// A brief rendered as a rich message (title, fields, footer).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BriefMessage {
    pub title: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: String,
    pub timestamp: DateTime<Utc>,
}

impl BriefMessage {
    pub fn for_brief(brief: &Brief, language: Language) -> Self {
        let (title, name, company, job) = match language {
            Language::Fr => (
                "📋 NOUVEAU BRIEF CRÉATIF",
                "Nom de l'entreprise",
                "Description de l'entreprise",
                "Description du travail",
            ),
            Language::En => (
                "📋 NEW CREATIVE BRIEF",
                "Company name",
                "Company description",
                "Job description",
            ),
        };

        Self {
            title: title.to_string(),
            color: BRIEF_COLOR,
            fields: vec![
                EmbedField::new(name, format!("**{}**", brief.content.company_name), false),
                EmbedField::new(company, brief.content.company_description.clone(), false),
                EmbedField::new(job, brief.content.job_description.clone(), false),
                EmbedField::new(
                    "Deadline",
                    format!("<t:{}:R>", brief.deadline.timestamp()),
                    true,
                ),
            ],
            footer: format!("Brief ID: {}", brief.id),
            timestamp: brief.created_at,
        }
    }

    /// Plain-text rendering for channels without rich embeds.
    pub fn to_plain_text(&self) -> String {
        let mut out = format!("**{}**\n", self.title);
        for field in &self.fields {
            out.push_str(&format!("\n__{}__\n{}\n", field.name, field.value));
        }
        out.push_str(&format!("\n_{}_", self.footer));
        out
    }
}

/// Text of a direct-message alert to the operator.
pub fn format_admin_alert(message: &str, detail: Option<&str>) -> String {
    let details = match detail {
        Some(d) => format!("\n\n**Détails de l'erreur :**\n```\n{}\n```", d),
        None => String::new(),
    };
    format!("🚨 **Alerte Bot La Machine** 🚨\n\n{}{}", message, details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brief::BriefContent;

    fn brief() -> Brief {
        Brief::new(
            BriefContent {
                company_name: "TechVert".into(),
                company_description: "Une startup verte".into(),
                job_description: "Une affiche".into(),
                deadline_label: "7 jours".into(),
            },
            "chan",
            48,
            Utc::now(),
        )
    }

    #[test]
    fn test_brief_message_fields() {
        let b = brief();
        let msg = BriefMessage::for_brief(&b, Language::Fr);
        assert_eq!(msg.title, "📋 NOUVEAU BRIEF CRÉATIF");
        assert_eq!(msg.color, BRIEF_COLOR);
        assert_eq!(msg.fields.len(), 4);
        assert_eq!(msg.fields[0].value, "**TechVert**");
        assert_eq!(msg.fields[3].value, format!("<t:{}:R>", b.deadline.timestamp()));
        assert!(msg.fields[3].inline);
        assert_eq!(msg.footer, format!("Brief ID: {}", b.id));
    }

    #[test]
    fn test_english_labels() {
        let msg = BriefMessage::for_brief(&brief(), Language::En);
        assert_eq!(msg.title, "📋 NEW CREATIVE BRIEF");
        assert_eq!(msg.fields[0].name, "Company name");
        assert!(msg.to_plain_text().contains("Company description"));
    }

    #[test]
    fn test_admin_alert_format() {
        let plain = format_admin_alert("Génération échouée", None);
        assert!(plain.starts_with("🚨 **Alerte Bot La Machine** 🚨"));
        assert!(!plain.contains("```"));

        let detailed = format_admin_alert("Génération échouée", Some("timeout"));
        assert!(detailed.contains("```\ntimeout\n```"));
    }
}
