//! Static brief set used when no AI provider is configured.

use anyhow::Result;
use async_trait::async_trait;
use machine_core::{BriefContent, BriefGenerator, Language};
use rand::seq::SliceRandom;

struct Template {
    company_name: &'static str,
    company_description: &'static str,
    job_description: &'static str,
    deadline: &'static str,
}

const FR_BRIEFS: &[Template] = &[
    Template {
        company_name: "Café Nuage",
        company_description: "Nous sommes un petit café artisanal qui torréfie son propre café. Notre produit se distingue par sa **qualité supérieure** et son processus de torréfaction unique. Notre audience cible est les **amateurs de café exigeants**. Nous voulons transmettre une ambiance **chaleureuse et authentique**.",
        job_description: "Vous devez créer un nouveau **packaging** pour notre café signature. Nous voulons un design **minimaliste** qui met en valeur l'artisanat. Utilisez des **tons terre** et notre couleur principale qui est le **marron foncé**. Assurez-vous que le nom du produit soit bien visible.",
        deadline: "5 jours",
    },
    Template {
        company_name: "TechVert",
        company_description: "Nous sommes une startup qui développe des **solutions technologiques écologiques**. Notre produit principal est une application de suivi carbone. Notre audience cible est les **entreprises soucieuses de l'environnement**. Nous voulons transmettre **innovation et responsabilité**.",
        job_description: "Créez une **affiche promotionnelle** pour notre nouvelle application. Le design doit être **moderne et épuré** avec des éléments naturels. Utilisez du **vert et du blanc** comme couleurs principales. Incluez notre slogan et des visuels représentant la technologie et la nature.",
        deadline: "7 jours",
    },
    Template {
        company_name: "Atelier Lumière",
        company_description: "Nous sommes un studio de design d'intérieur spécialisé dans **l'éclairage**. Nos créations se distinguent par leur **élégance et leur fonctionnalité**. Notre clientèle est **haut de gamme**. Nous voulons véhiculer **luxe et innovation**.",
        job_description: "Concevez une nouvelle **identité visuelle complète** pour notre studio. Nous recherchons un style **sophistiqué et contemporain**. Les couleurs doivent évoquer la lumière : **or, blanc, et noir**. Le logo doit être **adaptable** à différents supports.",
        deadline: "10 jours",
    },
];

const EN_BRIEFS: &[Template] = &[
    Template {
        company_name: "Cloud Café",
        company_description: "A small craft café that roasts its own beans. The product stands out through its **superior quality** and a unique roasting process. The audience is **demanding coffee lovers**, and the brand should feel **warm and authentic**.",
        job_description: "Design new **packaging** for the signature blend. Keep it **minimalist** and let the craft show. Use **earth tones** with **dark brown** as the main color, and make the product name clearly visible.",
        deadline: "5 days",
    },
    Template {
        company_name: "GreenTech",
        company_description: "A startup building **eco-friendly technology**, starting with a carbon-tracking app. It targets **environmentally conscious companies** and wants to convey **innovation and responsibility**.",
        job_description: "Create a **promotional poster** for the new app. The design should be **modern and clean** with natural elements, in **green and white**. Include the slogan and visuals that blend technology and nature.",
        deadline: "7 days",
    },
];

#[derive(Debug, Default, Clone)]
pub struct FallbackGenerator;

impl FallbackGenerator {
    pub fn new() -> Self {
        Self
    }

    fn templates(language: Language) -> &'static [Template] {
        match language {
            Language::Fr => FR_BRIEFS,
            Language::En => EN_BRIEFS,
        }
    }
}

#[async_trait]
impl BriefGenerator for FallbackGenerator {
    async fn generate(&self, language: Language) -> Result<BriefContent> {
        let templates = Self::templates(language);
        let template = templates
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| anyhow::anyhow!("No fallback briefs for {language}"))?;
        Ok(BriefContent {
            company_name: template.company_name.to_string(),
            company_description: template.company_description.to_string(),
            job_description: template.job_description.to_string(),
            deadline_label: template.deadline.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use machine_core::parse_deadline_days;

    #[tokio::test]
    async fn test_fallback_never_fails() {
        let generator = FallbackGenerator::new();
        for _ in 0..20 {
            let fr = generator.generate(Language::Fr).await.unwrap();
            assert!(FR_BRIEFS.iter().any(|t| t.company_name == fr.company_name));
            let en = generator.generate(Language::En).await.unwrap();
            assert!(EN_BRIEFS.iter().any(|t| t.company_name == en.company_name));
        }
    }

    #[test]
    fn test_every_template_has_a_day_count() {
        for t in FR_BRIEFS.iter().chain(EN_BRIEFS) {
            assert!(parse_deadline_days(t.deadline).is_some(), "{}", t.company_name);
        }
    }
}
