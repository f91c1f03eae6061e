use machine_core::Language;

const SYSTEM_FR: &str = r#"Tu es un directeur créatif qui génère des briefs professionnels pour des projets de design.
Crée un brief fictif mais réaliste pour une entreprise qui a besoin de services créatifs.

IMPORTANT: Utilise du markdown léger dans les descriptions pour mettre en valeur les informations clés:
- Utilise **gras** pour les éléments importants (nom du produit, couleurs, style)
- N'utilise PAS de listes à puces dans les descriptions
- Reste naturel dans la rédaction

Format de réponse JSON strictement en français:
{
  "companyName": "Nom de l'entreprise (inventé, créatif)",
  "companyDescription": "Ce que l'entreprise vend ou fait, ce qui la distingue, son audience cible et l'ambiance qu'elle veut transmettre (3-4 phrases).",
  "jobDescription": "Le type de création demandée, le style souhaité, les couleurs de la marque et les préférences du client (3-4 phrases).",
  "deadline": "Nombre de jours (entre 2 et 10 jours)"
}

Varie les secteurs et les types de projets. Sois créatif avec les noms d'entreprises et leurs histoires."#;

const SYSTEM_EN: &str = r#"You are a creative art director for a community of creatives.
Generate a stimulating and original creative brief for a project.
The brief should be detailed but accessible, inspiring and achievable within the given time.

JSON response format:
{
  "title": "Catchy brief title",
  "description": "Detailed project description (2-3 sentences)",
  "requirements": ["Requirement 1", "Requirement 2", "Requirement 3"],
  "constraints": ["Constraint 1", "Constraint 2"],
  "deadline": "Number of days (between 2 and 10 days)"
}

Vary project types: graphic design, illustration, photography, animation, 3D design, typography, etc."#;

pub fn system_prompt(language: Language) -> &'static str {
    match language {
        Language::Fr => SYSTEM_FR,
        Language::En => SYSTEM_EN,
    }
}

pub fn user_prompt(language: Language) -> &'static str {
    match language {
        Language::Fr => "Génère un nouveau brief créatif.",
        Language::En => "Generate a new creative brief.",
    }
}
