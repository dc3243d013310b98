use crate::config::GenConfig;
use crate::error::GenError;
use crate::io::write_json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;

pub const DEFAULT_CATEGORIES: [&str; 11] = [
    "macro",
    "labor",
    "firm_dynamics",
    "inequality_welfare",
    "education",
    "geopolitics",
    "infra_energy",
    "trust_misinfo",
    "governance_capacity",
    "frontier_rd",
    "safety_security",
];

pub const DEFAULT_TAGS: [&str; 25] = [
    "productivity_growth",
    "wage_dispersion",
    "job_displacement",
    "skills_mismatch",
    "automation_adoption",
    "ai_capital_investment",
    "data_governance",
    "critical_infrastructure",
    "energy_demand",
    "ai_safety_incidents",
    "cyber_escalation",
    "misinformation_spike",
    "regional_competitiveness",
    "public_trust",
    "government_capacity",
    "procurement_modernization",
    "frontier_research",
    "compute_supply",
    "innovation_spillovers",
    "export_competitiveness",
    "labor_mobility",
    "education_alignment",
    "ai_regulation",
    "social_safety_net",
    "market_concentration",
];

/// Vocabulary shared by every card in a deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub roles: Vec<String>,
}

impl Taxonomy {
    pub fn from_config(config: &GenConfig) -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
            roles: config.scenario.roles.clone(),
        }
    }

    /// Tag at `index`, wrapping around the list
    pub fn tag(&self, index: usize) -> &str {
        &self.tags[index % self.tags.len()]
    }

    pub fn category(&self, index: usize) -> &str {
        &self.categories[index % self.categories.len()]
    }
}

/// Build the taxonomy and write `meta/taxonomy.json` and `meta/tags.json`
pub fn generate_taxonomy(config: &GenConfig, out_dir: &Path) -> Result<Taxonomy, GenError> {
    let taxonomy = Taxonomy::from_config(config);
    write_json(&out_dir.join("meta/taxonomy.json"), &taxonomy)?;
    write_json(&out_dir.join("meta/tags.json"), &json!({ "tags": taxonomy.tags }))?;
    Ok(taxonomy)
}

/// `job_displacement` -> `Job Displacement`
pub fn readable_tag(tag: &str) -> String {
    tag.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_readable_tag() {
        assert_eq!(readable_tag("job_displacement"), "Job Displacement");
        assert_eq!(readable_tag("ai_regulation"), "Ai Regulation");
    }

    #[test]
    fn test_taxonomy_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GenConfig::default();
        config.scenario.roles = vec!["treasury".to_string()];

        let taxonomy = generate_taxonomy(&config, dir.path()).unwrap();
        assert_eq!(taxonomy.tags.len(), 25);
        assert_eq!(taxonomy.tag(25), "productivity_growth");

        let saved: Taxonomy = tabletop_core::deck::read_json(&dir.path().join("meta/taxonomy.json")).unwrap();
        assert_eq!(saved, taxonomy);
        assert!(dir.path().join("meta/tags.json").exists());
    }
}
