use crate::config::GenConfig;
use crate::error::GenError;
use crate::io::write_jsonl;
use crate::openai::{build_text_payload, parse_cards, parse_response_json, OpenAiClient};
use crate::schemas;
use crate::taxonomy::{readable_tag, Taxonomy};
use std::path::Path;
use tabletop_core::deck::{read_jsonl, POLICIES_FILE};
use tabletop_core::{PolicyCard, PolicyCost, PolicyTimeline, TimeHorizon};
use tracing::{info, warn};

pub fn policy_id(index: usize) -> String {
    format!("policy_{:03}", index)
}

/// Generate `policies_total` policy cards and write `cards/policies.jsonl`.
///
/// With `resume` set and the file already present, the existing cards are
/// returned untouched.
pub async fn generate_policies(
    config: &GenConfig,
    taxonomy: &Taxonomy,
    client: &OpenAiClient,
    out_dir: &Path,
) -> Result<Vec<PolicyCard>, GenError> {
    let path = out_dir.join(POLICIES_FILE);
    if config.runtime.resume && path.exists() {
        let cards: Vec<PolicyCard> = read_jsonl(&path)?;
        info!("Reusing {} policies from {}", cards.len(), path.display());
        return Ok(cards);
    }

    let total = config.deck_sizes.policies_total as usize;
    let mut cards = if client.is_dummy() {
        Vec::new()
    } else {
        let prompt = policy_prompt(config, taxonomy);
        let payload = build_text_payload(
            &prompt,
            &config.models.text,
            schemas::policy_cards(),
            "policies",
        );
        let response = client.responses("policies", &payload).await?;
        parse_cards(parse_response_json(&response), "policy")
    };

    if cards.len() < total && !client.is_dummy() {
        warn!(
            "Model returned {} of {} policies, filling the rest with placeholders",
            cards.len(),
            total
        );
    }
    cards.truncate(total);
    for i in cards.len()..total {
        cards.push(placeholder_policy(i, taxonomy));
    }
    for (i, card) in cards.iter_mut().enumerate() {
        card.id = policy_id(i);
    }

    write_jsonl(&path, &cards)?;
    info!("Wrote {} policies", cards.len());
    Ok(cards)
}

fn policy_prompt(config: &GenConfig, taxonomy: &Taxonomy) -> String {
    let scenario = &config.scenario;
    let mut prompt = format!(
        "Write {count} policy cards for a tabletop exercise about governing the AI economy.\n\
         Scenario: {name}. Tone: {tone}.\n\
         Each card is a concrete government intervention a player can implement.\n\
         Use ids policy_000 upwards.\n\
         Pick each category from: {categories}.\n\
         Pick tags and addresses_tags from: {tags}.\n\
         Budget level, implementation complexity and impact score range from 1 to 5.\n\
         Art prompts describe a horizontal illustration with clear space top-left and no readable text.\n",
        count = config.deck_sizes.policies_total,
        name = scenario.name,
        tone = scenario.tone,
        categories = taxonomy.categories.join(", "),
        tags = taxonomy.tags.join(", "),
    );
    if !taxonomy.roles.is_empty() {
        prompt.push_str(&format!(
            "role_restrictions may name these roles: {}.\n",
            taxonomy.roles.join(", ")
        ));
    }
    if !scenario.injection.is_empty() {
        prompt.push_str(&format!("Additional scenario guidance: {}\n", scenario.injection));
    }
    prompt
}

/// Deterministic stand-in used when no model is available
pub fn placeholder_policy(i: usize, taxonomy: &Taxonomy) -> PolicyCard {
    let tag = taxonomy.tag(i).to_string();
    let readable = readable_tag(&tag);
    let level = 2 + (i % 3) as u8;

    PolicyCard {
        id: policy_id(i),
        title: format!("{} Initiative", readable),
        short_description: format!("Targeted action on {}.", readable.to_lowercase()),
        description: "A grounded, policy-relevant initiative that addresses immediate AI economy \
            risks and opportunities. It coordinates public agencies and private stakeholders to \
            implement measurable interventions."
            .to_string(),
        category: taxonomy.category(i).to_string(),
        cost: PolicyCost {
            budget_level: level,
            implementation_complexity: level,
            notes: "Balanced fiscal impact with shared responsibility.".to_string(),
        },
        timeline: PolicyTimeline {
            time_to_launch: TimeHorizon::Months,
            time_to_impact: TimeHorizon::OneToTwoYears,
        },
        impact_score: level,
        tags: vec![tag.clone()],
        addresses_tags: vec![tag],
        side_effect_tags: Vec::new(),
        prerequisites_policy_tags: Vec::new(),
        synergy_policy_tags: Vec::new(),
        role_restrictions: Vec::new(),
        art_prompt: format!(
            "Horizontal illustration of policymakers collaborating on {}, clear space top-left, no readable text.",
            readable.to_lowercase()
        ),
        flavor_quote: "\u{201c}Policy is how we steer technology toward shared prosperity.\u{201d}"
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_placeholder_policy() {
        let taxonomy = Taxonomy::from_config(&GenConfig::default());
        let card = placeholder_policy(4, &taxonomy);
        assert_eq!(card.id, "policy_004");
        assert_eq!(card.title, "Automation Adoption Initiative");
        assert_eq!(card.category, "education");
        assert_eq!(card.impact_score, 3);
        assert_eq!(card.tags, vec!["automation_adoption"]);
    }

    #[test]
    fn test_parse_cards_tolerates_bad_output() {
        let parse = |body| parse_cards::<PolicyCard>(body, "policy");
        assert!(parse(None).is_empty());
        assert!(parse(Some(json!({}))).is_empty());
        assert!(parse(Some(json!({"cards": [{"id": 3}]}))).is_empty());
    }

    #[test]
    fn test_parse_cards_keeps_well_formed_entries() {
        let taxonomy = Taxonomy::from_config(&GenConfig::default());
        let first = placeholder_policy(0, &taxonomy);
        let second = placeholder_policy(1, &taxonomy);
        let mut broken = serde_json::to_value(&second).unwrap();
        broken["timeline"]["time_to_launch"] = json!("decades");

        let body = json!({
            "cards": [
                serde_json::to_value(&first).unwrap(),
                broken,
                serde_json::to_value(&second).unwrap(),
            ]
        });
        let cards: Vec<PolicyCard> = parse_cards(Some(body), "policy");
        assert_eq!(cards, vec![first, second]);
    }

    #[tokio::test]
    async fn test_dummy_generation() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GenConfig::default();
        config.deck_sizes.policies_total = 5;
        let taxonomy = Taxonomy::from_config(&config);
        let client = OpenAiClient::dummy(&config.runtime).unwrap();

        let cards = generate_policies(&config, &taxonomy, &client, dir.path())
            .await
            .unwrap();
        assert_eq!(cards.len(), 5);
        assert_eq!(cards[4].id, "policy_004");

        let saved: Vec<PolicyCard> = read_jsonl(&dir.path().join(POLICIES_FILE)).unwrap();
        assert_eq!(saved, cards);
    }
}
