//! Development cards, one file per stage.
//!
//! Stages are generated concurrently. A semaphore sized by
//! `runtime.concurrency_text` bounds how many model requests are in flight.

use crate::config::GenConfig;
use crate::error::GenError;
use crate::io::{write_json, write_jsonl};
use crate::openai::{build_text_payload, parse_cards, parse_response_json, OpenAiClient};
use crate::schemas;
use crate::taxonomy::{readable_tag, Taxonomy};
use futures::future::try_join_all;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tabletop_core::deck::{developments_file, read_jsonl, STAGE_SUMMARIES_FILE};
use tabletop_core::{Activation, DevelopmentCard, Effect, StageSummary, Valence, Visibility};
use tokio::sync::Semaphore;
use tracing::{info, warn};

pub fn development_id(stage: u32, index: usize) -> String {
    format!("dev_s{}_{:02}", stage, index)
}

/// Generate every stage's developments plus `meta/stage_summaries.json`.
/// Cards come back ordered by stage.
pub async fn generate_stage_cards(
    config: &GenConfig,
    taxonomy: &Taxonomy,
    client: &OpenAiClient,
    out_dir: &Path,
) -> Result<Vec<DevelopmentCard>, GenError> {
    let permits = Arc::new(Semaphore::new(config.runtime.concurrency_text));

    let tasks = config
        .deck_sizes
        .developments_per_stage
        .iter()
        .enumerate()
        .map(|(stage, &count)| {
            let permits = Arc::clone(&permits);
            async move {
                let _permit = permits
                    .acquire()
                    .await
                    .map_err(|e| GenError::Task(e.to_string()))?;
                generate_stage(config, taxonomy, client, out_dir, stage as u32, count as usize)
                    .await
            }
        });
    let stages = try_join_all(tasks).await?;

    let summaries: Vec<StageSummary> = stages
        .iter()
        .enumerate()
        .map(|(stage, cards)| stage_summary(stage as u32, cards))
        .collect();
    write_json(&out_dir.join(STAGE_SUMMARIES_FILE), &summaries)?;

    Ok(stages.into_iter().flatten().collect())
}

async fn generate_stage(
    config: &GenConfig,
    taxonomy: &Taxonomy,
    client: &OpenAiClient,
    out_dir: &Path,
    stage: u32,
    count: usize,
) -> Result<Vec<DevelopmentCard>, GenError> {
    let path = out_dir.join(developments_file(stage));
    if config.runtime.resume && path.exists() {
        let cards: Vec<DevelopmentCard> = read_jsonl(&path)?;
        info!("Reusing {} stage {} developments", cards.len(), stage);
        return Ok(cards);
    }

    let mut cards = if client.is_dummy() {
        Vec::new()
    } else {
        let name = format!("developments_stage{}", stage);
        let payload = build_text_payload(
            &stage_prompt(config, taxonomy, stage, count),
            &config.models.text,
            schemas::development_cards(),
            &name,
        );
        let response = client.responses(&name, &payload).await?;
        parse_cards(parse_response_json(&response), "development")
    };

    if cards.len() < count && !client.is_dummy() {
        warn!(
            "Model returned {} of {} stage {} developments, filling the rest with placeholders",
            cards.len(),
            count,
            stage
        );
    }
    cards.truncate(count);
    renumber(stage, &mut cards);
    for i in cards.len()..count {
        cards.push(placeholder_development(stage, i, taxonomy));
    }

    write_jsonl(&path, &cards)?;
    info!("Wrote {} stage {} developments", cards.len(), stage);
    Ok(cards)
}

/// Give model cards canonical ids and keep their supersedes links pointing
/// at the renamed cards. Links to unknown cards are dropped.
fn renumber(stage: u32, cards: &mut [DevelopmentCard]) {
    let renamed: HashMap<String, String> = cards
        .iter()
        .enumerate()
        .map(|(i, card)| (card.id.clone(), development_id(stage, i)))
        .collect();

    for (i, card) in cards.iter_mut().enumerate() {
        card.id = development_id(stage, i);
        card.stage = stage;
        if let Some(target) = card.supersedes.take() {
            match renamed.get(&target) {
                Some(new_id) if *new_id != card.id => card.supersedes = Some(new_id.clone()),
                _ => warn!("Dropping supersedes link {} from {}", target, card.id),
            }
        }
    }
}

fn stage_prompt(config: &GenConfig, taxonomy: &Taxonomy, stage: u32, count: usize) -> String {
    let definition = config.stage_definition(stage);
    let mix = &config.mix_targets;
    let mut prompt = format!(
        "Write {count} development cards for stage {stage} ({name}) of a tabletop exercise about \
         the AI economy.\n\
         Time horizon: {horizon}. Capability profile: {profile}.\n\
         Scenario: {scenario}. Tone: {tone}.\n\
         Use ids dev_s{stage}_00 upwards and set stage to {stage}.\n\
         Pick tags and required_policy_tags from: {tags}.\n\
         Aim for about {positive:.0}% positive cards, {supersedes:.0}% that supersede an earlier \
         card of this stage, {conditional:.0}% conditional on policy tags, {powerup:.0}% carrying \
         effects and {quantitative:.0}% citing a quantitative indicator.\n\
         Effects draw developments now (DRAW_DEV_NOW, DRAW_DEV_NEXT_STAGE_NOW) or adjust next \
         round's draws and this round's policy limit by a delta.\n",
        count = count,
        stage = stage,
        name = definition.name,
        horizon = definition.time_horizon,
        profile = definition.capability_profile,
        scenario = config.scenario.name,
        tone = config.scenario.tone,
        tags = taxonomy.tags.join(", "),
        positive = mix.positive_share * 100.0,
        supersedes = mix.supersedes_share * 100.0,
        conditional = mix.conditional_share * 100.0,
        powerup = mix.powerup_share * 100.0,
        quantitative = mix.quantitative_indicator_share * 100.0,
    );
    if !config.scenario.injection.is_empty() {
        prompt.push_str(&format!(
            "Additional scenario guidance: {}\n",
            config.scenario.injection
        ));
    }
    prompt
}

/// Deterministic stand-in used when no model is available.
///
/// Every third card is negative, every fifth after the first supersedes the
/// stage's opening card, every seventh is conditional on its own tag and every
/// ninth draws another development.
pub fn placeholder_development(stage: u32, i: usize, taxonomy: &Taxonomy) -> DevelopmentCard {
    let tag = taxonomy.tag(stage as usize * 7 + i).to_string();
    let readable = readable_tag(&tag);
    let valence = if i % 3 == 0 {
        Valence::Negative
    } else {
        Valence::Positive
    };
    let activation = if i % 7 == 0 {
        Activation::conditional(vec![tag.clone()])
    } else {
        Activation::immediate()
    };

    DevelopmentCard {
        id: development_id(stage, i),
        stage,
        title: format!("Stage {} {} Shift", stage, readable),
        short_description: format!("Observed shift in {}.", readable.to_lowercase()),
        description: "A grounded development reflecting current AI deployment trends and \
            measurable economic impacts. The effects remain plausible for the stage horizon and \
            provide concrete policy levers."
            .to_string(),
        valence,
        arrows_up: if valence == Valence::Positive { 2 } else { 0 },
        arrows_down: if valence == Valence::Negative { 2 } else { 0 },
        severity: 2 + (i % 3) as u8,
        tags: vec![tag],
        thread_id: format!("thread_{}", i % 5),
        supersedes: (i >= 5 && i % 5 == 0).then(|| development_id(stage, 0)),
        activation,
        effects: if i % 9 == 0 {
            vec![Effect::draw_now(1, 0)]
        } else {
            Vec::new()
        },
        art_prompt: format!(
            "Horizontal illustration showing {} dynamics, clear space top-left, no readable text.",
            readable.to_lowercase()
        ),
        suggested_visibility: if i % 2 == 0 {
            Visibility::Faceup
        } else {
            Visibility::Facedown
        },
    }
}

pub fn stage_summary(stage: u32, cards: &[DevelopmentCard]) -> StageSummary {
    let first_tag = |card: Option<&DevelopmentCard>| {
        card.and_then(|c| c.tags.first())
            .cloned()
            .unwrap_or_else(|| "general conditions".to_string())
    };

    StageSummary {
        stage,
        facts: vec![
            format!(
                "Stage {} shows continued movement in {}.",
                stage,
                first_tag(cards.first())
            ),
            "Policymakers respond to AI adoption with targeted interventions.".to_string(),
        ],
        changes_vs_prior: vec![format!(
            "Stage {} introduces new pressures in {}.",
            stage,
            first_tag(cards.last())
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabletop_core::ActivationKind;

    fn taxonomy() -> Taxonomy {
        Taxonomy::from_config(&GenConfig::default())
    }

    #[test]
    fn test_placeholder_mix() {
        let taxonomy = taxonomy();
        let cards: Vec<_> = (0..16)
            .map(|i| placeholder_development(1, i, &taxonomy))
            .collect();

        assert_eq!(cards[0].id, "dev_s1_00");
        assert_eq!(cards[0].tags, vec!["critical_infrastructure"]);
        assert_eq!(cards[0].valence, Valence::Negative);
        assert_eq!(cards[0].activation.kind, ActivationKind::Conditional);
        assert_eq!(cards[0].effects, vec![Effect::draw_now(1, 0)]);
        assert_eq!(cards[10].supersedes.as_deref(), Some("dev_s1_00"));
        assert_eq!(cards[5].supersedes.as_deref(), Some("dev_s1_00"));
        assert_eq!(cards[6].supersedes, None);
        assert_eq!(cards[7].activation.required_policy_tags, cards[7].tags);
        assert_eq!(cards[3].suggested_visibility, Visibility::Facedown);
        assert_eq!(cards[4].thread_id, "thread_4");
    }

    #[test]
    fn test_renumber_keeps_supersedes_links() {
        let taxonomy = taxonomy();
        let mut a = placeholder_development(0, 1, &taxonomy);
        a.id = "labor_shock".to_string();
        let mut b = placeholder_development(0, 2, &taxonomy);
        b.id = "labor_rebound".to_string();
        b.supersedes = Some("labor_shock".to_string());
        let mut c = placeholder_development(0, 3, &taxonomy);
        c.id = "orphan".to_string();
        c.supersedes = Some("nowhere".to_string());
        c.stage = 4;

        let mut cards = vec![a, b, c];
        renumber(0, &mut cards);

        assert_eq!(cards[1].id, "dev_s0_01");
        assert_eq!(cards[1].supersedes.as_deref(), Some("dev_s0_00"));
        assert_eq!(cards[2].supersedes, None);
        assert_eq!(cards[2].stage, 0);
    }

    #[test]
    fn test_stage_summary() {
        let taxonomy = taxonomy();
        let cards: Vec<_> = (0..3)
            .map(|i| placeholder_development(0, i, &taxonomy))
            .collect();
        let summary = stage_summary(0, &cards);

        assert_eq!(
            summary.facts[0],
            "Stage 0 shows continued movement in productivity_growth."
        );
        assert_eq!(
            summary.changes_vs_prior,
            vec!["Stage 0 introduces new pressures in job_displacement."]
        );
        assert_eq!(
            stage_summary(2, &[]).facts[0],
            "Stage 2 shows continued movement in general conditions."
        );
    }

    #[tokio::test]
    async fn test_dummy_stages() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GenConfig::default();
        config.deck_sizes.developments_per_stage = vec![3, 4];
        config.runtime.concurrency_text = 1;
        let client = OpenAiClient::dummy(&config.runtime).unwrap();

        let cards = generate_stage_cards(&config, &taxonomy(), &client, dir.path())
            .await
            .unwrap();
        assert_eq!(cards.len(), 7);
        assert_eq!(cards[3].id, "dev_s1_00");

        let summaries: Vec<StageSummary> =
            tabletop_core::deck::read_json(&dir.path().join(STAGE_SUMMARIES_FILE)).unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(dir.path().join("cards/developments.stage1.jsonl").exists());
    }
}
