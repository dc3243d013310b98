//! Fixtures shared by unit tests.

use crate::cards::{
    Activation, DevelopmentCard, PolicyCard, PolicyCost, PolicyTimeline, TimeHorizon, Valence,
    Visibility,
};
use crate::deck::{Deck, GameplayDefaults, Manifest, Stages};

pub fn policy(id: &str, tags: &[&str]) -> PolicyCard {
    PolicyCard {
        id: id.to_string(),
        title: format!("Policy {}", id),
        short_description: String::new(),
        description: String::new(),
        category: "labor".to_string(),
        cost: PolicyCost {
            budget_level: 2,
            implementation_complexity: 2,
            notes: String::new(),
        },
        timeline: PolicyTimeline {
            time_to_launch: TimeHorizon::Months,
            time_to_impact: TimeHorizon::OneToTwoYears,
        },
        impact_score: 3,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        addresses_tags: Vec::new(),
        side_effect_tags: Vec::new(),
        prerequisites_policy_tags: Vec::new(),
        synergy_policy_tags: Vec::new(),
        role_restrictions: Vec::new(),
        art_prompt: String::new(),
        flavor_quote: String::new(),
    }
}

pub fn development(id: &str, stage: u32) -> DevelopmentCard {
    DevelopmentCard {
        id: id.to_string(),
        stage,
        title: format!("Development {}", id),
        short_description: String::new(),
        description: String::new(),
        valence: Valence::Positive,
        arrows_up: 1,
        arrows_down: 0,
        severity: 2,
        tags: Vec::new(),
        thread_id: "thread_0".to_string(),
        supersedes: None,
        activation: Activation::immediate(),
        effects: Vec::new(),
        art_prompt: String::new(),
        suggested_visibility: Visibility::Either,
    }
}

/// 10 policies and 12 plain developments in each of two stages
pub fn small_deck() -> Deck {
    let policies = (0..10)
        .map(|i| policy(&format!("p{:02}", i), &[&format!("tag_{}", i % 3)]))
        .collect();
    let developments = (0..2)
        .flat_map(|stage| (0..12).map(move |i| development(&format!("d{}_{:02}", stage, i), stage)))
        .collect();
    let manifest = Manifest {
        deck_id: "test".to_string(),
        gameplay_defaults: GameplayDefaults::default(),
        stages: Stages {
            count: 2,
            definitions: Vec::new(),
        },
        ..Manifest::default()
    };
    Deck::new(manifest, policies, developments)
}
