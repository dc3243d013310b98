//! Card records.
//!
//! This module contains:
//! - Policy cards that players hold in hand and implement
//! - Development cards that appear on the table each stage
//! - Effects carried by development cards
//!
//! Field names and enum spellings match the deck JSON/JSONL files produced
//! by the generator, so a card survives a load/save cycle unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How long a policy takes to launch or to show impact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeHorizon {
    #[serde(rename = "immediate")]
    Immediate,
    #[serde(rename = "weeks")]
    Weeks,
    #[serde(rename = "months")]
    Months,
    #[serde(rename = "1-2y")]
    OneToTwoYears,
    #[serde(rename = "3-5y")]
    ThreeToFiveYears,
}

impl TimeHorizon {
    pub const ALL: [TimeHorizon; 5] = [
        TimeHorizon::Immediate,
        TimeHorizon::Weeks,
        TimeHorizon::Months,
        TimeHorizon::OneToTwoYears,
        TimeHorizon::ThreeToFiveYears,
    ];

    /// Wire spelling, as used in prompts and schemas
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeHorizon::Immediate => "immediate",
            TimeHorizon::Weeks => "weeks",
            TimeHorizon::Months => "months",
            TimeHorizon::OneToTwoYears => "1-2y",
            TimeHorizon::ThreeToFiveYears => "3-5y",
        }
    }
}

/// Budget and complexity of implementing a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCost {
    /// 1 (cheap) to 5 (very expensive)
    pub budget_level: u8,
    /// 1 (trivial) to 5 (very hard)
    pub implementation_complexity: u8,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTimeline {
    pub time_to_launch: TimeHorizon,
    pub time_to_impact: TimeHorizon,
}

/// A policy card held in hand and implemented during play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCard {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub cost: PolicyCost,
    pub timeline: PolicyTimeline,
    /// 1 to 5
    pub impact_score: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub addresses_tags: Vec<String>,
    #[serde(default)]
    pub side_effect_tags: Vec<String>,
    #[serde(default)]
    pub prerequisites_policy_tags: Vec<String>,
    #[serde(default)]
    pub synergy_policy_tags: Vec<String>,
    #[serde(default)]
    pub role_restrictions: Vec<String>,
    #[serde(default)]
    pub art_prompt: String,
    #[serde(default)]
    pub flavor_quote: String,
}

impl PolicyCard {
    /// Tags this policy contributes once implemented (own tags plus addressed tags)
    pub fn all_tags(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .chain(self.addresses_tags.iter())
            .map(String::as_str)
    }

    /// Whether this policy carries the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.all_tags().any(|t| t == tag)
    }
}

/// Overall direction of a development
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Valence {
    Positive,
    Negative,
    Mixed,
}

impl Valence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Valence::Positive => "positive",
            Valence::Negative => "negative",
            Valence::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationKind {
    /// Takes effect as soon as it is revealed
    Immediate,
    /// Waits dormant until the required policy tags are implemented
    Conditional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    #[serde(rename = "type")]
    pub kind: ActivationKind,
    #[serde(default)]
    pub required_policy_tags: Vec<String>,
}

impl Activation {
    pub fn immediate() -> Self {
        Self {
            kind: ActivationKind::Immediate,
            required_policy_tags: Vec::new(),
        }
    }

    pub fn conditional(tags: Vec<String>) -> Self {
        Self {
            kind: ActivationKind::Conditional,
            required_policy_tags: tags,
        }
    }
}

/// Which side up the generator suggests dealing a development
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Faceup,
    Facedown,
    Either,
}

/// Effect operations a development can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectKind {
    /// Draw developments face-up right away, optionally from a later stage
    DrawDevNow,
    /// Draw developments face-up from the next stage right away
    DrawDevNextStageNow,
    /// Adjust how many developments are drawn face-up next round
    ModifyDevDrawNextRound,
    /// Adjust how many policies are drawn next round
    ModifyPolicyDrawNextRound,
    /// Adjust how many policies may be played this round
    ModifyMaxPoliciesThisRound,
}

impl EffectKind {
    pub const ALL: [EffectKind; 5] = [
        EffectKind::DrawDevNow,
        EffectKind::DrawDevNextStageNow,
        EffectKind::ModifyDevDrawNextRound,
        EffectKind::ModifyPolicyDrawNextRound,
        EffectKind::ModifyMaxPoliciesThisRound,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::DrawDevNow => "DRAW_DEV_NOW",
            EffectKind::DrawDevNextStageNow => "DRAW_DEV_NEXT_STAGE_NOW",
            EffectKind::ModifyDevDrawNextRound => "MODIFY_DEV_DRAW_NEXT_ROUND",
            EffectKind::ModifyPolicyDrawNextRound => "MODIFY_POLICY_DRAW_NEXT_ROUND",
            EffectKind::ModifyMaxPoliciesThisRound => "MODIFY_MAX_POLICIES_THIS_ROUND",
        }
    }
}

/// Effect parameters. Every field is present on the wire, unused ones as null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectParams {
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub stage_offset: Option<u32>,
    #[serde(default)]
    pub delta: Option<i32>,
}

/// A tagged operation altering round modifiers or drawing more cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    #[serde(default)]
    pub params: EffectParams,
}

impl Effect {
    pub fn draw_now(count: u32, stage_offset: u32) -> Self {
        Self {
            kind: EffectKind::DrawDevNow,
            params: EffectParams {
                count: Some(count),
                stage_offset: Some(stage_offset),
                delta: None,
            },
        }
    }

    pub fn draw_next_stage_now(count: u32) -> Self {
        Self {
            kind: EffectKind::DrawDevNextStageNow,
            params: EffectParams {
                count: Some(count),
                ..Default::default()
            },
        }
    }

    /// One of the three modifier effects with the given delta
    pub fn modifier(kind: EffectKind, delta: i32) -> Self {
        Self {
            kind,
            params: EffectParams {
                delta: Some(delta),
                ..Default::default()
            },
        }
    }

    /// Number of cards to draw (defaults to 1)
    pub fn count(&self) -> u32 {
        self.params.count.unwrap_or(1)
    }

    /// Stage offset for draws (defaults to 0)
    pub fn stage_offset(&self) -> u32 {
        self.params.stage_offset.unwrap_or(0)
    }

    /// Modifier delta (defaults to 0)
    pub fn delta(&self) -> i32 {
        self.params.delta.unwrap_or(0)
    }
}

/// A development card revealed on the table as the simulation unfolds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevelopmentCard {
    pub id: String,
    pub stage: u32,
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    pub valence: Valence,
    /// 0 to 3
    #[serde(default)]
    pub arrows_up: u8,
    /// 0 to 3
    #[serde(default)]
    pub arrows_down: u8,
    /// 1 to 5
    pub severity: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thread_id: String,
    /// Id of an earlier development this one replaces
    #[serde(default)]
    pub supersedes: Option<String>,
    pub activation: Activation,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub art_prompt: String,
    pub suggested_visibility: Visibility,
}

impl DevelopmentCard {
    pub fn is_conditional(&self) -> bool {
        self.activation.kind == ActivationKind::Conditional
    }

    /// Whether the activation requirements are covered by the given tags.
    /// Immediate developments are always met.
    pub fn requirements_met(&self, implemented_tags: &HashSet<String>) -> bool {
        !self.is_conditional()
            || self
                .activation
                .required_policy_tags
                .iter()
                .all(|t| implemented_tags.contains(t))
    }

    /// How many of this card's required tags a policy covers
    pub fn requirements_covered_by(&self, policy: &PolicyCard) -> usize {
        self.activation
            .required_policy_tags
            .iter()
            .filter(|t| policy.has_tag(t))
            .count()
    }
}
