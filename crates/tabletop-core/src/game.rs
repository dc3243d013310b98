//! Core table state machine.
//!
//! This module contains the main `GameState` struct and the reducer that
//! drives deal / draw / play / attach / advance / undo / redo.

use crate::actions::{GameAction, GameEvent, Pile, TableZone};
use crate::cards::{DevelopmentCard, Effect, EffectKind, PolicyCard};
use crate::deck::{Deck, GameplayDefaults};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Maximum number of snapshots kept for undo
pub const HISTORY_LIMIT: usize = 100;

/// Bound on chained effect draws within a single transition
const MAX_EFFECT_DEPTH: u32 = 8;

/// Errors that can occur when applying actions.
///
/// The state is never modified when an error is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("No card with id {0}")]
    NoSuchCard(String),

    #[error("Policy {0} has not been implemented")]
    PolicyNotImplemented(String),

    #[error("Round limit of {limit} policies reached")]
    RoundLimitReached { limit: u32 },

    #[error("Already at the final stage")]
    FinalStage,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("Invalid action")]
    InvalidAction,
}

/// Adjustments made by development effects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundModifiers {
    /// Added to the face-up development draw at the start of the next round
    pub dev_draw_next_round: i32,
    /// Added to the policy draw at the start of the next round
    pub policy_draw_next_round: i32,
    /// Added to the policy play limit for the current round
    pub max_policies_this_round: i32,
}

/// A development attached to an implemented policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub policy_id: String,
    pub development: DevelopmentCard,
}

/// Everything an undo step restores
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Current stage index (starts at 0)
    pub stage: u32,
    /// Round number within the game (0 before the first advance)
    pub round: u32,
    /// Number of deals made so far; mixes into the shuffle seed
    pub deals: u32,
    /// Policy draw pile, top at the end
    pub policy_pile: Vec<PolicyCard>,
    pub policy_discard: Vec<PolicyCard>,
    pub hand: Vec<PolicyCard>,
    /// Implemented policies in play order
    pub implemented: Vec<PolicyCard>,
    /// One draw pile per stage, top at the end
    pub development_piles: Vec<Vec<DevelopmentCard>>,
    pub face_up: Vec<DevelopmentCard>,
    pub face_down: Vec<DevelopmentCard>,
    pub dormant: Vec<DevelopmentCard>,
    pub attached: Vec<Attachment>,
    pub development_discard: Vec<DevelopmentCard>,
    pub modifiers: RoundModifiers,
    pub policies_played_this_round: u32,
}

impl Table {
    /// Tags contributed by every implemented policy
    pub fn implemented_tags(&self) -> HashSet<String> {
        self.implemented
            .iter()
            .flat_map(|p| p.all_tags())
            .map(str::to_string)
            .collect()
    }

    /// Which table zone holds a development, if any
    pub fn zone_of(&self, id: &str) -> Option<TableZone> {
        if self.face_up.iter().any(|d| d.id == id) {
            Some(TableZone::FaceUp)
        } else if self.face_down.iter().any(|d| d.id == id) {
            Some(TableZone::FaceDown)
        } else if self.dormant.iter().any(|d| d.id == id) {
            Some(TableZone::Dormant)
        } else {
            self.attached
                .iter()
                .find(|a| a.development.id == id)
                .map(|a| TableZone::Attached {
                    policy_id: a.policy_id.clone(),
                })
        }
    }

    /// Developments currently on the table, in any zone
    pub fn table_developments(&self) -> impl Iterator<Item = &DevelopmentCard> {
        self.face_up
            .iter()
            .chain(self.face_down.iter())
            .chain(self.dormant.iter())
            .chain(self.attached.iter().map(|a| &a.development))
    }

    /// Cards remaining in a stage pile
    pub fn pile_len(&self, stage: u32) -> usize {
        self.development_piles
            .get(stage as usize)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn is_implemented(&self, policy_id: &str) -> bool {
        self.implemented.iter().any(|p| p.id == policy_id)
    }

    /// Remove a development from whichever table zone holds it
    fn take_development(&mut self, id: &str) -> Option<(DevelopmentCard, TableZone)> {
        if let Some(i) = self.face_up.iter().position(|d| d.id == id) {
            return Some((self.face_up.remove(i), TableZone::FaceUp));
        }
        if let Some(i) = self.face_down.iter().position(|d| d.id == id) {
            return Some((self.face_down.remove(i), TableZone::FaceDown));
        }
        if let Some(i) = self.dormant.iter().position(|d| d.id == id) {
            return Some((self.dormant.remove(i), TableZone::Dormant));
        }
        if let Some(i) = self.attached.iter().position(|a| a.development.id == id) {
            let attachment = self.attached.remove(i);
            return Some((
                attachment.development,
                TableZone::Attached {
                    policy_id: attachment.policy_id,
                },
            ));
        }
        None
    }

    /// Implemented policy covering most of a development's requirements.
    /// Ties go to the earliest implemented.
    fn best_policy_for(&self, card: &DevelopmentCard) -> Option<String> {
        let mut best: Option<(&PolicyCard, usize)> = None;
        for policy in &self.implemented {
            let covered = card.requirements_covered_by(policy);
            if best.map_or(true, |(_, n)| covered > n) {
                best = Some((policy, covered));
            }
        }
        best.map(|(p, _)| p.id.clone())
    }
}

/// The complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// The deck every deal is built from
    pub deck: Deck,
    /// Number of players sharing the table
    pub players: u32,
    /// The live table
    pub table: Table,
    /// Snapshots before each recorded transition, most recent last
    pub history: Vec<Table>,
    /// Snapshots undone and available for redo, most recent last
    pub future: Vec<Table>,
    /// Random number generator seed (for deterministic replays)
    rng_seed: u64,
}

impl GameState {
    /// Create an undealt game. Piles are built and shuffled; nothing is in hand.
    pub fn new(deck: Deck, seed: u64) -> Self {
        let players = deck.gameplay().players_default.max(1);
        let mut state = Self {
            deck,
            players,
            table: Table::default(),
            history: Vec::new(),
            future: Vec::new(),
            rng_seed: seed,
        };
        state.table = state.shuffled_table(0);
        state
    }

    /// Create a game and make the opening deal
    pub fn new_dealt(deck: Deck, seed: u64) -> Self {
        let mut state = Self::new(deck, seed);
        let mut events = Vec::new();
        state.table = state.dealt_table(1, &mut events);
        state
    }

    pub fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    pub fn gameplay(&self) -> &GameplayDefaults {
        self.deck.gameplay()
    }

    pub fn stage_count(&self) -> u32 {
        self.deck.stage_count()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// How many policies may be implemented in the current round
    pub fn round_limit(&self) -> u32 {
        self.round_limit_for(&self.table)
    }

    fn round_limit_for(&self, table: &Table) -> u32 {
        let base = self
            .gameplay()
            .max_policies_per_player_per_round
            .saturating_mul(self.players);
        apply_delta(base, table.modifiers.max_policies_this_round)
    }

    /// Serialize the whole game for local persistence
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore a game saved with [`GameState::to_json`]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get all currently valid actions
    pub fn valid_actions(&self) -> Vec<GameAction> {
        let t = &self.table;
        let mut actions = vec![GameAction::Deal];

        if !t.policy_pile.is_empty() {
            actions.push(GameAction::DrawPolicies { count: 1 });
        }
        if t.pile_len(t.stage) > 0 {
            actions.push(GameAction::DrawDevelopments {
                face_up: 1,
                face_down: 0,
            });
        }

        for card in &t.face_down {
            actions.push(GameAction::RevealDevelopment(card.id.clone()));
        }

        let can_play = t.policies_played_this_round < self.round_limit();
        for card in &t.hand {
            if can_play {
                actions.push(GameAction::PlayPolicy(card.id.clone()));
            }
            actions.push(GameAction::DiscardPolicy(card.id.clone()));
        }

        for card in t.face_up.iter().chain(&t.face_down).chain(&t.dormant) {
            for policy in &t.implemented {
                actions.push(GameAction::Attach {
                    development_id: card.id.clone(),
                    policy_id: policy.id.clone(),
                });
            }
        }
        if !auto_attach_candidates(t).is_empty() {
            actions.push(GameAction::AutoAttach);
        }

        for card in t.table_developments() {
            actions.push(GameAction::DiscardDevelopment(card.id.clone()));
        }

        actions.push(GameAction::AdvanceRound);
        if t.stage + 1 < self.stage_count() {
            actions.push(GameAction::AdvanceStage);
        }
        if self.can_undo() {
            actions.push(GameAction::Undo);
        }
        if self.can_redo() {
            actions.push(GameAction::Redo);
        }

        actions
    }

    /// Apply an action to the game state
    pub fn apply_action(&mut self, action: GameAction) -> Result<Vec<GameEvent>, GameError> {
        match action {
            GameAction::Undo => self.undo(),
            GameAction::Redo => self.redo(),
            action => {
                let mut next = self.table.clone();
                let events = self.reduce(&mut next, action)?;
                self.record(next);
                Ok(events)
            }
        }
    }

    fn undo(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let previous = self.history.pop().ok_or(GameError::NothingToUndo)?;
        let current = std::mem::replace(&mut self.table, previous);
        self.future.push(current);
        Ok(vec![GameEvent::Undone])
    }

    fn redo(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let next = self.future.pop().ok_or(GameError::NothingToRedo)?;
        let current = std::mem::replace(&mut self.table, next);
        self.history.push(current);
        Ok(vec![GameEvent::Redone])
    }

    /// Commit a new table, pushing the old one onto the history
    fn record(&mut self, next: Table) {
        if next == self.table {
            return;
        }
        let previous = std::mem::replace(&mut self.table, next);
        self.history.push(previous);
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.future.clear();
    }

    fn reduce(&self, t: &mut Table, action: GameAction) -> Result<Vec<GameEvent>, GameError> {
        let mut events = Vec::new();

        match action {
            // ==================== Setup ====================
            GameAction::Deal => {
                *t = self.dealt_table(t.deals + 1, &mut events);
            }

            // ==================== Drawing ====================
            GameAction::DrawPolicies { count } => {
                draw_policies(t, count, &mut events);
            }

            GameAction::DrawDevelopments { face_up, face_down } => {
                let stage = t.stage;
                self.draw_developments(t, stage, face_up, face_down, 0, &mut events);
            }

            GameAction::RevealDevelopment(id) => {
                let index = t
                    .face_down
                    .iter()
                    .position(|d| d.id == id)
                    .ok_or_else(|| GameError::NoSuchCard(id.clone()))?;
                let card = t.face_down.remove(index);
                events.push(GameEvent::DevelopmentRevealed { id });
                self.reveal(t, card, 0, &mut events);
            }

            // ==================== Policies ====================
            GameAction::PlayPolicy(id) => {
                let index = t
                    .hand
                    .iter()
                    .position(|p| p.id == id)
                    .ok_or_else(|| GameError::NoSuchCard(id.clone()))?;

                let limit = self.round_limit_for(t);
                if t.policies_played_this_round >= limit {
                    return Err(GameError::RoundLimitReached { limit });
                }

                let card = t.hand.remove(index);
                t.implemented.push(card);
                t.policies_played_this_round += 1;

                events.push(GameEvent::PolicyPlayed {
                    id,
                    played_this_round: t.policies_played_this_round,
                    limit,
                });
            }

            GameAction::DiscardPolicy(id) => {
                let index = t
                    .hand
                    .iter()
                    .position(|p| p.id == id)
                    .ok_or_else(|| GameError::NoSuchCard(id.clone()))?;
                let card = t.hand.remove(index);
                t.policy_discard.push(card);
                events.push(GameEvent::PolicyDiscarded { id });
            }

            // ==================== Developments ====================
            GameAction::Attach {
                development_id,
                policy_id,
            } => {
                if !t.is_implemented(&policy_id) {
                    return Err(GameError::PolicyNotImplemented(policy_id));
                }
                let (card, zone) = t
                    .take_development(&development_id)
                    .ok_or_else(|| GameError::NoSuchCard(development_id.clone()))?;
                let was_active = matches!(zone, TableZone::FaceUp | TableZone::Attached { .. });
                self.attach(t, card, policy_id, was_active, &mut events);
            }

            GameAction::AutoAttach => {
                for development_id in auto_attach_candidates(t) {
                    let Some((card, zone)) = t.take_development(&development_id) else {
                        // Superseded by an earlier attachment in this pass
                        continue;
                    };
                    let Some(policy_id) = t.best_policy_for(&card) else {
                        t.dormant.push(card);
                        continue;
                    };
                    let was_active = zone == TableZone::FaceUp;
                    self.attach(t, card, policy_id, was_active, &mut events);
                }
            }

            GameAction::DiscardDevelopment(id) => {
                let (card, from) = t
                    .take_development(&id)
                    .ok_or_else(|| GameError::NoSuchCard(id.clone()))?;
                t.development_discard.push(card);
                events.push(GameEvent::DevelopmentDiscarded { id, from });
            }

            // ==================== Progression ====================
            GameAction::AdvanceRound => {
                self.advance_round(t, &mut events);
            }

            GameAction::AdvanceStage => {
                if t.stage + 1 >= self.stage_count() {
                    return Err(GameError::FinalStage);
                }
                t.stage += 1;
                events.push(GameEvent::StageAdvanced { stage: t.stage });
                self.advance_round(t, &mut events);
            }

            GameAction::Undo | GameAction::Redo => return Err(GameError::InvalidAction),
        }

        Ok(events)
    }

    // ==================== Helper Methods ====================

    /// Fresh piles for the given deal number, nothing drawn
    fn shuffled_table(&self, deals: u32) -> Table {
        let mut rng = ChaCha8Rng::seed_from_u64(
            self.rng_seed ^ u64::from(deals).wrapping_mul(0x9E37_79B9_7F4A_7C15),
        );

        let mut policy_pile = self.deck.policies.clone();
        policy_pile.shuffle(&mut rng);

        let development_piles = (0..self.stage_count())
            .map(|stage| {
                let mut pile = self.deck.developments_for_stage(stage);
                pile.shuffle(&mut rng);
                pile
            })
            .collect();

        Table {
            deals,
            policy_pile,
            development_piles,
            ..Table::default()
        }
    }

    /// Shuffle and lay out the opening hand and table
    fn dealt_table(&self, deals: u32, events: &mut Vec<GameEvent>) -> Table {
        let gameplay = self.gameplay();
        let mut t = self.shuffled_table(deals);

        let mut dealt = Vec::new();
        draw_policies(&mut t, gameplay.hand_size_start, &mut dealt);

        let face_up = pop_many(&mut t.development_piles[0], gameplay.dev_faceup_start);
        let face_down = pop_many(&mut t.development_piles[0], gameplay.dev_facedown_start);

        events.push(GameEvent::Dealt {
            hand: t.hand.len(),
            face_up: face_up.len(),
            face_down: face_down.len(),
        });
        events.extend(dealt);

        // Opening cards are laid out, not activated
        let tags = t.implemented_tags();
        for card in face_up {
            if card.requirements_met(&tags) {
                t.face_up.push(card);
            } else {
                events.push(dormant_event(&card, &tags));
                t.dormant.push(card);
            }
        }
        t.face_down.extend(face_down);

        t
    }

    fn advance_round(&self, t: &mut Table, events: &mut Vec<GameEvent>) {
        let gameplay = self.gameplay();
        let policy_draw = apply_delta(gameplay.policy_draw_per_round, t.modifiers.policy_draw_next_round);
        let dev_face_up = apply_delta(gameplay.dev_faceup_per_round, t.modifiers.dev_draw_next_round);

        // Consumes next-round modifiers and ends this round's play limit bonus
        t.modifiers = RoundModifiers::default();
        t.policies_played_this_round = 0;
        t.round += 1;
        events.push(GameEvent::RoundAdvanced { round: t.round });

        draw_policies(t, policy_draw, events);
        let stage = t.stage;
        self.draw_developments(
            t,
            stage,
            dev_face_up,
            gameplay.dev_facedown_per_round,
            0,
            events,
        );
    }

    /// Draw from a stage pile. Returns the ids drawn face-up.
    fn draw_developments(
        &self,
        t: &mut Table,
        stage: u32,
        face_up: u32,
        face_down: u32,
        depth: u32,
        events: &mut Vec<GameEvent>,
    ) -> Vec<String> {
        let (up_cards, down_cards) = match t.development_piles.get_mut(stage as usize) {
            Some(pile) => {
                let up = pop_many(pile, face_up);
                let down = pop_many(pile, face_down);
                (up, down)
            }
            None => (Vec::new(), Vec::new()),
        };

        let drawn = (up_cards.len() + down_cards.len()) as u32;
        let requested = face_up.saturating_add(face_down);
        if drawn < requested {
            events.push(GameEvent::PileExhausted {
                pile: Pile::Developments { stage },
                missing: requested - drawn,
            });
        }

        let up_ids: Vec<String> = up_cards.iter().map(|d| d.id.clone()).collect();
        if drawn > 0 {
            events.push(GameEvent::DevelopmentsDrawn {
                stage,
                face_up: up_ids.clone(),
                face_down: down_cards.iter().map(|d| d.id.clone()).collect(),
            });
        }

        t.face_down.extend(down_cards);
        for card in up_cards {
            self.reveal(t, card, depth, events);
        }

        up_ids
    }

    /// Put a card face-up, or dormant when its requirements are not met yet
    fn reveal(&self, t: &mut Table, card: DevelopmentCard, depth: u32, events: &mut Vec<GameEvent>) {
        let tags = t.implemented_tags();
        if !card.requirements_met(&tags) {
            events.push(dormant_event(&card, &tags));
            t.dormant.push(card);
            return;
        }
        t.face_up.push(card.clone());
        self.activate(t, &card, depth, events);
    }

    fn attach(
        &self,
        t: &mut Table,
        card: DevelopmentCard,
        policy_id: String,
        was_active: bool,
        events: &mut Vec<GameEvent>,
    ) {
        events.push(GameEvent::DevelopmentAttached {
            development_id: card.id.clone(),
            policy_id: policy_id.clone(),
        });
        t.attached.push(Attachment {
            policy_id,
            development: card.clone(),
        });
        if !was_active {
            self.activate(t, &card, 0, events);
        }
    }

    /// Resolve supersedes and effects of a card that just became active
    fn activate(&self, t: &mut Table, card: &DevelopmentCard, depth: u32, events: &mut Vec<GameEvent>) {
        events.push(GameEvent::DevelopmentActivated {
            id: card.id.clone(),
        });

        if let Some(target) = card.supersedes.as_deref() {
            if target != card.id {
                if let Some((old, _)) = t.take_development(target) {
                    t.development_discard.push(old);
                    events.push(GameEvent::DevelopmentSuperseded {
                        id: target.to_string(),
                        by: card.id.clone(),
                    });
                }
            }
        }

        for effect in &card.effects {
            self.apply_effect(t, &card.id, effect, depth, events);
        }
    }

    fn apply_effect(
        &self,
        t: &mut Table,
        source: &str,
        effect: &Effect,
        depth: u32,
        events: &mut Vec<GameEvent>,
    ) {
        let last_stage = self.stage_count().saturating_sub(1);
        let mut drawn = Vec::new();

        match effect.kind {
            EffectKind::DrawDevNow | EffectKind::DrawDevNextStageNow => {
                if depth >= MAX_EFFECT_DEPTH {
                    return;
                }
                let offset = match effect.kind {
                    EffectKind::DrawDevNow => effect.stage_offset(),
                    _ => 1,
                };
                let stage = t.stage.saturating_add(offset).min(last_stage);
                drawn = self.draw_developments(t, stage, effect.count(), 0, depth + 1, events);
            }
            EffectKind::ModifyDevDrawNextRound => {
                t.modifiers.dev_draw_next_round =
                    t.modifiers.dev_draw_next_round.saturating_add(effect.delta());
            }
            EffectKind::ModifyPolicyDrawNextRound => {
                t.modifiers.policy_draw_next_round =
                    t.modifiers.policy_draw_next_round.saturating_add(effect.delta());
            }
            EffectKind::ModifyMaxPoliciesThisRound => {
                t.modifiers.max_policies_this_round =
                    t.modifiers.max_policies_this_round.saturating_add(effect.delta());
            }
        }

        events.push(GameEvent::EffectApplied {
            source: source.to_string(),
            kind: effect.kind,
            drawn,
        });
    }
}

/// Conditional developments on the table whose requirements are now met
fn auto_attach_candidates(t: &Table) -> Vec<String> {
    if t.implemented.is_empty() {
        return Vec::new();
    }
    let tags = t.implemented_tags();
    t.dormant
        .iter()
        .chain(t.face_up.iter())
        .filter(|d| d.is_conditional() && d.requirements_met(&tags))
        .map(|d| d.id.clone())
        .collect()
}

fn draw_policies(t: &mut Table, count: u32, events: &mut Vec<GameEvent>) {
    let drawn = pop_many(&mut t.policy_pile, count);
    let missing = count - drawn.len() as u32;
    if missing > 0 {
        events.push(GameEvent::PileExhausted {
            pile: Pile::Policies,
            missing,
        });
    }
    if !drawn.is_empty() {
        events.push(GameEvent::PoliciesDrawn {
            ids: drawn.iter().map(|p| p.id.clone()).collect(),
        });
    }
    t.hand.extend(drawn);
}

/// Take up to `count` cards from the top (end) of a pile, in draw order
fn pop_many<T>(pile: &mut Vec<T>, count: u32) -> Vec<T> {
    let take = (count as usize).min(pile.len());
    let mut drawn = pile.split_off(pile.len() - take);
    drawn.reverse();
    drawn
}

fn apply_delta(base: u32, delta: i32) -> u32 {
    (i64::from(base) + i64::from(delta)).clamp(0, i64::from(u32::MAX)) as u32
}

fn dormant_event(card: &DevelopmentCard, tags: &HashSet<String>) -> GameEvent {
    GameEvent::DevelopmentDormant {
        id: card.id.clone(),
        missing_tags: card
            .activation
            .required_policy_tags
            .iter()
            .filter(|t| !tags.contains(*t))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{development, policy, small_deck};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_game_is_undealt() {
        let game = GameState::new(small_deck(), 7);
        assert!(game.table.hand.is_empty());
        assert!(game.table.face_up.is_empty());
        assert_eq!(game.table.policy_pile.len(), 10);
        assert_eq!(game.table.pile_len(0), 12);
        assert!(!game.can_undo());
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        let a = GameState::new_dealt(small_deck(), 42);
        let b = GameState::new_dealt(small_deck(), 42);
        assert_eq!(a.table, b.table);
    }

    #[test]
    fn test_pop_many_takes_from_top() {
        let mut pile = vec![1, 2, 3, 4];
        assert_eq!(pop_many(&mut pile, 2), vec![4, 3]);
        assert_eq!(pile, vec![1, 2]);
        assert_eq!(pop_many(&mut pile, 5), vec![2, 1]);
        assert!(pile.is_empty());
    }

    #[test]
    fn test_apply_delta_never_negative() {
        assert_eq!(apply_delta(2, -5), 0);
        assert_eq!(apply_delta(2, 3), 5);
        assert_eq!(apply_delta(u32::MAX, i32::MAX), u32::MAX);
    }

    #[test]
    fn test_oversized_draw_reports_missing_cards() {
        let mut game = GameState::new(small_deck(), 3);
        let events = game
            .apply_action(GameAction::DrawDevelopments {
                face_up: u32::MAX,
                face_down: 1,
            })
            .unwrap();

        assert_eq!(game.table.pile_len(0), 0);
        assert!(events.contains(&GameEvent::PileExhausted {
            pile: Pile::Developments { stage: 0 },
            missing: u32::MAX - 12,
        }));
    }

    #[test]
    fn test_round_limit_saturates() {
        let mut deck = small_deck();
        deck.manifest.gameplay_defaults.max_policies_per_player_per_round = u32::MAX;
        deck.manifest.gameplay_defaults.players_default = 2;
        let mut game = GameState::new_dealt(deck, 1);
        assert_eq!(game.round_limit(), u32::MAX);

        game.table.modifiers.max_policies_this_round = i32::MAX;
        assert_eq!(game.round_limit(), u32::MAX);
        assert!(!game.valid_actions().is_empty());
    }

    #[test]
    fn test_round_limit_scales_with_players() {
        let mut game = GameState::new(small_deck(), 1);
        assert_eq!(game.round_limit(), 3 * 4);
        game.players = 1;
        assert_eq!(game.round_limit(), 3);
        game.table.modifiers.max_policies_this_round = -1;
        assert_eq!(game.round_limit(), 2);
    }

    #[test]
    fn test_best_policy_prefers_coverage() {
        let mut table = Table::default();
        table.implemented.push(policy("p1", &["a"]));
        table.implemented.push(policy("p2", &["a", "b"]));
        let mut card = development("d1", 0);
        card.activation = crate::cards::Activation::conditional(vec!["a".into(), "b".into()]);
        assert_eq!(table.best_policy_for(&card), Some("p2".to_string()));
    }

    #[test]
    fn test_record_skips_unchanged_table() {
        let mut game = GameState::new(small_deck(), 1);
        let events = game.apply_action(GameAction::AutoAttach).unwrap();
        assert!(events.is_empty());
        assert!(!game.can_undo());
    }
}
