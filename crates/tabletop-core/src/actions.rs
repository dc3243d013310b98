//! Actions the table can take.
//!
//! This module defines every transition the reducer understands and the
//! events that result from them.

use crate::cards::EffectKind;
use serde::{Deserialize, Serialize};

/// All possible actions on the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    // ==================== Setup ====================
    /// Rebuild and reshuffle every pile, then deal the opening hand and table
    Deal,

    // ==================== Drawing ====================
    /// Draw policies from the policy pile into the hand
    DrawPolicies { count: u32 },
    /// Draw developments from the current stage pile
    DrawDevelopments { face_up: u32, face_down: u32 },
    /// Turn a face-down development face-up
    RevealDevelopment(String),

    // ==================== Policies ====================
    /// Implement a policy from the hand
    PlayPolicy(String),
    /// Discard a policy from the hand
    DiscardPolicy(String),

    // ==================== Developments ====================
    /// Attach a development to an implemented policy
    Attach {
        development_id: String,
        policy_id: String,
    },
    /// Attach every conditional development whose requirements are now met
    AutoAttach,
    /// Remove a development from the table
    DiscardDevelopment(String),

    // ==================== Progression ====================
    /// Start the next round, drawing the per-round cards
    AdvanceRound,
    /// Move to the next stage and start a new round
    AdvanceStage,

    // ==================== History ====================
    Undo,
    Redo,
}

/// Where a development sits on the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableZone {
    FaceUp,
    FaceDown,
    Dormant,
    Attached { policy_id: String },
}

/// A pile cards are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pile {
    Policies,
    Developments { stage: u32 },
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A fresh deal was made
    Dealt {
        hand: usize,
        face_up: usize,
        face_down: usize,
    },

    /// Policies moved from the pile into the hand
    PoliciesDrawn { ids: Vec<String> },

    /// Developments were drawn from a stage pile
    DevelopmentsDrawn {
        stage: u32,
        face_up: Vec<String>,
        face_down: Vec<String>,
    },

    /// A pile ran out before the requested number of cards could be drawn
    PileExhausted { pile: Pile, missing: u32 },

    /// A development was turned face-up
    DevelopmentRevealed { id: String },

    /// A revealed conditional development is waiting on policy tags
    DevelopmentDormant {
        id: String,
        missing_tags: Vec<String>,
    },

    /// A development became active and its effects resolved
    DevelopmentActivated { id: String },

    /// A development replaced an earlier one
    DevelopmentSuperseded { id: String, by: String },

    /// An effect carried by a development was applied
    EffectApplied {
        source: String,
        kind: EffectKind,
        drawn: Vec<String>,
    },

    /// A policy was implemented
    PolicyPlayed {
        id: String,
        played_this_round: u32,
        limit: u32,
    },

    /// A development was attached to an implemented policy
    DevelopmentAttached {
        development_id: String,
        policy_id: String,
    },

    /// A policy left the hand for the discard pile
    PolicyDiscarded { id: String },

    /// A development left the table for the discard pile
    DevelopmentDiscarded { id: String, from: TableZone },

    /// A new round started
    RoundAdvanced { round: u32 },

    /// A new stage started
    StageAdvanced { stage: u32 },

    /// The previous transition was undone
    Undone,

    /// An undone transition was reapplied
    Redone,
}
