//! Server-hosted game sessions.

use tabletop_core::{Deck, GameAction, GameEvent, GameState};
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::GameView;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("{0}")]
    Rejected(#[from] tabletop_core::GameError),
}

/// A game played against the loaded deck.
pub struct GameSession {
    pub id: Uuid,
    pub game: GameState,
    /// Number of actions applied, undo/redo included
    pub actions_applied: u64,
}

impl GameSession {
    /// Create a session with the opening deal already made
    pub fn new(id: Uuid, deck: Deck, seed: u64) -> Self {
        Self {
            id,
            game: GameState::new_dealt(deck, seed),
            actions_applied: 0,
        }
    }

    pub fn apply_action(
        &mut self,
        action: serde_json::Value,
    ) -> Result<Vec<GameEvent>, SessionError> {
        let action: GameAction = serde_json::from_value(action)
            .map_err(|e| SessionError::InvalidAction(e.to_string()))?;

        let events = self.game.apply_action(action)?;
        self.actions_applied += 1;
        Ok(events)
    }

    pub fn to_view(&self) -> GameView {
        GameView {
            game_id: self.id,
            deck_id: self.game.deck.manifest.deck_id.clone(),
            seed: self.game.rng_seed(),
            table: self.game.table.clone(),
            round_limit: self.game.round_limit(),
            can_undo: self.game.can_undo(),
            can_redo: self.game.can_redo(),
            valid_actions: self.game.valid_actions(),
        }
    }
}
