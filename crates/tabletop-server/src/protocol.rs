//! JSON bodies exchanged over the REST API.

use serde::{Deserialize, Serialize};
use tabletop_core::{GameAction, GameEvent, StageDefinition, StageSummary, Table};
use uuid::Uuid;

/// Query string for `/api/developments`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevelopmentsQuery {
    /// Restrict to one stage
    pub stage: Option<u32>,
}

/// Response of `/api/stages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagesResponse {
    pub count: u32,
    pub definitions: Vec<StageDefinition>,
    pub summaries: Vec<StageSummary>,
}

/// Body of `POST /api/games`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateGameRequest {
    /// Shuffle seed; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Body of `POST /api/games/:id/actions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: serde_json::Value,
}

/// Snapshot of a hosted game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameView {
    pub game_id: Uuid,
    pub deck_id: String,
    pub seed: u64,
    pub table: Table,
    pub round_limit: u32,
    pub can_undo: bool,
    pub can_redo: bool,
    pub valid_actions: Vec<GameAction>,
}

/// Result of applying an action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub events: Vec<GameEvent>,
    pub game: GameView,
}

/// Error body for every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
