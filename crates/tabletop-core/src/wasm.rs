//! WebAssembly bindings for the table engine.
//!
//! This module exposes the reducer to JavaScript through wasm-bindgen. The
//! browser keeps the JSON from `save` in local storage and hands it back to
//! `load` on the next visit.

use wasm_bindgen::prelude::*;

use crate::actions::GameAction;
use crate::deck::Deck;
use crate::game::GameState;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmGame {
    state: GameState,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a dealt game from a deck JSON object
    /// (`{manifest, policies, developments, stage_summaries}`)
    #[wasm_bindgen(constructor)]
    pub fn new(deck_json: &str, seed: f64) -> Result<WasmGame, JsValue> {
        let deck: Deck = serde_json::from_str(deck_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid deck: {}", e)))?;
        deck.check_unique_ids()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(WasmGame {
            state: GameState::new_dealt(deck, seed as u64),
        })
    }

    /// Restore a game previously returned by `save`
    #[wasm_bindgen(js_name = load)]
    pub fn load(saved: &str) -> Result<WasmGame, JsValue> {
        let state = GameState::from_json(saved)
            .map_err(|e| JsValue::from_str(&format!("Invalid saved game: {}", e)))?;
        Ok(WasmGame { state })
    }

    /// Serialize the full game, history included
    #[wasm_bindgen(js_name = save)]
    pub fn save(&self) -> Result<String, JsValue> {
        self.state
            .to_json()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Get the live table as JSON
    #[wasm_bindgen(js_name = getTable)]
    pub fn get_table(&self) -> String {
        serde_json::to_string(&self.state.table).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get valid actions as JSON array
    #[wasm_bindgen(js_name = getValidActions)]
    pub fn get_valid_actions(&self) -> String {
        serde_json::to_string(&self.state.valid_actions()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Apply an action from JSON, returns events JSON or error
    #[wasm_bindgen(js_name = applyAction)]
    pub fn apply_action(&mut self, action_json: &str) -> Result<String, JsValue> {
        let action: GameAction = serde_json::from_str(action_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid action JSON: {}", e)))?;

        match self.state.apply_action(action) {
            Ok(events) => Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())),
            Err(e) => Err(JsValue::from_str(&format!("Action failed: {}", e))),
        }
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.state.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.state.can_redo()
    }

    #[wasm_bindgen(js_name = getStage)]
    pub fn get_stage(&self) -> u32 {
        self.state.table.stage
    }

    #[wasm_bindgen(js_name = getRound)]
    pub fn get_round(&self) -> u32 {
        self.state.table.round
    }

    /// Policies that may still be implemented this round
    #[wasm_bindgen(js_name = getPlaysRemaining)]
    pub fn get_plays_remaining(&self) -> u32 {
        self.state
            .round_limit()
            .saturating_sub(self.state.table.policies_played_this_round)
    }
}
