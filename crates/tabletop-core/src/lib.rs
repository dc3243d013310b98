//! Policy tabletop - a card simulation of AI-era economic policy
//!
//! This crate provides the core game logic, including:
//! - Policy and development card records
//! - Deck loading from a generated deck directory
//! - The table state machine with undo/redo history
//!
//! # Architecture
//!
//! The engine is platform-agnostic. It can be compiled to:
//! - Native Rust for the deck server and tools
//! - WebAssembly for the browser, where state is kept in local storage
//!
//! # Modules
//!
//! - [`cards`]: Policy cards, development cards and effects
//! - [`deck`]: Deck manifest and on-disk loading
//! - [`actions`]: Actions and the events they produce
//! - [`game`]: The table reducer

pub mod actions;
pub mod cards;
pub mod deck;
pub mod game;
#[cfg(test)]
mod testing;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent, Pile, TableZone};
pub use cards::{
    Activation, ActivationKind, DevelopmentCard, Effect, EffectKind, EffectParams, PolicyCard,
    PolicyCost, PolicyTimeline, TimeHorizon, Valence, Visibility,
};
pub use deck::{
    Deck, DeckError, GameplayDefaults, Manifest, Scenario, StageDefinition, StageSummary, Stages,
};
pub use game::{Attachment, GameError, GameState, RoundModifiers, Table, HISTORY_LIMIT};
