//! Deck generator for the policy tabletop.
//!
//! Produces the deck directory the table engine and server read: a manifest,
//! policy and development cards as JSONL, taxonomy and stage summaries, and a
//! validation report. Cards come from a hosted model when `OPENAI_API_KEY` is
//! set and from deterministic placeholders otherwise.

pub mod config;
pub mod error;
pub mod io;
pub mod openai;
pub mod pipeline;
pub mod policies;
pub mod schemas;
pub mod stages;
pub mod taxonomy;
pub mod validation;

pub use config::GenConfig;
pub use error::GenError;
pub use openai::OpenAiClient;
pub use pipeline::{run_generate, run_validate};
pub use validation::ValidationReport;
