use std::path::PathBuf;
use tabletop_core::DeckError;
use thiserror::Error;

/// Errors that can occur while generating or validating a deck
#[derive(Debug, Error)]
pub enum GenError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Deck(#[from] DeckError),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Validation failed with {count} error(s). See validation/report.json for details.")]
    Validation { count: usize },

    #[error("Generation task failed: {0}")]
    Task(String),
}
