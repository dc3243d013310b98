//! Deck representation and loading.
//!
//! A deck is a directory written by the generator:
//!
//! ```text
//! manifest.json
//! cards/policies.jsonl
//! cards/developments.stage0.jsonl
//! cards/developments.stage1.jsonl
//! meta/stage_summaries.json
//! ```

use crate::cards::{DevelopmentCard, PolicyCard};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const POLICIES_FILE: &str = "cards/policies.jsonl";
pub const STAGE_SUMMARIES_FILE: &str = "meta/stage_summaries.json";

const DEVELOPMENTS_PREFIX: &str = "developments.stage";
const JSONL_SUFFIX: &str = ".jsonl";

/// Path of the development file for a stage, relative to the deck root
pub fn developments_file(stage: u32) -> String {
    format!("cards/{}{}{}", DEVELOPMENTS_PREFIX, stage, JSONL_SUFFIX)
}

/// Errors that can occur when loading a deck
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed JSON in {} line {line}: {source}", .path.display())]
    JsonLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Duplicate card id: {0}")]
    DuplicateId(String),
}

/// Scenario framing for a deck
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    pub injection: String,
    pub tone: String,
    pub locale_visuals: Vec<String>,
    pub roles: Vec<String>,
}

/// Table counts used when dealing and advancing rounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayDefaults {
    pub dev_faceup_start: u32,
    pub dev_facedown_start: u32,
    pub dev_faceup_per_round: u32,
    pub dev_facedown_per_round: u32,
    pub hand_size_start: u32,
    pub policy_draw_per_round: u32,
    pub max_policies_per_player_per_round: u32,
    pub players_default: u32,
}

impl Default for GameplayDefaults {
    fn default() -> Self {
        Self {
            dev_faceup_start: 4,
            dev_facedown_start: 2,
            dev_faceup_per_round: 3,
            dev_facedown_per_round: 1,
            hand_size_start: 5,
            policy_draw_per_round: 2,
            max_policies_per_player_per_round: 3,
            players_default: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub time_horizon: String,
    #[serde(default)]
    pub capability_profile: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stages {
    pub count: u32,
    pub definitions: Vec<StageDefinition>,
}

/// Top-level deck description (`manifest.json`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub deck_id: String,
    #[serde(default)]
    pub scenario: Scenario,
    #[serde(default)]
    pub gameplay_defaults: GameplayDefaults,
    #[serde(default)]
    pub stages: Stages,
}

/// Narrative summary of a stage (`meta/stage_summaries.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: u32,
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub changes_vs_prior: Vec<String>,
}

/// A complete deck in memory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub manifest: Manifest,
    pub policies: Vec<PolicyCard>,
    pub developments: Vec<DevelopmentCard>,
    #[serde(default)]
    pub stage_summaries: Vec<StageSummary>,
}

impl Deck {
    /// Build a deck from already-parsed parts
    pub fn new(
        manifest: Manifest,
        policies: Vec<PolicyCard>,
        developments: Vec<DevelopmentCard>,
    ) -> Self {
        Self {
            manifest,
            policies,
            developments,
            stage_summaries: Vec::new(),
        }
    }

    /// Load a deck directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, DeckError> {
        let dir = dir.as_ref();
        let manifest: Manifest = read_json(&dir.join(MANIFEST_FILE))?;
        let policies = read_jsonl(&dir.join(POLICIES_FILE))?;

        let mut developments = Vec::new();
        for (_, path) in development_files(&dir.join("cards"))? {
            developments.extend(read_jsonl::<DevelopmentCard>(&path)?);
        }

        let summaries_path = dir.join(STAGE_SUMMARIES_FILE);
        let stage_summaries = if summaries_path.exists() {
            read_json(&summaries_path)?
        } else {
            Vec::new()
        };

        let deck = Self {
            manifest,
            policies,
            developments,
            stage_summaries,
        };
        deck.check_unique_ids()?;
        Ok(deck)
    }

    /// Number of stages in play: the manifest count, widened if cards reference later stages
    pub fn stage_count(&self) -> u32 {
        let from_cards = self
            .developments
            .iter()
            .map(|d| d.stage.saturating_add(1))
            .max()
            .unwrap_or(0);
        self.manifest.stages.count.max(from_cards).max(1)
    }

    /// All developments belonging to a stage, in file order
    pub fn developments_for_stage(&self, stage: u32) -> Vec<DevelopmentCard> {
        self.developments
            .iter()
            .filter(|d| d.stage == stage)
            .cloned()
            .collect()
    }

    pub fn gameplay(&self) -> &GameplayDefaults {
        &self.manifest.gameplay_defaults
    }

    /// Card ids must be unique within the policy pile and within the developments
    pub fn check_unique_ids(&self) -> Result<(), DeckError> {
        let mut seen = HashSet::new();
        for id in self.policies.iter().map(|p| &p.id) {
            if !seen.insert(id.as_str()) {
                return Err(DeckError::DuplicateId(id.clone()));
            }
        }
        seen.clear();
        for id in self.developments.iter().map(|d| &d.id) {
            if !seen.insert(id.as_str()) {
                return Err(DeckError::DuplicateId(id.clone()));
            }
        }
        Ok(())
    }
}

/// List `developments.stage<N>.jsonl` files in a directory, sorted by stage
pub fn development_files(cards_dir: &Path) -> Result<Vec<(u32, PathBuf)>, DeckError> {
    let entries = fs::read_dir(cards_dir).map_err(|source| DeckError::Io {
        path: cards_dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<(u32, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let stage = name
                .strip_prefix(DEVELOPMENTS_PREFIX)?
                .strip_suffix(JSONL_SUFFIX)?
                .parse()
                .ok()?;
            Some((stage, entry.path()))
        })
        .collect();
    files.sort_by_key(|(stage, _)| *stage);
    Ok(files)
}

/// Read and parse a JSON file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DeckError> {
    let text = fs::read_to_string(path).map_err(|source| DeckError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DeckError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse a JSONL file, one record per non-blank line
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DeckError> {
    let text = fs::read_to_string(path).map_err(|source| DeckError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_jsonl(&text).map_err(|(line, source)| DeckError::JsonLine {
        path: path.to_path_buf(),
        line,
        source,
    })
}

/// Parse JSONL text. On failure returns the 1-based line number and the error.
pub fn parse_jsonl<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, (usize, serde_json::Error)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| serde_json::from_str(line).map_err(|e| (i + 1, e)))
        .collect()
}
