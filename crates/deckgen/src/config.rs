//! Generator configuration.
//!
//! A YAML file is deep-merged over the built-in defaults, so a config only
//! needs to name the values it changes.

use crate::error::GenError;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;
use tabletop_core::{GameplayDefaults, Scenario, StageDefinition, Stages};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSizes {
    pub policies_total: u32,
    pub developments_per_stage: Vec<u32>,
}

/// Target shares the model is asked to hit across a stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixTargets {
    pub positive_share: f64,
    pub supersedes_share: f64,
    pub conditional_share: f64,
    pub powerup_share: f64,
    pub quantitative_indicator_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextModel {
    pub model: String,
    #[serde(default)]
    pub reasoning_effort: Option<String>,
    pub max_output_tokens: u32,
    #[serde(default)]
    pub store: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Models {
    pub text: TextModel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Runtime {
    /// Concurrent text requests
    pub concurrency_text: usize,
    /// Reuse card files already present in the output directory
    pub resume: bool,
    /// Keep request/response pairs under `cache/`
    pub cache_requests: bool,
    pub max_retries: u32,
    pub request_timeout_secs: u64,
}

/// Fully resolved generator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenConfig {
    pub scenario: Scenario,
    pub stages: Stages,
    pub deck_sizes: DeckSizes,
    pub mix_targets: MixTargets,
    pub gameplay_defaults: GameplayDefaults,
    pub models: Models,
    pub runtime: Runtime,
}

impl Default for GenConfig {
    fn default() -> Self {
        let stage = |id: u32, time_horizon: &str, capability_profile: &str| StageDefinition {
            id,
            name: format!("Stage {}", id),
            time_horizon: time_horizon.to_string(),
            capability_profile: capability_profile.to_string(),
        };

        Self {
            scenario: Scenario {
                name: "Baseline".to_string(),
                injection: String::new(),
                tone: "realistic, policy-relevant, grounded".to_string(),
                locale_visuals: Vec::new(),
                roles: Vec::new(),
            },
            stages: Stages {
                count: 3,
                definitions: vec![
                    stage(
                        0,
                        "today / near-term",
                        "Frontier AI capabilities similar to present-day large models",
                    ),
                    stage(
                        1,
                        "2-5 years",
                        "Improved agentic tooling and narrower automation gains",
                    ),
                    stage(
                        2,
                        "5-10 years",
                        "Broader automation with significant macroeconomic impacts",
                    ),
                ],
            },
            deck_sizes: DeckSizes {
                policies_total: 18,
                developments_per_stage: vec![16, 18, 20],
            },
            mix_targets: MixTargets {
                positive_share: 0.7,
                supersedes_share: 0.15,
                conditional_share: 0.15,
                powerup_share: 0.1,
                quantitative_indicator_share: 0.15,
            },
            gameplay_defaults: GameplayDefaults::default(),
            models: Models {
                text: TextModel {
                    model: "gpt-4.1-mini".to_string(),
                    reasoning_effort: Some("high".to_string()),
                    max_output_tokens: 2000,
                    store: false,
                },
            },
            runtime: Runtime {
                concurrency_text: 8,
                resume: true,
                cache_requests: true,
                max_retries: 3,
                request_timeout_secs: 120,
            },
        }
    }
}

impl GenConfig {
    /// Load a YAML config file and merge it over the defaults
    pub fn load(path: &Path) -> Result<Self, GenError> {
        let text = std::fs::read_to_string(path).map_err(|source| GenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Parse YAML text and merge it over the defaults
    pub fn from_yaml(text: &str) -> Result<Self, GenError> {
        let overrides: Value = serde_yaml::from_str(text)?;
        Self::resolve(overrides)
    }

    /// Apply an override document to the defaults
    pub fn resolve(overrides: Value) -> Result<Self, GenError> {
        let mut merged = serde_yaml::to_value(Self::default())?;
        if !overrides.is_null() {
            deep_merge(&mut merged, overrides);
        }
        let mut config: Self = serde_yaml::from_value(merged)?;
        config.normalize();
        Ok(config)
    }

    /// Stage count follows the per-stage sizes when they disagree
    fn normalize(&mut self) {
        let sized = self.deck_sizes.developments_per_stage.len() as u32;
        if sized > 0 {
            self.stages.count = sized;
        }
        self.runtime.concurrency_text = self.runtime.concurrency_text.max(1);
    }

    /// Definition for a stage, synthesized when the config lists fewer
    pub fn stage_definition(&self, stage: u32) -> StageDefinition {
        self.stages
            .definitions
            .iter()
            .find(|d| d.id == stage)
            .cloned()
            .unwrap_or_else(|| StageDefinition {
                id: stage,
                name: format!("Stage {}", stage),
                time_horizon: String::new(),
                capability_profile: String::new(),
            })
    }
}

/// Merge `overlay` into `base`. Mappings merge key by key; anything else replaces.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
