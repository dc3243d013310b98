//! End-to-end deck generation.

use crate::config::GenConfig;
use crate::error::GenError;
use crate::io::{write_json, write_yaml};
use crate::openai::OpenAiClient;
use crate::policies::generate_policies;
use crate::stages::generate_stage_cards;
use crate::taxonomy::generate_taxonomy;
use crate::validation::{check_deck, finish_report, typed_rows, validate_deck, ValidationReport};
use std::path::Path;
use serde_json::Value;
use tabletop_core::deck::{development_files, read_json, read_jsonl, MANIFEST_FILE, POLICIES_FILE};
use tabletop_core::{Deck, DevelopmentCard, Manifest, PolicyCard, StageDefinition, Stages};
use tracing::info;

pub const RESOLVED_CONFIG_FILE: &str = "meta/config_resolved.yaml";

/// Deck id derived from the output directory name
pub fn deck_id(out_dir: &Path) -> String {
    out_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "deck".to_string())
}

pub fn build_manifest(config: &GenConfig, out_dir: &Path) -> Manifest {
    let definitions: Vec<StageDefinition> = (0..config.stages.count)
        .map(|stage| config.stage_definition(stage))
        .collect();

    Manifest {
        deck_id: deck_id(out_dir),
        scenario: config.scenario.clone(),
        gameplay_defaults: config.gameplay_defaults.clone(),
        stages: Stages {
            count: config.stages.count,
            definitions,
        },
    }
}

/// Generate a complete deck into `out_dir`
pub async fn run_generate(
    config: &GenConfig,
    client: &OpenAiClient,
    out_dir: &Path,
) -> Result<ValidationReport, GenError> {
    info!(
        "Generating deck {} into {}",
        config.scenario.name,
        out_dir.display()
    );
    write_yaml(&out_dir.join(RESOLVED_CONFIG_FILE), config)?;

    let taxonomy = generate_taxonomy(config, out_dir)?;
    let policies = generate_policies(config, &taxonomy, client, out_dir).await?;
    let developments = generate_stage_cards(config, &taxonomy, client, out_dir).await?;

    let manifest = build_manifest(config, out_dir);
    write_json(&out_dir.join(MANIFEST_FILE), &manifest)?;

    validate_deck(&policies, &developments, manifest.stages.count, out_dir)
}

/// Re-validate a deck already on disk.
///
/// Cards are read as raw JSON rows first, so a card with an out-of-range enum
/// or a missing field lands in the report instead of aborting the load.
pub fn run_validate(deck_dir: &Path) -> Result<ValidationReport, GenError> {
    let manifest: Manifest = read_json(&deck_dir.join(MANIFEST_FILE))?;

    let mut shape_errors = Vec::new();
    let rows: Vec<Value> = read_jsonl(&deck_dir.join(POLICIES_FILE))?;
    let policies: Vec<PolicyCard> = typed_rows(rows, "Policy", &mut shape_errors);

    let mut developments: Vec<DevelopmentCard> = Vec::new();
    for (_, path) in development_files(&deck_dir.join("cards"))? {
        let rows: Vec<Value> = read_jsonl(&path)?;
        developments.extend(typed_rows(rows, "Development", &mut shape_errors));
    }

    let deck = Deck::new(manifest, policies, developments);
    let mut report = check_deck(&deck.policies, &deck.developments, deck.stage_count());
    shape_errors.append(&mut report.errors);
    let report = ValidationReport::new(shape_errors, report.warnings);
    finish_report(report, deck_dir)
}
