//! Deck validation and `validation/report.json`.

use crate::error::GenError;
use crate::io::write_json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tabletop_core::{ActivationKind, DevelopmentCard, EffectKind, PolicyCard};
use tracing::{info, warn};

pub const REPORT_FILE: &str = "validation/report.json";

/// Titles closer than this are reported as likely duplicates
pub const DUPLICATE_TITLE_THRESHOLD: f64 = 0.92;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub error_count: usize,
    pub errors: Vec<String>,
    pub warning_count: usize,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            error_count: errors.len(),
            errors,
            warning_count: warnings.len(),
            warnings,
        }
    }
}

/// Check every card, write the report, and fail when any error was found
pub fn validate_deck(
    policies: &[PolicyCard],
    developments: &[DevelopmentCard],
    stage_count: u32,
    out_dir: &Path,
) -> Result<ValidationReport, GenError> {
    finish_report(check_deck(policies, developments, stage_count), out_dir)
}

/// Write the report, log its warnings and fail when it holds errors
pub fn finish_report(report: ValidationReport, out_dir: &Path) -> Result<ValidationReport, GenError> {
    write_json(&out_dir.join(REPORT_FILE), &report)?;

    for warning in &report.warnings {
        warn!("{}", warning);
    }
    if !report.valid {
        return Err(GenError::Validation {
            count: report.error_count,
        });
    }
    info!("Validation passed with {} warning(s)", report.warning_count);
    Ok(report)
}

pub fn check_deck(
    policies: &[PolicyCard],
    developments: &[DevelopmentCard],
    stage_count: u32,
) -> ValidationReport {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    let ids = policies
        .iter()
        .map(|p| p.id.as_str())
        .chain(developments.iter().map(|d| d.id.as_str()));
    for id in ids {
        if id.trim().is_empty() {
            errors.push("Card with an empty id".to_string());
        } else if !seen.insert(id) {
            errors.push(format!("Duplicate card id: {}", id));
        }
    }

    for policy in policies {
        check_policy(policy, &mut errors);
    }
    let development_ids: HashSet<&str> = developments.iter().map(|d| d.id.as_str()).collect();
    for development in developments {
        check_development(development, stage_count, &development_ids, &mut errors);
    }

    let titles: Vec<&str> = policies
        .iter()
        .map(|p| p.title.as_str())
        .chain(developments.iter().map(|d| d.title.as_str()))
        .collect();
    let warnings = duplicate_titles(&titles)
        .into_iter()
        .map(|title| format!("Potential duplicate title: {}", title))
        .collect();

    ValidationReport::new(errors, warnings)
}

/// Deserialize raw card rows, reporting the ones that do not fit the card shape
pub fn typed_rows<T: DeserializeOwned>(rows: Vec<Value>, kind: &str, errors: &mut Vec<String>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("<missing id>")
                .to_string();
            match serde_json::from_value(row) {
                Ok(card) => Some(card),
                Err(e) => {
                    errors.push(format!("{} {}: {}", kind, id, e));
                    None
                }
            }
        })
        .collect()
}

fn check_range(errors: &mut Vec<String>, card: &str, field: &str, value: u8, min: u8, max: u8) {
    if value < min || value > max {
        errors.push(format!(
            "{}: {} is {}, expected {}..={}",
            card, field, value, min, max
        ));
    }
}

fn check_policy(policy: &PolicyCard, errors: &mut Vec<String>) {
    let card = format!("Policy {}", policy.id);
    if policy.title.trim().is_empty() {
        errors.push(format!("{}: empty title", card));
    }
    check_range(errors, &card, "cost.budget_level", policy.cost.budget_level, 1, 5);
    check_range(
        errors,
        &card,
        "cost.implementation_complexity",
        policy.cost.implementation_complexity,
        1,
        5,
    );
    check_range(errors, &card, "impact_score", policy.impact_score, 1, 5);
}

fn check_development(
    development: &DevelopmentCard,
    stage_count: u32,
    development_ids: &HashSet<&str>,
    errors: &mut Vec<String>,
) {
    let card = format!("Development {}", development.id);
    if development.title.trim().is_empty() {
        errors.push(format!("{}: empty title", card));
    }
    if development.stage >= stage_count {
        errors.push(format!(
            "{}: stage {} is outside 0..{}",
            card, development.stage, stage_count
        ));
    }
    check_range(errors, &card, "arrows_up", development.arrows_up, 0, 3);
    check_range(errors, &card, "arrows_down", development.arrows_down, 0, 3);
    check_range(errors, &card, "severity", development.severity, 1, 5);

    if let Some(target) = &development.supersedes {
        if *target == development.id {
            errors.push(format!("{}: supersedes itself", card));
        } else if !development_ids.contains(target.as_str()) {
            errors.push(format!("{}: supersedes unknown card {}", card, target));
        }
    }

    if development.activation.kind == ActivationKind::Conditional
        && development.activation.required_policy_tags.is_empty()
    {
        errors.push(format!("{}: conditional without required_policy_tags", card));
    }

    for effect in &development.effects {
        match effect.kind {
            EffectKind::DrawDevNow | EffectKind::DrawDevNextStageNow => {
                if effect.params.count == Some(0) {
                    errors.push(format!("{}: {} draws zero cards", card, effect.kind.as_str()));
                }
            }
            EffectKind::ModifyDevDrawNextRound
            | EffectKind::ModifyPolicyDrawNextRound
            | EffectKind::ModifyMaxPoliciesThisRound => {
                if effect.params.delta.is_none() {
                    errors.push(format!("{}: {} without delta", card, effect.kind.as_str()));
                }
            }
        }
    }
}

/// Titles with a later title above the similarity threshold
pub fn duplicate_titles<'a>(titles: &[&'a str]) -> Vec<&'a str> {
    titles
        .iter()
        .enumerate()
        .filter(|(i, title)| {
            titles[i + 1..]
                .iter()
                .any(|other| strsim::normalized_levenshtein(title, other) > DUPLICATE_TITLE_THRESHOLD)
        })
        .map(|(_, title)| *title)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;
    use crate::policies::placeholder_policy;
    use crate::stages::placeholder_development;
    use crate::taxonomy::Taxonomy;
    use pretty_assertions::assert_eq;
    use tabletop_core::Effect;

    fn deck() -> (Vec<PolicyCard>, Vec<DevelopmentCard>) {
        let taxonomy = Taxonomy::from_config(&GenConfig::default());
        let policies = (0..4).map(|i| placeholder_policy(i, &taxonomy)).collect();
        let developments = (0..12)
            .map(|i| placeholder_development(0, i, &taxonomy))
            .collect();
        (policies, developments)
    }

    #[test]
    fn test_placeholder_deck_is_valid() {
        let (policies, developments) = deck();
        let report = check_deck(&policies, &developments, 1);
        assert_eq!(report.errors, Vec::<String>::new());
        assert!(report.valid);
    }

    #[test]
    fn test_range_and_link_errors() {
        let (mut policies, mut developments) = deck();
        policies[0].impact_score = 9;
        developments[1].severity = 0;
        developments[2].supersedes = Some("dev_s9_99".to_string());
        developments[3].id = developments[4].id.clone();
        developments[5].effects = vec![Effect {
            kind: EffectKind::ModifyDevDrawNextRound,
            params: Default::default(),
        }];

        let report = check_deck(&policies, &developments, 1);
        assert!(!report.valid);
        assert_eq!(report.error_count, 5);
        assert!(report.errors.contains(&"Policy policy_000: impact_score is 9, expected 1..=5".to_string()));
        assert!(report.errors.contains(&"Duplicate card id: dev_s0_04".to_string()));
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("supersedes unknown card dev_s9_99")));
    }

    #[test]
    fn test_duplicate_titles_warn() {
        let titles = ["Labor Mobility Initiative", "Labor Mobility Initiatives", "Compute Supply"];
        assert_eq!(duplicate_titles(&titles), vec!["Labor Mobility Initiative"]);
    }

    #[test]
    fn test_report_written_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (mut policies, developments) = deck();
        policies[1].cost.budget_level = 0;

        let err = validate_deck(&policies, &developments, 1, dir.path()).unwrap_err();
        assert!(matches!(err, GenError::Validation { count: 1 }));

        let report: ValidationReport =
            tabletop_core::deck::read_json(&dir.path().join(REPORT_FILE)).unwrap();
        assert!(!report.valid);
        assert_eq!(report.error_count, 1);
    }
}
