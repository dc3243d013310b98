//! JSON schemas sent as structured-output formats.
//!
//! Every object is closed (`additionalProperties: false`) and lists all of its
//! properties as required, which strict structured output demands. Optional
//! values are expressed as nullable types instead.

use serde_json::{json, Value};
use tabletop_core::{EffectKind, TimeHorizon};

fn horizons() -> Vec<&'static str> {
    TimeHorizon::ALL.iter().map(TimeHorizon::as_str).collect()
}

fn effect_kinds() -> Vec<&'static str> {
    EffectKind::ALL.iter().map(EffectKind::as_str).collect()
}

fn string_list() -> Value {
    json!({"type": "array", "items": {"type": "string"}})
}

fn cards_wrapper(card: Value) -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["cards"],
        "properties": {
            "cards": {"type": "array", "items": card, "minItems": 1}
        }
    })
}

pub fn policy_card() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": [
            "id", "title", "short_description", "description", "category",
            "cost", "timeline", "impact_score", "tags", "addresses_tags",
            "side_effect_tags", "prerequisites_policy_tags", "synergy_policy_tags",
            "role_restrictions", "art_prompt", "flavor_quote"
        ],
        "properties": {
            "id": {"type": "string"},
            "title": {"type": "string"},
            "short_description": {"type": "string"},
            "description": {"type": "string"},
            "category": {"type": "string"},
            "cost": {
                "type": "object",
                "additionalProperties": false,
                "required": ["budget_level", "implementation_complexity", "notes"],
                "properties": {
                    "budget_level": {"type": "integer", "minimum": 1, "maximum": 5},
                    "implementation_complexity": {"type": "integer", "minimum": 1, "maximum": 5},
                    "notes": {"type": "string"}
                }
            },
            "timeline": {
                "type": "object",
                "additionalProperties": false,
                "required": ["time_to_launch", "time_to_impact"],
                "properties": {
                    "time_to_launch": {"type": "string", "enum": horizons()},
                    "time_to_impact": {"type": "string", "enum": horizons()}
                }
            },
            "impact_score": {"type": "integer", "minimum": 1, "maximum": 5},
            "tags": string_list(),
            "addresses_tags": string_list(),
            "side_effect_tags": string_list(),
            "prerequisites_policy_tags": string_list(),
            "synergy_policy_tags": string_list(),
            "role_restrictions": string_list(),
            "art_prompt": {"type": "string"},
            "flavor_quote": {"type": "string"}
        }
    })
}

pub fn policy_cards() -> Value {
    cards_wrapper(policy_card())
}

pub fn effect() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["type", "params"],
        "properties": {
            "type": {"type": "string", "enum": effect_kinds()},
            "params": {
                "type": "object",
                "additionalProperties": false,
                "required": ["count", "stage_offset", "delta"],
                "properties": {
                    "count": {"type": ["integer", "null"], "minimum": 1},
                    "stage_offset": {"type": ["integer", "null"], "minimum": 0},
                    "delta": {"type": ["integer", "null"]}
                }
            }
        }
    })
}

pub fn development_card() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": [
            "id", "stage", "title", "short_description", "description", "valence",
            "arrows_up", "arrows_down", "severity", "tags", "thread_id", "supersedes",
            "activation", "effects", "art_prompt", "suggested_visibility"
        ],
        "properties": {
            "id": {"type": "string"},
            "stage": {"type": "integer", "minimum": 0},
            "title": {"type": "string"},
            "short_description": {"type": "string"},
            "description": {"type": "string"},
            "valence": {"type": "string", "enum": ["positive", "negative", "mixed"]},
            "arrows_up": {"type": "integer", "minimum": 0, "maximum": 3},
            "arrows_down": {"type": "integer", "minimum": 0, "maximum": 3},
            "severity": {"type": "integer", "minimum": 1, "maximum": 5},
            "tags": string_list(),
            "thread_id": {"type": "string"},
            "supersedes": {"type": ["string", "null"]},
            "activation": {
                "type": "object",
                "additionalProperties": false,
                "required": ["type", "required_policy_tags"],
                "properties": {
                    "type": {"type": "string", "enum": ["immediate", "conditional"]},
                    "required_policy_tags": string_list()
                }
            },
            "effects": {"type": "array", "items": effect()},
            "art_prompt": {"type": "string"},
            "suggested_visibility": {"type": "string", "enum": ["faceup", "facedown", "either"]}
        }
    })
}

pub fn development_cards() -> Value {
    cards_wrapper(development_card())
}
