//! Structural validation of raw dataset JSON, before it becomes a typed [crate::dataset::Dataset].

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::dataset::CARD_STRING_FIELDS;
use crate::validate::{Finding, FindingKind};

const THEME_STRING_KEYS: &[&str] = &["icon", "title", "subtitle", "theme_color", "layout", "badge_text"];

/// Check the raw dataset shape. Never fails: a value that is not a dataset at
/// all yields a single `MalformedDataset` finding.
pub fn validate_schema(value: &Value) -> Vec<Finding> {
    let Some(root) = value.as_object() else {
        return vec![malformed("top-level value is not an object")];
    };
    let Some(themes) = root.get("themes").and_then(Value::as_object) else {
        return vec![malformed("missing 'themes' object")];
    };
    let Some(cards) = root.get("cards").and_then(Value::as_object) else {
        return vec![malformed("missing 'cards' object")];
    };

    let mut findings = Vec::new();
    validate_header(root, &mut findings);

    for (theme_id, meta) in themes {
        validate_theme_meta(theme_id, meta, &mut findings);
    }
    for (theme_id, list) in cards {
        let Some(items) = list.as_array() else {
            findings.push(Finding::theme(
                theme_id,
                violation("cards", "is not an array"),
            ));
            continue;
        };
        for (index, card) in items.iter().enumerate() {
            validate_card(theme_id, index, card, &mut findings);
        }
    }
    findings
}

fn malformed(reason: &str) -> Finding {
    Finding::dataset(FindingKind::MalformedDataset {
        reason: reason.to_string(),
    })
}

fn violation(field: &str, problem: impl Into<String>) -> FindingKind {
    FindingKind::SchemaViolation {
        field: field.to_string(),
        problem: problem.into(),
    }
}

fn validate_header(root: &Map<String, Value>, findings: &mut Vec<Finding>) {
    match root.get("version") {
        Some(Value::String(_)) => {}
        Some(_) => findings.push(Finding::dataset(violation("version", "is not a string"))),
        None => findings.push(Finding::dataset(violation("version", "is missing"))),
    }
    match root.get("updated") {
        Some(Value::String(date)) => {
            if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                findings.push(Finding::dataset(violation(
                    "updated",
                    format!("'{date}' is not a YYYY-MM-DD date"),
                )));
            }
        }
        Some(_) => findings.push(Finding::dataset(violation("updated", "is not a string"))),
        None => findings.push(Finding::dataset(violation("updated", "is missing"))),
    }
}

fn validate_theme_meta(theme_id: &str, meta: &Value, findings: &mut Vec<Finding>) {
    let Some(meta) = meta.as_object() else {
        findings.push(Finding::theme(
            theme_id,
            violation("themes", "entry is not an object"),
        ));
        return;
    };
    for key in THEME_STRING_KEYS {
        if meta.get(*key).is_some_and(|v| !v.is_string()) {
            findings.push(Finding::theme(
                theme_id,
                violation(key, "is not a string"),
            ));
        }
    }
    if meta.get("show_header").is_some_and(|v| !v.is_boolean()) {
        findings.push(Finding::theme(
            theme_id,
            violation("show_header", "is not a boolean"),
        ));
    }
}

fn validate_card(theme_id: &str, index: usize, card: &Value, findings: &mut Vec<Finding>) {
    let Some(card) = card.as_object() else {
        findings.push(Finding::card(
            theme_id,
            format!("#{index}"),
            violation("card", "is not an object"),
        ));
        return;
    };

    let label = match card.get("filename").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => {
            findings.push(Finding::card(
                theme_id,
                format!("#{index}"),
                violation("filename", "is missing"),
            ));
            format!("#{index}")
        }
    };

    match card.get("theme") {
        None => findings.push(Finding::card(
            theme_id,
            &label,
            violation("theme", "is missing"),
        )),
        Some(Value::String(theme)) if theme != theme_id => findings.push(Finding::card(
            theme_id,
            &label,
            violation("theme", format!("is '{theme}' but card is listed under '{theme_id}'")),
        )),
        _ => {}
    }

    for field in CARD_STRING_FIELDS {
        if card.get(*field).is_some_and(|v| !v.is_string()) {
            findings.push(Finding::card(
                theme_id,
                &label,
                violation(field, "is not a string"),
            ));
        }
    }
}
