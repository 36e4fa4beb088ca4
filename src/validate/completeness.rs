use crate::dataset::Dataset;
use crate::validate::{Finding, FindingKind};

/// One `MissingField` per absent or blank required field, per card.
pub fn check_completeness(dataset: &Dataset) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (theme, cards) in &dataset.cards {
        for (index, card) in cards.iter().enumerate() {
            for field in card.missing_fields() {
                findings.push(Finding::card(
                    theme,
                    card.label(index),
                    FindingKind::MissingField {
                        field: field.to_string(),
                    },
                ));
            }
        }
    }
    findings
}
