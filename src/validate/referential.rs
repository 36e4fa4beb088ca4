use crate::dataset::Dataset;
use crate::validate::{Finding, FindingKind};

/// `themes` and `cards` must have the same key set.
pub fn check_referential(dataset: &Dataset) -> Vec<Finding> {
    let mut findings = Vec::new();
    for theme in dataset.themes.keys() {
        if !dataset.cards.contains_key(theme) {
            findings.push(Finding::theme(theme, FindingKind::OrphanThemeMeta));
        }
    }
    for theme in dataset.cards.keys() {
        if !dataset.themes.contains_key(theme) {
            findings.push(Finding::theme(theme, FindingKind::OrphanCardList));
        }
    }
    findings
}
