use std::collections::BTreeMap;

use crate::dataset::Dataset;
use crate::validate::{Finding, FindingKind};

/// One `DuplicateFilename` per filename that occurs more than once in a theme.
/// Cards without a filename are the schema check's concern and are skipped here.
pub fn check_uniqueness(dataset: &Dataset) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (theme, cards) in &dataset.cards {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for filename in cards.iter().filter_map(|card| card.filename.as_deref()) {
            *counts.entry(filename).or_default() += 1;
        }
        for (filename, occurrences) in counts {
            if occurrences > 1 {
                findings.push(Finding::card(
                    theme,
                    filename,
                    FindingKind::DuplicateFilename { occurrences },
                ));
            }
        }
    }
    findings
}
