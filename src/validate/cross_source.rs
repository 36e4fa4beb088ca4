//! Agreement between the dataset and the legacy per-card documents.
//!
//! Words compare exactly after trimming surrounding whitespace. "Cooking" and
//! "cooking" are a mismatch; triage is left to a human.

use std::collections::BTreeSet;

use crate::dataset::Dataset;
use crate::extract::{extract_word, LegacyCorpus, LegacyDocument};
use crate::validate::{Finding, FindingKind};

pub fn check_cross_source(dataset: &Dataset, corpus: &LegacyCorpus) -> Vec<Finding> {
    let mut findings = Vec::new();
    let themes: BTreeSet<&str> = dataset
        .cards
        .keys()
        .chain(corpus.themes.keys())
        .map(String::as_str)
        .collect();

    for theme in themes {
        let cards = dataset.cards_in(theme);
        let documents = corpus.documents(theme);

        let mut listed = BTreeSet::new();
        for card in cards {
            let Some(filename) = card.filename.as_deref() else {
                continue;
            };
            if !listed.insert(filename) {
                continue;
            }
            let word = card.word.as_deref().map(str::trim);
            match documents.and_then(|docs| docs.get(filename)) {
                None => findings.push(Finding::card(
                    theme,
                    filename,
                    FindingKind::OrphanInDataset {
                        word: word.map(str::to_string),
                    },
                )),
                Some(LegacyDocument::Unreadable(reason)) => findings.push(Finding::card(
                    theme,
                    filename,
                    FindingKind::UnreadableDocument {
                        reason: reason.clone(),
                    },
                )),
                Some(LegacyDocument::Text(text)) => {
                    let Some(expected) = word.filter(|w| !w.is_empty()) else {
                        continue;
                    };
                    let actual = extract_word(text);
                    if actual.as_deref() != Some(expected) {
                        findings.push(Finding::card(
                            theme,
                            filename,
                            FindingKind::WordMismatch {
                                expected: expected.to_string(),
                                actual,
                            },
                        ));
                    }
                }
            }
        }

        for (filename, document) in documents.into_iter().flatten() {
            if listed.contains(filename.as_str()) {
                continue;
            }
            let word = document.text().and_then(extract_word);
            findings.push(Finding::card(
                theme,
                filename,
                FindingKind::OrphanOnDisk { word },
            ));
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Card;

    fn card(theme: &str, filename: &str, word: &str) -> Card {
        let mut card = Card::new(theme, filename);
        card.word = Some(word.to_string());
        card
    }

    #[test]
    fn case_difference_is_one_word_mismatch() {
        let mut dataset = Dataset::new("1.0.0", "2025-10-24");
        dataset
            .cards
            .insert("zelda".into(), vec![card("zelda", "cooking.html", "cooking")]);
        let mut corpus = LegacyCorpus::default();
        corpus.insert(
            "zelda",
            "cooking.html",
            r#"<div class="word-english">Cooking</div>"#,
        );

        let findings = check_cross_source(&dataset, &corpus);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].kind,
            FindingKind::WordMismatch {
                expected: "cooking".into(),
                actual: Some("Cooking".into()),
            }
        );
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let mut dataset = Dataset::new("1.0.0", "2025-10-24");
        dataset
            .cards
            .insert("zelda".into(), vec![card("zelda", "ore.html", " Ore ")]);
        let mut corpus = LegacyCorpus::default();
        corpus.insert("zelda", "ore.html", "<div class=\"word-english\">\n Ore\n</div>");
        assert!(check_cross_source(&dataset, &corpus).is_empty());
    }

    #[test]
    fn one_sided_filenames_are_orphans() {
        let mut dataset = Dataset::new("1.0.0", "2025-10-24");
        dataset
            .cards
            .insert("mario".into(), vec![card("mario", "kart.html", "Kart")]);
        let mut corpus = LegacyCorpus::default();
        corpus.insert("mario", "banana.html", r#"<div class="word-english">Banana</div>"#);

        let findings = check_cross_source(&dataset, &corpus);
        assert_eq!(findings.len(), 2);
        assert_eq!(
            findings[0].kind,
            FindingKind::OrphanInDataset {
                word: Some("Kart".into())
            }
        );
        assert_eq!(findings[1].filename.as_deref(), Some("banana.html"));
        assert_eq!(
            findings[1].kind,
            FindingKind::OrphanOnDisk {
                word: Some("Banana".into())
            }
        );
    }

    #[test]
    fn document_without_word_is_a_mismatch() {
        let mut dataset = Dataset::new("1.0.0", "2025-10-24");
        dataset
            .cards
            .insert("mario".into(), vec![card("mario", "kart.html", "Kart")]);
        let mut corpus = LegacyCorpus::default();
        corpus.insert("mario", "kart.html", "<html></html>");
        let findings = check_cross_source(&dataset, &corpus);
        assert_eq!(
            findings[0].kind,
            FindingKind::WordMismatch {
                expected: "Kart".into(),
                actual: None
            }
        );
    }

    #[test]
    fn unreadable_document_is_reported_not_fatal() {
        let mut dataset = Dataset::new("1.0.0", "2025-10-24");
        dataset
            .cards
            .insert("mario".into(), vec![card("mario", "kart.html", "Kart")]);
        let mut corpus = LegacyCorpus::default();
        corpus.themes.entry("mario".into()).or_default().insert(
            "kart.html".into(),
            LegacyDocument::Unreadable("permission denied".into()),
        );
        let findings = check_cross_source(&dataset, &corpus);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind.name(), "UnreadableDocument");
    }
}
