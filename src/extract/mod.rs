//! Recover card records from legacy per-card HTML documents.
//!
//! Extraction is best effort: a field whose patterns do not match is left
//! absent so completeness checks can tell "absent" from "empty".

mod corpus;
mod patterns;

pub use corpus::{extract_dataset, LegacyCorpus, LegacyDocument, DEFAULT_EXTRACT_VERSION};

use crate::dataset::Card;

/// Build a partial card from one legacy document. Never fails.
pub fn extract(document_text: &str, theme_id: &str, filename: &str) -> Card {
    let mut card = Card::new(theme_id, filename);

    if let Some(word) = extract_word(document_text) {
        card.word = Some(word);
    }
    for pattern in patterns::SIMPLE_FIELDS.iter() {
        if let Some(value) = pattern.find(document_text) {
            card.set_field(pattern.field, value.trim());
        }
    }

    if let Some(block) = patterns::DEFINITION_BLOCK.find(document_text) {
        for pattern in patterns::DEFINITION_FIELDS.iter() {
            if let Some(value) = pattern.find(block) {
                card.set_field(pattern.field, value.trim());
            }
        }
    }

    if let Some(block) = patterns::EXAMPLE_BLOCK.find(document_text) {
        let parts: Vec<&str> = patterns::LINE_BREAK
            .split(block)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if let [english, chinese, ..] = parts.as_slice() {
            let english = patterns::SURROUNDING_QUOTES.replace_all(english, "");
            card.example_en = Some(english.trim().to_string());
            card.example_zh = Some(chinese.to_string());
        }
    }

    card
}

/// The display word of a legacy document, trimmed.
pub fn extract_word(document_text: &str) -> Option<String> {
    patterns::WORD
        .find(document_text)
        .map(|word| word.trim().to_string())
}
