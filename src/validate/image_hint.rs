//! Optional lint: guess a word from the image file name and compare loosely.
//!
//! Many hits are intentional (a related image reused for a word), so these
//! findings are informational and never affect the exit status.

use std::sync::LazyLock;

use regex::Regex;

use crate::dataset::Dataset;
use crate::validate::{Finding, FindingKind};

static EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|jpg|jpeg|gif|webp)$").expect("extension pattern is valid")
});
static WIDTH_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+px-").expect("width prefix pattern is valid"));
static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"MKW?orld?_.*?_([A-Z][a-z]+(?:_[A-Z][a-z]+)*)",
        r"MKW_([A-Z][a-z]+(?:_[A-Z][a-z]+)*)_",
        r"BotW_([A-Z][a-z]+(?:_[A-Z][a-z]+)*)_",
        r"([A-Z][a-z]+(?:_[A-Z][a-z]+)*)$",
    ]
    .iter()
    .map(|source| Regex::new(source).expect("image name pattern is valid"))
    .collect()
});

pub fn check_image_hints(dataset: &Dataset) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (theme, cards) in &dataset.cards {
        for (index, card) in cards.iter().enumerate() {
            let (Some(word), Some(url)) = (card.word.as_deref(), card.image.as_deref()) else {
                continue;
            };
            let Some(url_word) = word_from_image_url(url) else {
                continue;
            };
            if !loosely_matches(word, &url_word) {
                findings.push(Finding::card(
                    theme,
                    card.label(index),
                    FindingKind::ImageWordHint {
                        word: word.to_string(),
                        url_word,
                    },
                ));
            }
        }
    }
    findings
}

/// Best-effort word guess from an image URL's file name.
pub fn word_from_image_url(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let path = without_query
        .split_once("://")
        .map(|(_, rest)| rest.split_once('/').map_or("", |(_, path)| path))
        .unwrap_or(without_query);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    // Versioned wiki URLs put the file name before "/revision/...".
    let file = match segments.iter().position(|s| *s == "revision") {
        Some(pos) if pos > 0 => segments[pos - 1],
        _ => *segments.last()?,
    };

    let decoded = percent_decode(file).replace(' ', "_");
    let stem = EXTENSION.replace(&decoded, "");
    let stem = WIDTH_PREFIX.replace(&stem, "").into_owned();

    let guess = NAME_PATTERNS
        .iter()
        .find_map(|re| re.captures(&stem).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str().to_string())
        .unwrap_or(stem);
    let guess = guess.replace('_', " ");
    let guess = guess.trim();
    (!guess.is_empty()).then(|| guess.to_string())
}

fn loosely_matches(word: &str, url_word: &str) -> bool {
    let word = word.to_lowercase().replace(' ', "");
    let url_word = url_word.to_lowercase().replace(' ', "");
    word == url_word
        || word.contains(&url_word)
        || url_word.contains(&word)
        || word == format!("{url_word}s")
        || format!("{word}s") == url_word
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Card;

    #[test]
    fn guesses_from_game_prefixed_names() {
        assert_eq!(
            word_from_image_url("https://mario.wiki.gallery/images/MKW_Banana_Roulette_Icon.png")
                .as_deref(),
            Some("Banana Roulette")
        );
        assert_eq!(
            word_from_image_url(
                "https://cdn.wikimg.net/en/zeldawiki/images/7/71/BotW_Link_Shooting_Artwork.png"
            )
            .as_deref(),
            Some("Link Shooting")
        );
    }

    #[test]
    fn versioned_wiki_urls_use_the_file_segment() {
        let url = "https://static.wikia.nocookie.net/hayday/images/e/e2/Wheat.png/revision/latest/scale-to-width-down/400?cb=20240218150024";
        assert_eq!(word_from_image_url(url).as_deref(), Some("Wheat"));
    }

    #[test]
    fn width_prefix_and_escapes_are_removed() {
        let url = "https://example.com/thumb/120px-Chili%20Pepper.png";
        assert_eq!(word_from_image_url(url).as_deref(), Some("Chili Pepper"));
    }

    #[test]
    fn plural_and_substring_are_tolerated() {
        assert!(loosely_matches("Blueberries", "Blueberries"));
        assert!(loosely_matches("Koroks", "Korok"));
        assert!(loosely_matches("Coffee Bean", "Coffee Bean Icon"));
        assert!(!loosely_matches("Cooking", "Hyrule Day"));
    }

    #[test]
    fn mismatch_is_info_only() {
        let mut card = Card::new("zelda", "cooking.html");
        card.word = Some("Cooking".into());
        card.image = Some(
            "https://cdn.wikimg.net/en/zeldawiki/images/7/71/BotW_Hyrule_Day_Artwork.jpg".into(),
        );
        let mut dataset = Dataset::new("1.0.0", "2025-10-24");
        dataset.cards.insert("zelda".into(), vec![card]);
        let findings = check_image_hints(&dataset);
        assert_eq!(findings.len(), 1);
        assert!(!findings[0].is_error());
    }
}
