//! Ordered regex patterns per card field. First match wins.

use std::sync::LazyLock;

use regex::Regex;

pub struct FieldPattern {
    pub field: &'static str,
    patterns: Vec<Regex>,
}

impl FieldPattern {
    fn new(field: &'static str, sources: &[&str]) -> Self {
        let patterns = sources
            .iter()
            .map(|source| Regex::new(source).expect("field pattern is valid"))
            .collect();
        Self { field, patterns }
    }

    /// Capture group 1 of the first pattern that matches.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.patterns.iter().find_map(|re| {
            re.captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
        })
    }
}

pub static WORD: LazyLock<FieldPattern> = LazyLock::new(|| {
    FieldPattern::new(
        "word",
        &[
            r#"<div class="word-english">([^<]+)</div>"#,
            r#"<h1[^>]*>([^<]+)</h1>"#,
            r#"<div class="word">([^<]+)</div>"#,
        ],
    )
});

/// Single-block fields located directly in the document.
pub static SIMPLE_FIELDS: LazyLock<Vec<FieldPattern>> = LazyLock::new(|| {
    vec![
        FieldPattern::new(
            "pronunciation",
            &[r#"<div class="pronunciation">([^<]+)</div>"#],
        ),
        FieldPattern::new("chinese", &[r#"<div class="word-chinese">([^<]+)</div>"#]),
        FieldPattern::new(
            "image",
            &[
                r#"<img[^>]+src="([^"]+)"[^>]*alt="[^"]*"[^>]*class="card-image""#,
                r#"<img[^>]+class="card-image"[^>]*src="([^"]+)""#,
            ],
        ),
        FieldPattern::new("category", &[r#"<span class="category">([^<]+)</span>"#]),
    ]
});

pub static DEFINITION_BLOCK: LazyLock<FieldPattern> = LazyLock::new(|| {
    FieldPattern::new("definition", &[r#"(?s)<div class="definition">(.*?)</div>"#])
});

/// Fields located inside the definition block.
pub static DEFINITION_FIELDS: LazyLock<Vec<FieldPattern>> = LazyLock::new(|| {
    vec![
        FieldPattern::new(
            "definition_en",
            &[
                r"(?s)<strong>英文[:：]</strong>\s*([^<]+?)\s*(?:<br\s*/?>|$)",
                r"(?s)<strong>English:</strong>\s*([^<]+?)\s*(?:<br\s*/?>|$)",
            ],
        ),
        FieldPattern::new(
            "definition_zh",
            &[
                r"(?s)<strong>中文[:：]</strong>\s*([^<]+?)\s*(?:</div>|$)",
                r"(?s)<strong>Chinese:</strong>\s*([^<]+?)\s*(?:</div>|$)",
            ],
        ),
    ]
});

pub static EXAMPLE_BLOCK: LazyLock<FieldPattern> = LazyLock::new(|| {
    FieldPattern::new("example", &[r#"(?s)<div class="example">(.*?)</div>"#])
});

pub static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br\s*/?>|\n").expect("line break pattern is valid"));

pub static SURROUNDING_QUOTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^["'“]|["'”]$"#).expect("quote pattern is valid")
});
