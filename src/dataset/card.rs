//! Card, theme metadata and the top-level dataset container.
//!
//! Unknown keys on cards and theme metadata are kept in `extra` so a
//! load/save cycle never drops fields the front-end may rely on.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields a card must carry, non-blank, to count as complete.
pub const REQUIRED_FIELDS: &[&str] = &[
    "word",
    "pronunciation",
    "chinese",
    "definition_en",
    "definition_zh",
    "example_en",
    "example_zh",
    "category",
    "image",
];

/// Identity fields: set on creation, never backfilled.
pub const IDENTITY_FIELDS: &[&str] = &["theme", "filename"];

/// Every card field the model knows by name. All are strings in JSON.
pub const CARD_STRING_FIELDS: &[&str] = &[
    "theme",
    "filename",
    "word",
    "pronunciation",
    "chinese",
    "image",
    "definition_en",
    "definition_zh",
    "example_en",
    "example_zh",
    "category",
];

/// One vocabulary flashcard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chinese: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Card {
    pub fn new(theme: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            theme: Some(theme.into()),
            filename: Some(filename.into()),
            ..Self::default()
        }
    }

    fn slot(&self, name: &str) -> Option<&Option<String>> {
        let slot = match name {
            "theme" => &self.theme,
            "filename" => &self.filename,
            "word" => &self.word,
            "pronunciation" => &self.pronunciation,
            "chinese" => &self.chinese,
            "image" => &self.image,
            "definition_en" => &self.definition_en,
            "definition_zh" => &self.definition_zh,
            "example_en" => &self.example_en,
            "example_zh" => &self.example_zh,
            "category" => &self.category,
            _ => return None,
        };
        Some(slot)
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        let slot = match name {
            "theme" => &mut self.theme,
            "filename" => &mut self.filename,
            "word" => &mut self.word,
            "pronunciation" => &mut self.pronunciation,
            "chinese" => &mut self.chinese,
            "image" => &mut self.image,
            "definition_en" => &mut self.definition_en,
            "definition_zh" => &mut self.definition_zh,
            "example_en" => &mut self.example_en,
            "example_zh" => &mut self.example_zh,
            "category" => &mut self.category,
            _ => return None,
        };
        Some(slot)
    }

    /// String value of a named field, known or extra. Non-string extras read as absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        match self.slot(name) {
            Some(slot) => slot.as_deref(),
            None => self.extra.get(name).and_then(Value::as_str),
        }
    }

    /// Set a named field. Unknown names land in `extra`.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.slot_mut(name) {
            Some(slot) => *slot = Some(value),
            None => {
                self.extra.insert(name.to_string(), Value::String(value));
            }
        }
    }

    /// A kept extra value that is present but not text (number, bool, list, object).
    pub fn non_text_extra(&self, name: &str) -> Option<&Value> {
        if self.slot(name).is_some() {
            return None;
        }
        self.extra
            .get(name)
            .filter(|value| !value.is_null() && !value.is_string())
    }

    /// True when the field is absent or only whitespace.
    pub fn is_blank(&self, name: &str) -> bool {
        self.field(name).map_or(true, |value| value.trim().is_empty())
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| self.is_blank(field))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Filename, or `#<index>` when the card has none. Used to locate findings.
    pub fn label(&self, index: usize) -> String {
        match self.filename.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("#{index}"),
        }
    }
}

/// Display metadata for a theme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_header: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ThemeMeta {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Title for display, falling back to the theme id.
    pub fn display_name<'a>(&'a self, theme_id: &'a str) -> &'a str {
        self.title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(theme_id)
    }
}

/// The full card dataset: theme metadata plus one card list per theme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub themes: BTreeMap<String, ThemeMeta>,
    #[serde(default)]
    pub cards: BTreeMap<String, Vec<Card>>,
}

impl Dataset {
    pub fn new(version: impl Into<String>, updated: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            updated: updated.into(),
            ..Self::default()
        }
    }

    /// Union of theme ids from both maps, sorted.
    pub fn theme_ids(&self) -> BTreeSet<&str> {
        self.themes
            .keys()
            .chain(self.cards.keys())
            .map(String::as_str)
            .collect()
    }

    pub fn card_count(&self) -> usize {
        self.cards.values().map(Vec::len).sum()
    }

    pub fn cards_in(&self, theme: &str) -> &[Card] {
        self.cards.get(theme).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Set `updated` to today's UTC date.
    pub fn stamp_updated(&mut self) {
        self.updated = today();
    }
}

/// Today's UTC date as `YYYY-MM-DD`.
pub fn today() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}
