//! Conversion between the monolithic dataset file and the per-theme layout:
//!
//! ```text
//! <dir>/config.json
//! <dir>/themes.json        {"themes": {...}}
//! <dir>/cards/<theme>.json {theme, theme_name, total_count, cards}
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataset::{write_json_atomic, Card, Dataset, ThemeMeta};
use crate::error::DeckError;
use crate::validate::{Finding, FindingKind};

pub const CONFIG_FILE: &str = "config.json";
pub const THEMES_FILE: &str = "themes.json";
pub const CARDS_DIR: &str = "cards";
pub const LAYOUT_VERSION: &str = "2.0";

const LAYOUT_FORMAT: &str = "vocabdeck-split";
const LAYOUT_DESCRIPTION: &str = "Vocabulary Cards Data - Modular Structure";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub format: String,
    pub version: String,
    /// `version` of the dataset the layout was split from.
    pub dataset_version: String,
    pub updated: String,
    pub description: String,
    pub data_structure: BTreeMap<String, String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let data_structure = [
            ("themes", "themes.json - Theme configurations"),
            ("cards", "cards/*.json - Individual theme card data"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            format: LAYOUT_FORMAT.to_string(),
            version: LAYOUT_VERSION.to_string(),
            dataset_version: String::new(),
            updated: String::new(),
            description: LAYOUT_DESCRIPTION.to_string(),
            data_structure,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct ThemesFile {
    #[serde(default)]
    themes: BTreeMap<String, ThemeMeta>,
}

/// Contents of one `cards/<theme>.json` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeCards {
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub theme_name: String,
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitLayout {
    pub config: LayoutConfig,
    pub themes: BTreeMap<String, ThemeMeta>,
    /// Keyed by file stem under `cards/`.
    pub cards: BTreeMap<String, ThemeCards>,
}

pub fn split(dataset: &Dataset) -> SplitLayout {
    let config = LayoutConfig {
        dataset_version: dataset.version.clone(),
        updated: dataset.updated.clone(),
        ..LayoutConfig::default()
    };
    let cards = dataset
        .cards
        .iter()
        .map(|(theme, cards)| {
            let theme_name = dataset
                .themes
                .get(theme)
                .map_or(theme.as_str(), |meta| meta.display_name(theme))
                .to_string();
            let file = ThemeCards {
                theme: theme.clone(),
                theme_name,
                total_count: cards.len(),
                cards: cards.clone(),
            };
            (theme.clone(), file)
        })
        .collect();
    SplitLayout {
        config,
        themes: dataset.themes.clone(),
        cards,
    }
}

pub fn join(layout: &SplitLayout) -> Dataset {
    Dataset {
        version: layout.config.dataset_version.clone(),
        updated: layout.config.updated.clone(),
        themes: layout.themes.clone(),
        cards: layout
            .cards
            .iter()
            .map(|(theme, file)| (theme.clone(), file.cards.clone()))
            .collect(),
    }
}

impl SplitLayout {
    /// Write every file atomically. Card files left over from an earlier
    /// split of themes no longer present are removed.
    pub fn write(&self, dir: impl AsRef<Path>) -> Result<(), DeckError> {
        let dir = dir.as_ref();
        let cards_dir = dir.join(CARDS_DIR);
        for theme in self.cards.keys() {
            if theme.is_empty() || theme.contains(['/', '\\']) || theme.starts_with('.') {
                return Err(DeckError::layout(format!(
                    "theme id '{theme}' cannot be used as a file name"
                )));
            }
        }
        fs::create_dir_all(&cards_dir).map_err(|err| DeckError::write(&cards_dir, err))?;

        write_json_atomic(&dir.join(CONFIG_FILE), &self.config)?;
        let themes = ThemesFile {
            themes: self.themes.clone(),
        };
        write_json_atomic(&dir.join(THEMES_FILE), &themes)?;
        for (theme, file) in &self.cards {
            write_json_atomic(&cards_dir.join(format!("{theme}.json")), file)?;
        }

        for (stem, path) in card_files(&cards_dir)? {
            if !self.cards.contains_key(&stem) {
                log::info!("removing stale {}", path.display());
                fs::remove_file(&path).map_err(|err| DeckError::write(&path, err))?;
            }
        }
        log::info!(
            "wrote split layout {} ({} themes, {} card files)",
            dir.display(),
            self.themes.len(),
            self.cards.len()
        );
        Ok(())
    }

    pub fn read(dir: impl AsRef<Path>) -> Result<Self, DeckError> {
        let dir = dir.as_ref();
        let config: LayoutConfig = read_json(&dir.join(CONFIG_FILE))?;
        if config.version != LAYOUT_VERSION {
            log::warn!(
                "{}: layout version '{}' (expected '{LAYOUT_VERSION}')",
                dir.display(),
                config.version
            );
        }
        let themes: ThemesFile = read_json(&dir.join(THEMES_FILE))?;
        let mut cards = BTreeMap::new();
        for (stem, path) in card_files(&dir.join(CARDS_DIR))? {
            let file: ThemeCards = read_json(&path)?;
            if !themes.themes.contains_key(&stem) {
                log::warn!("{}: no theme metadata for '{stem}'", path.display());
            }
            cards.insert(stem, file);
        }
        Ok(Self {
            config,
            themes: themes.themes,
            cards,
        })
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, DeckError> {
    let raw = fs::read_to_string(path).map_err(|err| DeckError::read(path, err))?;
    serde_json::from_str(&raw).map_err(|err| DeckError::malformed(path, err.to_string()))
}

/// `*.json` files directly under `cards_dir`, sorted by stem.
fn card_files(cards_dir: &Path) -> Result<Vec<(String, PathBuf)>, DeckError> {
    let entries = fs::read_dir(cards_dir).map_err(|err| DeckError::read(cards_dir, err))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| DeckError::read(cards_dir, err))?.path();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if !is_json || !path.is_file() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            files.push((stem.to_string(), path.clone()));
        }
    }
    files.sort();
    Ok(files)
}

/// Consistency of a split layout on disk. Never fails; problems become findings.
pub fn check_layout(dir: impl AsRef<Path>) -> Vec<Finding> {
    let dir = dir.as_ref();
    let mut findings = Vec::new();

    if let Err(reason) = parse_file::<LayoutConfig>(&dir.join(CONFIG_FILE)) {
        findings.push(malformed_file(None, CONFIG_FILE, reason));
    }
    let themes = match parse_file::<ThemesFile>(&dir.join(THEMES_FILE)) {
        Ok(file) => Some(file.themes),
        Err(reason) => {
            findings.push(malformed_file(None, THEMES_FILE, reason));
            None
        }
    };
    let files = match card_files(&dir.join(CARDS_DIR)) {
        Ok(files) => files,
        Err(err) => {
            findings.push(malformed_file(None, CARDS_DIR, err.to_string()));
            return findings;
        }
    };

    let mut listed = BTreeSet::new();
    for (stem, path) in &files {
        let label = format!("{CARDS_DIR}/{stem}.json");
        listed.insert(stem.as_str());
        let file = match parse_file::<ThemeCards>(path) {
            Ok(file) => file,
            Err(reason) => {
                findings.push(malformed_file(Some(stem), &label, reason));
                continue;
            }
        };
        if file.theme != *stem {
            findings.push(Finding::card(
                stem.as_str(),
                label.as_str(),
                FindingKind::SchemaViolation {
                    field: "theme".to_string(),
                    problem: format!("is '{}' but file is {label}", file.theme),
                },
            ));
        }
        if file.total_count != file.cards.len() {
            findings.push(Finding::card(
                stem.as_str(),
                label.as_str(),
                FindingKind::SchemaViolation {
                    field: "total_count".to_string(),
                    problem: format!(
                        "is {} but {} cards are listed",
                        file.total_count,
                        file.cards.len()
                    ),
                },
            ));
        }
    }

    if let Some(themes) = themes {
        for theme in themes.keys().filter(|id| !listed.contains(id.as_str())) {
            findings.push(Finding::theme(theme.as_str(), FindingKind::OrphanThemeMeta));
        }
        for stem in listed.iter().filter(|stem| !themes.contains_key(**stem)) {
            findings.push(Finding::theme(*stem, FindingKind::OrphanCardList));
        }
    }
    findings
}

fn parse_file<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, String> {
    let raw = fs::read_to_string(path).map_err(|err| err.to_string())?;
    let value: Value = serde_json::from_str(&raw).map_err(|err| err.to_string())?;
    serde_json::from_value(value).map_err(|err| err.to_string())
}

fn malformed_file(theme: Option<&str>, file: &str, reason: String) -> Finding {
    Finding::new(
        FindingKind::MalformedDataset { reason },
        theme.map(str::to_string),
        Some(file.to_string()),
    )
}
