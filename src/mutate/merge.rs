//! Add one theme's metadata and cards to a dataset.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::dataset::{Card, Dataset, ThemeMeta};
use crate::error::DeckError;
use crate::mutate::{Change, Mutation};
use crate::validate::{Finding, FindingKind};

/// A per-theme card file, as produced by extraction or by `split`.
/// Only `cards` is required.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ThemeFile {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub theme_name: Option<String>,
    #[serde(default)]
    pub total_count: Option<usize>,
    pub cards: Vec<Card>,
}

impl ThemeFile {
    /// Theme id from the file's `theme` key, else the file stem.
    pub fn theme_id(&self, path: &Path) -> Option<String> {
        self.theme
            .clone()
            .filter(|id| !id.trim().is_empty())
            .or_else(|| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
    }

    /// Metadata to use when none is supplied separately.
    pub fn default_meta(&self, theme_id: &str) -> ThemeMeta {
        ThemeMeta::titled(self.theme_name.as_deref().unwrap_or(theme_id))
    }
}

pub fn load_theme_file(path: impl AsRef<Path>) -> Result<ThemeFile, DeckError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|err| DeckError::read(path, err))?;
    let file: ThemeFile =
        serde_json::from_str(&raw).map_err(|err| DeckError::malformed(path, err.to_string()))?;
    if let Some(expected) = file.total_count.filter(|&n| n != file.cards.len()) {
        log::warn!(
            "{}: total_count is {expected} but {} cards are listed",
            path.display(),
            file.cards.len()
        );
    }
    Ok(file)
}

/// Insert `meta` and `cards` under `theme_id`.
///
/// If the id already exists in either map and `allow_overwrite` is false the
/// dataset comes back untouched with a `MergeConflict` finding. Cards with no
/// `theme` are stamped with `theme_id`.
pub fn merge_theme(
    dataset: Dataset,
    theme_id: &str,
    meta: ThemeMeta,
    mut cards: Vec<Card>,
    allow_overwrite: bool,
) -> Mutation {
    let mut mutation = Mutation::new(dataset);
    let exists = mutation.dataset.themes.contains_key(theme_id)
        || mutation.dataset.cards.contains_key(theme_id);
    if exists && !allow_overwrite {
        log::warn!("theme '{theme_id}' already exists; merge refused");
        mutation.findings.push(Finding::theme(
            theme_id,
            FindingKind::MergeConflict {
                reason: format!("theme '{theme_id}' already exists and overwrite is not allowed"),
            },
        ));
        return mutation;
    }

    for card in &mut cards {
        match card.theme.as_deref() {
            None => card.theme = Some(theme_id.to_string()),
            Some(other) if other != theme_id => {
                log::warn!(
                    "merging card '{}' with theme '{other}' under '{theme_id}'",
                    card.filename.as_deref().unwrap_or("?")
                );
            }
            Some(_) => {}
        }
    }

    if mutation.dataset.themes.get(theme_id) != Some(&meta) {
        let before = mutation
            .dataset
            .themes
            .insert(theme_id.to_string(), meta.clone());
        mutation.changes.push(Change {
            theme: theme_id.to_string(),
            filename: None,
            field: "themes".to_string(),
            before: before.map(|old| old.display_name(theme_id).to_string()),
            after: meta.display_name(theme_id).to_string(),
        });
    }
    if mutation.dataset.cards.get(theme_id) != Some(&cards) {
        let count = cards.len();
        let before = mutation.dataset.cards.insert(theme_id.to_string(), cards);
        mutation.changes.push(Change {
            theme: theme_id.to_string(),
            filename: None,
            field: "cards".to_string(),
            before: before.map(|old| format!("{} cards", old.len())),
            after: format!("{count} cards"),
        });
    }
    log::info!("merged theme '{theme_id}' ({} changes)", mutation.changes.len());
    mutation.finish()
}
