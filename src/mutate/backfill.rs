//! Fill missing card fields from a correction table.
//!
//! Table shape (JSON or YAML):
//!
//! ```yaml
//! match_on: word        # or filename (default)
//! theme: hayday         # optional; all themes when omitted
//! entries:
//!   Wheat:
//!     chinese: 小麦
//!     pronunciation: /wiːt/
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, IDENTITY_FIELDS};
use crate::error::DeckError;
use crate::mutate::{Change, Mutation};
use crate::validate::{Finding, FindingKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOn {
    #[default]
    Filename,
    Word,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillTable {
    #[serde(default)]
    pub match_on: MatchOn,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Match key -> field -> value.
    #[serde(default)]
    pub entries: BTreeMap<String, BTreeMap<String, String>>,
}

/// Load a table; `.yaml`/`.yml` files are YAML, anything else JSON.
pub fn load_backfill_table(path: impl AsRef<Path>) -> Result<BackfillTable, DeckError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|err| DeckError::read(path, err))?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    let table: BackfillTable = if is_yaml {
        serde_yaml::from_str(&raw)?
    } else {
        serde_json::from_str(&raw)?
    };
    log::info!(
        "loaded backfill table {} ({} entries, match on {:?})",
        path.display(),
        table.entries.len(),
        table.match_on
    );
    Ok(table)
}

/// Fill absent or blank fields from `table`. Existing non-empty values are
/// never overwritten; a differing proposal becomes a `BackfillConflict`.
pub fn backfill(dataset: Dataset, table: &BackfillTable) -> Mutation {
    let mut mutation = Mutation::new(dataset);
    let mut matched: BTreeSet<&str> = BTreeSet::new();

    for (theme, cards) in mutation.dataset.cards.iter_mut() {
        if table.theme.as_deref().is_some_and(|only| only != theme) {
            continue;
        }
        for (index, card) in cards.iter_mut().enumerate() {
            let key = match table.match_on {
                MatchOn::Filename => card.filename.as_deref(),
                MatchOn::Word => card.word.as_deref(),
            };
            let Some((key, fields)) = key.and_then(|key| table.entries.get_key_value(key.trim()))
            else {
                continue;
            };
            matched.insert(key.as_str());
            let label = card.label(index);

            for (field, proposed) in fields {
                if IDENTITY_FIELDS.contains(&field.as_str()) {
                    log::warn!("{theme}/{label}: backfill of identity field '{field}' ignored");
                    continue;
                }
                if proposed.trim().is_empty() {
                    continue;
                }
                if let Some(existing) = card.non_text_extra(field) {
                    mutation.findings.push(Finding::card(
                        theme.as_str(),
                        label.as_str(),
                        FindingKind::BackfillConflict {
                            field: field.clone(),
                            existing: existing.to_string(),
                            proposed: proposed.clone(),
                        },
                    ));
                } else if card.is_blank(field) {
                    let before = card.field(field).map(str::to_string);
                    card.set_field(field, proposed.clone());
                    log::debug!("{theme}/{label}: backfilled {field}");
                    mutation.changes.push(Change {
                        theme: theme.clone(),
                        filename: Some(label.clone()),
                        field: field.clone(),
                        before,
                        after: proposed.clone(),
                    });
                } else if let Some(existing) = card
                    .field(field)
                    .filter(|existing| existing.trim() != proposed.trim())
                {
                    mutation.findings.push(Finding::card(
                        theme.as_str(),
                        label.as_str(),
                        FindingKind::BackfillConflict {
                            field: field.clone(),
                            existing: existing.to_string(),
                            proposed: proposed.clone(),
                        },
                    ));
                }
            }
        }
    }

    for key in table.entries.keys().filter(|key| !matched.contains(key.as_str())) {
        log::warn!("backfill entry '{key}' matched no card");
    }
    log::info!(
        "backfill: {} fields filled, {} conflicts",
        mutation.changes.len(),
        mutation.findings.len()
    );
    mutation.finish()
}
