//! Idempotent fixups over a [Dataset], plus the split/join layout conversion.
//!
//! Mutators take the dataset by value and hand it back in a [Mutation]
//! together with what they changed and anything they refused to do.

mod backfill;
mod merge;
mod split;
mod url_rewrite;

use std::fmt;

use serde::Serialize;

use crate::dataset::Dataset;
use crate::validate::Finding;

pub use backfill::{backfill, load_backfill_table, BackfillTable, MatchOn};
pub use merge::{load_theme_file, merge_theme, ThemeFile};
pub use split::{
    check_layout, join, split, LayoutConfig, SplitLayout, ThemeCards, CARDS_DIR, CONFIG_FILE,
    LAYOUT_VERSION, THEMES_FILE,
};
pub use url_rewrite::{rewrite_image_url, rewrite_image_urls, ScaleRule};

/// One field-level edit made by a mutator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub theme: String,
    pub filename: Option<String>,
    pub field: String,
    pub before: Option<String>,
    pub after: String,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = match &self.filename {
            Some(filename) => format!("{}/{}", self.theme, filename),
            None => self.theme.clone(),
        };
        match self.before.as_deref().filter(|before| !before.is_empty()) {
            Some(before) => write!(f, "{location}: {} '{before}' -> '{}'", self.field, self.after),
            None => write!(f, "{location}: {} set to '{}'", self.field, self.after),
        }
    }
}

/// Result of a mutator run.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub dataset: Dataset,
    pub changes: Vec<Change>,
    pub findings: Vec<Finding>,
}

impl Mutation {
    fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            changes: Vec::new(),
            findings: Vec::new(),
        }
    }

    pub fn is_changed(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(Finding::is_error)
    }

    /// Stamp `updated` only when something changed, so a no-op rerun leaves
    /// the dataset byte-identical.
    fn finish(mut self) -> Self {
        if self.is_changed() {
            self.dataset.stamp_updated();
        }
        self
    }
}
