//! The legacy per-card document source: `<dir>/<theme>/<filename>.html`,
//! plus top-level `<dir>/*.html` pages.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::dataset::{today, Dataset, ThemeMeta};
use crate::error::DeckError;
use crate::extract::extract;

pub const DEFAULT_EXTRACT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyDocument {
    Text(String),
    /// The file exists but could not be read; the reason is kept for the report.
    Unreadable(String),
}

impl LegacyDocument {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Unreadable(_) => None,
        }
    }
}

/// Snapshot of a legacy document directory.
#[derive(Debug, Clone, Default)]
pub struct LegacyCorpus {
    pub themes: BTreeMap<String, BTreeMap<String, LegacyDocument>>,
    pub pages: BTreeMap<String, LegacyDocument>,
}

impl LegacyCorpus {
    /// Read every `.html` file under `dir`. Only an unreadable root directory is
    /// an error; unreadable files become [LegacyDocument::Unreadable].
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, DeckError> {
        let dir = dir.as_ref();
        let mut corpus = Self::default();
        for entry in fs::read_dir(dir).map_err(|err| DeckError::read(dir, err))? {
            let entry = entry.map_err(|err| DeckError::read(dir, err))?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            if path.is_dir() {
                let documents = load_theme_dir(&path);
                log::debug!("legacy theme '{name}': {} documents", documents.len());
                corpus.themes.insert(name, documents);
            } else if is_html(&path) {
                corpus.pages.insert(name, read_document(&path));
            }
        }
        log::info!(
            "loaded legacy source {} ({} themes, {} pages)",
            dir.display(),
            corpus.themes.len(),
            corpus.pages.len()
        );
        Ok(corpus)
    }

    pub fn insert(&mut self, theme: &str, filename: &str, text: impl Into<String>) {
        self.themes
            .entry(theme.to_string())
            .or_default()
            .insert(filename.to_string(), LegacyDocument::Text(text.into()));
    }

    pub fn insert_page(&mut self, filename: &str, text: impl Into<String>) {
        self.pages
            .insert(filename.to_string(), LegacyDocument::Text(text.into()));
    }

    pub fn documents(&self, theme: &str) -> Option<&BTreeMap<String, LegacyDocument>> {
        self.themes.get(theme)
    }
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
}

fn read_document(path: &Path) -> LegacyDocument {
    match fs::read_to_string(path) {
        Ok(text) => LegacyDocument::Text(text),
        Err(err) => {
            log::warn!("unreadable legacy document {}: {err}", path.display());
            LegacyDocument::Unreadable(err.to_string())
        }
    }
}

fn load_theme_dir(dir: &Path) -> BTreeMap<String, LegacyDocument> {
    let mut documents = BTreeMap::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("skipping legacy theme dir {}: {err}", dir.display());
            return documents;
        }
    };
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        if !path.is_file() || !is_html(&path) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            documents.insert(name.to_string(), read_document(&path));
        }
    }
    documents
}

/// Build a dataset from every readable document in the corpus.
///
/// Theme metadata comes from `themes` when given; corpus themes without an
/// entry get a title equal to their id. Metadata for themes the corpus lacks
/// is skipped so the result stays referentially consistent.
pub fn extract_dataset(
    corpus: &LegacyCorpus,
    themes: Option<&BTreeMap<String, ThemeMeta>>,
) -> Dataset {
    let mut dataset = Dataset::new(DEFAULT_EXTRACT_VERSION, today());
    for (theme, documents) in &corpus.themes {
        let cards = documents
            .iter()
            .filter_map(|(filename, document)| match document.text() {
                Some(text) => Some(extract(text, theme, filename)),
                None => {
                    log::warn!("skipping unreadable {theme}/{filename}");
                    None
                }
            })
            .collect();
        let meta = themes
            .and_then(|themes| themes.get(theme))
            .cloned()
            .unwrap_or_else(|| ThemeMeta::titled(theme.clone()));
        dataset.themes.insert(theme.clone(), meta);
        dataset.cards.insert(theme.clone(), cards);
    }
    if let Some(themes) = themes {
        for theme in themes.keys().filter(|id| !corpus.themes.contains_key(*id)) {
            log::warn!("theme '{theme}' has metadata but no legacy documents; skipped");
        }
    }
    dataset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_reads_theme_dirs_and_pages() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        fs::create_dir(dir.path().join("zelda")).expect("theme dir");
        fs::write(
            dir.path().join("zelda").join("korok.html"),
            r#"<div class="word-english">Korok</div>"#,
        )
        .expect("write card");
        fs::write(dir.path().join("zelda").join("notes.txt"), "ignored").expect("write txt");
        fs::write(dir.path().join("index.html"), "<html></html>").expect("write page");

        let corpus = LegacyCorpus::load(dir.path()).expect("corpus loads");
        let zelda = corpus.documents("zelda").expect("zelda theme");
        assert_eq!(zelda.len(), 1);
        assert!(zelda.contains_key("korok.html"));
        assert!(corpus.pages.contains_key("index.html"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let err = LegacyCorpus::load(dir.path().join("absent")).expect_err("no dir");
        assert!(matches!(err, DeckError::Read { .. }));
    }

    #[test]
    fn extract_dataset_uses_supplied_metadata() {
        let mut corpus = LegacyCorpus::default();
        corpus.insert("mario", "kart.html", r#"<div class="word-english">Kart</div>"#);
        corpus.insert("zelda", "ore.html", r#"<div class="word-english">Ore</div>"#);
        let mut themes = BTreeMap::new();
        themes.insert("mario".to_string(), ThemeMeta::titled("Mario Kart World"));

        let dataset = extract_dataset(&corpus, Some(&themes));
        assert_eq!(dataset.version, DEFAULT_EXTRACT_VERSION);
        assert_eq!(dataset.themes["mario"].title.as_deref(), Some("Mario Kart World"));
        assert_eq!(dataset.themes["zelda"].title.as_deref(), Some("zelda"));
        assert_eq!(dataset.cards["zelda"][0].word.as_deref(), Some("Ore"));
    }
}
