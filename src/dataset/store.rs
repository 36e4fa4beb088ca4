//! Reading and persisting datasets. Every write goes through [write_atomic].

use std::fs;
use std::io::Write as _;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::dataset::card::{Dataset, CARD_STRING_FIELDS};
use crate::error::DeckError;
use crate::validate::{validate_schema, Finding, FindingKind};

/// A dataset plus the recoverable schema violations found while loading it.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub violations: Vec<Finding>,
}

/// Read and parse a dataset file.
///
/// Fails with [DeckError::MalformedDataset] when the file is missing, is not
/// JSON, or lacks the top-level structure. Type errors inside cards are kept
/// as `SchemaViolation` findings and the offending values are dropped from
/// the typed model.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<LoadedDataset, DeckError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|err| DeckError::malformed(path, err.to_string()))?;
    let loaded = parse_dataset_str(&raw, path)?;
    log::info!(
        "loaded {} ({} themes, {} cards, {} schema violations)",
        path.display(),
        loaded.dataset.theme_ids().len(),
        loaded.dataset.card_count(),
        loaded.violations.len()
    );
    Ok(loaded)
}

/// Parse dataset JSON text. `origin` is only used in error messages.
pub fn parse_dataset_str(raw: &str, origin: &Path) -> Result<LoadedDataset, DeckError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| DeckError::malformed(origin, err.to_string()))?;
    dataset_from_value(value, origin)
}

pub fn dataset_from_value(mut value: Value, origin: &Path) -> Result<LoadedDataset, DeckError> {
    let violations = validate_schema(&value);
    if let Some(fatal) = violations
        .iter()
        .find(|finding| matches!(finding.kind, FindingKind::MalformedDataset { .. }))
    {
        return Err(DeckError::malformed(origin, fatal.kind.describe()));
    }

    sanitize_for_model(&mut value);
    let dataset: Dataset =
        serde_json::from_value(value).map_err(|err| DeckError::malformed(origin, err.to_string()))?;
    Ok(LoadedDataset {
        dataset,
        violations,
    })
}

/// Drop values the typed model cannot hold. Schema validation has already reported them.
fn sanitize_for_model(value: &mut Value) {
    let Some(root) = value.as_object_mut() else {
        return;
    };
    for key in ["version", "updated"] {
        if root.get(key).is_some_and(|v| !v.is_string()) {
            root.remove(key);
        }
    }
    if let Some(themes) = root.get_mut("themes").and_then(Value::as_object_mut) {
        themes.retain(|_, meta| meta.is_object());
        for meta in themes.values_mut().filter_map(Value::as_object_mut) {
            for key in ["icon", "title", "subtitle", "theme_color", "layout", "badge_text"] {
                if meta.get(key).is_some_and(|v| !v.is_string()) {
                    meta.remove(key);
                }
            }
            if meta.get("show_header").is_some_and(|v| !v.is_boolean()) {
                meta.remove("show_header");
            }
        }
    }
    if let Some(cards) = root.get_mut("cards").and_then(Value::as_object_mut) {
        for list in cards.values_mut() {
            if !list.is_array() {
                *list = Value::Array(Vec::new());
            }
            if let Some(items) = list.as_array_mut() {
                items.retain(Value::is_object);
                for card in items.iter_mut().filter_map(Value::as_object_mut) {
                    for field in CARD_STRING_FIELDS {
                        if card.get(*field).is_some_and(|v| !v.is_string()) {
                            card.remove(*field);
                        }
                    }
                }
            }
        }
    }
}

/// Serialize as pretty JSON and write atomically.
pub fn save_dataset(dataset: &Dataset, path: impl AsRef<Path>) -> Result<(), DeckError> {
    let path = path.as_ref();
    write_json_atomic(path, dataset)?;
    log::info!(
        "wrote {} ({} cards)",
        path.display(),
        dataset.card_count()
    );
    Ok(())
}

pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), DeckError> {
    let mut serialized = serde_json::to_string_pretty(value)?;
    serialized.push('\n');
    write_atomic(path, serialized.as_bytes())
}

/// Write to a hidden temp file beside `path`, fsync, then rename over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DeckError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| DeckError::write(parent, err))?;
    let tmp = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name().and_then(|s| s.to_str()).unwrap_or("file"),
        std::process::id()
    ));
    {
        let mut file = fs::File::create(&tmp).map_err(|err| DeckError::write(&tmp, err))?;
        file.write_all(bytes).map_err(|err| DeckError::write(&tmp, err))?;
        file.sync_all().map_err(|err| DeckError::write(&tmp, err))?;
    }
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(DeckError::write(path, err));
    }
    if let Ok(dir) = fs::File::open(parent) {
        let _ = dir.sync_all();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn non_json_input_is_malformed() {
        let err = parse_dataset_str("const cardsData = {};", Path::new("x.json"))
            .expect_err("not JSON");
        assert!(matches!(err, DeckError::MalformedDataset { .. }));
    }

    #[test]
    fn top_level_array_is_malformed() {
        let err = parse_dataset_str("[]", Path::new("x.json")).expect_err("wrong shape");
        assert!(matches!(err, DeckError::MalformedDataset { .. }));
    }

    #[test]
    fn wrongly_typed_card_field_is_reported_and_dropped() {
        let raw = r#"{
            "version": "1.0.0",
            "updated": "2025-10-24",
            "themes": {"mario": {"title": "Mario"}},
            "cards": {"mario": [{"theme": "mario", "filename": "kart.html", "word": 7}]}
        }"#;
        let loaded = parse_dataset_str(raw, Path::new("x.json")).expect("recoverable");
        assert_eq!(loaded.violations.len(), 1);
        assert_eq!(loaded.dataset.cards["mario"][0].word, None);
    }

    #[test]
    fn atomic_write_replaces_target_and_leaves_no_temp_file() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let target = dir.path().join("cards-data.json");
        write_atomic(&target, b"old").expect("first write");
        write_atomic(&target, b"new").expect("second write");
        assert_eq!(fs::read_to_string(&target).expect("read back"), "new");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .expect("list dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }
}
