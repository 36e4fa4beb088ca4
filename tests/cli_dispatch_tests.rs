use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::TempDir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_vocabdeck")
}

fn vocabdeck(args: &[&str]) -> Output {
    Command::new(bin())
        .args(args)
        .env_remove("VOCABDECK_DATASET")
        .env_remove("VOCABDECK_LEGACY_DIR")
        .env_remove("VOCABDECK_REPORT")
        .output()
        .expect("vocabdeck should run")
}

fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn card(theme: &str, filename: &str, word: &str, image: &str) -> Value {
    json!({
        "theme": theme,
        "filename": filename,
        "word": word,
        "pronunciation": "/x/",
        "chinese": format!("{word}-zh"),
        "definition_en": "def",
        "definition_zh": "定义",
        "example_en": "example",
        "example_zh": "例子",
        "category": "Items",
        "image": image
    })
}

fn write_dataset(dir: &Path, cards: Value, themes: Value) -> PathBuf {
    let path = dir.join("cards-data.json");
    let value = json!({
        "version": "1.0.0",
        "updated": "2025-10-24",
        "themes": themes,
        "cards": cards
    });
    fs::write(&path, serde_json::to_string_pretty(&value).expect("serialize"))
        .expect("fixture should be written");
    path
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("file should exist")).expect("json")
}

const UNSCALED: &str =
    "https://static.wikia.nocookie.net/hayday/images/e/e2/Wheat.png/revision/latest?cb=20240218150024";

#[test]
fn missing_command_is_usage_error() {
    let output = vocabdeck(&[]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"));
}

#[test]
fn validate_reports_errors_and_writes_json() {
    let dir = TempDir::new().expect("tempdir");
    let mut broken = card("mario", "kart.html", "Kart", "https://img.example.com/kart.png");
    broken["chinese"] = json!("");
    let path = write_dataset(
        dir.path(),
        json!({"mario": [broken]}),
        json!({"mario": {"title": "Mario"}}),
    );
    let report = dir.path().join("report.json");

    let output = vocabdeck(&["validate", &arg(&path), "--report", &arg(&report)]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("== mario =="));
    assert!(stdout.contains("MissingField"));
    assert!(stdout.contains("Total: 1 findings (1 errors, 0 warnings, 0 info)"));

    let rows = read_json(&report);
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    assert_eq!(rows[0]["detail"]["field"], "chinese");
}

#[test]
fn validate_clean_dataset_exits_zero_with_csv_report() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_dataset(
        dir.path(),
        json!({"hayday": [card("hayday", "wheat.html", "Wheat", UNSCALED)]}),
        json!({"hayday": {"title": "Hay Day Farm"}}),
    );
    let report = dir.path().join("report.csv");

    let output = vocabdeck(&["validate", &arg(&path), "--report", &arg(&report)]);
    assert_eq!(output.status.code(), Some(0));
    let csv = fs::read_to_string(&report).expect("csv written");
    assert!(csv.contains("hayday,wheat.html,UnscaledImageUrl,warning"));
}

#[test]
fn validate_missing_dataset_fails() {
    let dir = TempDir::new().expect("tempdir");
    let output = vocabdeck(&["validate", &arg(&dir.path().join("absent.json"))]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("malformed dataset"));
}

#[test]
fn dataset_path_can_come_from_environment() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_dataset(
        dir.path(),
        json!({"mario": [card("mario", "kart.html", "Kart", "https://img.example.com/kart.png")]}),
        json!({"mario": {"title": "Mario"}}),
    );
    let output = Command::new(bin())
        .arg("validate")
        .env("VOCABDECK_DATASET", &path)
        .env_remove("VOCABDECK_LEGACY_DIR")
        .env_remove("VOCABDECK_REPORT")
        .output()
        .expect("vocabdeck should run");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn rewrite_urls_second_run_changes_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_dataset(
        dir.path(),
        json!({"hayday": [card("hayday", "wheat.html", "Wheat", UNSCALED)]}),
        json!({"hayday": {"title": "Hay Day Farm"}}),
    );

    let first = vocabdeck(&["rewrite-urls", &arg(&path)]);
    assert_eq!(first.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&first.stdout).contains("1 changes"));
    let after_first = fs::read_to_string(&path).expect("read");
    assert!(after_first.contains("/revision/latest/scale-to-width-down/400?cb="));

    let second = vocabdeck(&["rewrite-urls", &arg(&path)]);
    assert_eq!(second.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&second.stdout).contains("0 changes"));
    assert_eq!(fs::read_to_string(&path).expect("read"), after_first);
}

#[test]
fn rewrite_urls_leaves_schema_invalid_file_untouched() {
    let dir = TempDir::new().expect("tempdir");
    let mut wheat = card("hayday", "wheat.html", "Wheat", UNSCALED);
    wheat["category"] = json!(5);
    let path = write_dataset(
        dir.path(),
        json!({"hayday": [wheat, "stray note"], "mario": {"kart": "not a list"}}),
        json!({"hayday": {"title": "Hay Day Farm"}, "mario": "oops"}),
    );
    let before = fs::read_to_string(&path).expect("read");

    let refused = vocabdeck(&["rewrite-urls", &arg(&path)]);
    assert_eq!(refused.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&refused.stdout);
    assert!(stdout.contains("schema violations"));
    assert!(stdout.contains("no changes written"));
    assert_eq!(fs::read_to_string(&path).expect("read"), before);

    let forced = vocabdeck(&["rewrite-urls", &arg(&path), "--allow-overwrite"]);
    assert_eq!(forced.status.code(), Some(0));
    assert!(fs::read_to_string(&path)
        .expect("read")
        .contains("scale-to-width-down/400"));
}

#[test]
fn backfill_from_yaml_table() {
    let dir = TempDir::new().expect("tempdir");
    let mut wheat = card("hayday", "wheat.html", "Wheat", "https://img.example.com/wheat.png");
    wheat.as_object_mut().expect("object").remove("chinese");
    let path = write_dataset(
        dir.path(),
        json!({"hayday": [wheat]}),
        json!({"hayday": {"title": "Hay Day Farm"}}),
    );
    let table = dir.path().join("fixes.yml");
    fs::write(&table, "match_on: word\nentries:\n  Wheat:\n    chinese: 小麦\n").expect("table");

    let output = vocabdeck(&["backfill", &arg(&table), &arg(&path)]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(read_json(&path)["cards"]["hayday"][0]["chinese"], "小麦");
}

#[test]
fn merge_refuses_existing_theme_without_flag() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_dataset(
        dir.path(),
        json!({"hayday": []}),
        json!({"hayday": {"title": "Hay Day Farm"}}),
    );
    let before = fs::read_to_string(&path).expect("read");
    let theme_file = dir.path().join("hayday.json");
    fs::write(
        &theme_file,
        json!({
            "total_count": 1,
            "cards": [{"filename": "wheat.html", "word": "Wheat"}]
        })
        .to_string(),
    )
    .expect("theme file");

    let refused = vocabdeck(&["merge", &arg(&theme_file), &arg(&path)]);
    assert_eq!(refused.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&refused.stdout).contains("merge refused"));
    assert_eq!(fs::read_to_string(&path).expect("read"), before);

    let merged = vocabdeck(&["merge", &arg(&theme_file), &arg(&path), "--allow-overwrite"]);
    assert_eq!(merged.status.code(), Some(0));
    let value = read_json(&path);
    assert_eq!(value["cards"]["hayday"][0]["theme"], "hayday");
    assert_eq!(value["themes"]["hayday"]["title"], "hayday");
}

#[test]
fn split_then_join_restores_dataset() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_dataset(
        dir.path(),
        json!({
            "mario": [card("mario", "kart.html", "Kart", "https://img.example.com/kart.png")],
            "zelda": [card("zelda", "korok.html", "Korok", "https://img.example.com/korok.png")]
        }),
        json!({"mario": {"title": "Mario"}, "zelda": {"title": "Zelda"}}),
    );
    let layout = dir.path().join("layout");

    let split = vocabdeck(&["split", &arg(&path), "--out", &arg(&layout)]);
    assert_eq!(split.status.code(), Some(0));
    let config = read_json(&layout.join("config.json"));
    assert_eq!(config["version"], "2.0");
    assert_eq!(read_json(&layout.join("cards").join("zelda.json"))["total_count"], 1);

    let checked = Command::new(env!("CARGO_BIN_EXE_validate_layout"))
        .arg(&layout)
        .output()
        .expect("validate_layout should run");
    assert_eq!(checked.status.code(), Some(0));

    let joined = dir.path().join("joined.json");
    let join = vocabdeck(&["join", &arg(&layout), "--out", &arg(&joined)]);
    assert_eq!(join.status.code(), Some(0));
    assert_eq!(read_json(&joined), read_json(&path));
}

#[test]
fn validate_layout_flags_orphan_card_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_dataset(
        dir.path(),
        json!({"mario": [card("mario", "kart.html", "Kart", "https://img.example.com/kart.png")]}),
        json!({"mario": {"title": "Mario"}}),
    );
    let layout = dir.path().join("layout");
    assert_eq!(
        vocabdeck(&["split", &arg(&path), "--out", &arg(&layout)]).status.code(),
        Some(0)
    );
    fs::write(
        layout.join("cards").join("extra.json"),
        r#"{"theme": "extra", "theme_name": "Extra", "total_count": 0, "cards": []}"#,
    )
    .expect("orphan file");

    let checked = Command::new(env!("CARGO_BIN_EXE_validate_layout"))
        .arg(&layout)
        .output()
        .expect("validate_layout should run");
    assert_eq!(checked.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&checked.stdout).contains("OrphanCardList"));
}

#[test]
fn extract_builds_dataset_and_refuses_overwrite() {
    let dir = TempDir::new().expect("tempdir");
    let legacy = dir.path().join("legacy");
    fs::create_dir_all(legacy.join("zelda")).expect("legacy dir");
    fs::write(
        legacy.join("zelda").join("korok.html"),
        r#"<div class="word-english">Korok</div><div class="word-chinese">克洛格</div>"#,
    )
    .expect("legacy card");
    let themes = dir.path().join("themes.json");
    fs::write(&themes, r#"{"themes": {"zelda": {"title": "The Legend of Zelda"}}}"#)
        .expect("themes");
    let out = dir.path().join("extracted.json");

    let first = vocabdeck(&[
        "extract",
        &arg(&legacy),
        "--themes",
        &arg(&themes),
        "--out",
        &arg(&out),
    ]);
    assert_eq!(first.status.code(), Some(0));
    let value = read_json(&out);
    assert_eq!(value["cards"]["zelda"][0]["word"], "Korok");
    assert_eq!(value["themes"]["zelda"]["title"], "The Legend of Zelda");

    let second = vocabdeck(&["extract", &arg(&legacy), "--out", &arg(&out)]);
    assert_eq!(second.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&second.stderr).contains("--allow-overwrite"));
}
