//! Run configuration: defaults, then an optional YAML/JSON file, then
//! environment variables. CLI arguments are applied last by the caller.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::DEFAULT_DATASET_PATH;
use crate::error::DeckError;
use crate::mutate::ScaleRule;
use crate::report::ReportOptions;

pub const ENV_DATASET: &str = "VOCABDECK_DATASET";
pub const ENV_LEGACY_DIR: &str = "VOCABDECK_LEGACY_DIR";
pub const ENV_REPORT: &str = "VOCABDECK_REPORT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub dataset_path: PathBuf,
    pub legacy_source_dir: Option<PathBuf>,
    /// `.csv` gets a CSV report, anything else JSON.
    pub report_output_path: Option<PathBuf>,
    pub allow_overwrite: bool,
    pub image_hints: bool,
    pub scale_rule: ScaleRule,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            legacy_source_dir: None,
            report_output_path: None,
            allow_overwrite: false,
            image_hints: false,
            scale_rule: ScaleRule::default(),
        }
    }
}

impl RunConfig {
    /// Load from `path`; `.yaml`/`.yml` is YAML, anything else JSON.
    /// Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DeckError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| DeckError::read(path, err))?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        let parsed: Result<Self, String> = if is_yaml {
            serde_yaml::from_str(&raw).map_err(|err| err.to_string())
        } else {
            serde_json::from_str(&raw).map_err(|err| err.to_string())
        };
        let config = parsed.map_err(|err| DeckError::Config(format!("{}: {err}", path.display())))?;
        log::info!("loaded config {}", path.display());
        Ok(config)
    }

    /// Defaults or `config_file`, then the process environment.
    pub fn resolve(config_file: Option<&Path>) -> Result<Self, DeckError> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override paths from `lookup`. Empty values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(path) = var(ENV_DATASET) {
            log::debug!("{ENV_DATASET}={path}");
            self.dataset_path = PathBuf::from(path);
        }
        if let Some(path) = var(ENV_LEGACY_DIR) {
            self.legacy_source_dir = Some(PathBuf::from(path));
        }
        if let Some(path) = var(ENV_REPORT) {
            self.report_output_path = Some(PathBuf::from(path));
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            scale_rule: self.scale_rule.clone(),
            image_hints: self.image_hints,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_point_at_cards_data() {
        let config = RunConfig::default();
        assert_eq!(config.dataset_path, PathBuf::from("cards-data.json"));
        assert!(!config.allow_overwrite);
        assert_eq!(config.scale_rule.token, "/scale-to-width-down/400");
    }

    #[test]
    fn yaml_file_overrides_only_given_keys() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("vocabdeck.yaml");
        fs::write(
            &path,
            "dataset_path: data/cards.json\nimage_hints: true\nscale_rule:\n  token: /scale-to-width-down/200\n",
        )
        .expect("write config");
        let config = RunConfig::from_file(&path).expect("config loads");
        assert_eq!(config.dataset_path, PathBuf::from("data/cards.json"));
        assert!(config.image_hints);
        assert_eq!(config.scale_rule.token, "/scale-to-width-down/200");
        assert_eq!(config.scale_rule.anchor, "/revision/latest");
    }

    #[test]
    fn unknown_shape_is_config_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("vocabdeck.json");
        fs::write(&path, r#"{"allow_overwrite": "yes"}"#).expect("write config");
        let err = RunConfig::from_file(&path).expect_err("bad config");
        assert!(matches!(err, DeckError::Config(_)));
    }

    #[test]
    fn environment_overrides_paths() {
        let env: HashMap<&str, &str> = [
            (ENV_DATASET, "other.json"),
            (ENV_LEGACY_DIR, "legacy"),
            (ENV_REPORT, ""),
        ]
        .into_iter()
        .collect();
        let mut config = RunConfig::default();
        config.apply_env_with(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.dataset_path, PathBuf::from("other.json"));
        assert_eq!(config.legacy_source_dir, Some(PathBuf::from("legacy")));
        assert_eq!(config.report_output_path, None);
    }
}
