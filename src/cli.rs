use std::fs;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::config::RunConfig;
use crate::dataset::{load_dataset, save_dataset, Dataset, LoadedDataset, ThemeMeta};
use crate::error::DeckError;
use crate::extract::{extract_dataset, LegacyCorpus};
use crate::mutate::{
    backfill, join, load_backfill_table, load_theme_file, merge_theme, rewrite_image_urls, split,
    Mutation, SplitLayout,
};
use crate::report::{run_battery, write_report};
use crate::validate::check_image_urls;

/// Default directory name for `split` output, beside the dataset file.
const DEFAULT_SPLIT_DIR: &str = "cards-data";

#[derive(Debug, Parser)]
#[command(name = "vocabdeck")]
#[command(about = "Build, validate and patch a vocabulary card dataset", long_about = None)]
pub struct Cli {
    /// YAML or JSON run configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log progress (info level) to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every consistency check and print a report
    Validate {
        dataset: Option<PathBuf>,

        /// Legacy per-card HTML directory to cross-check against
        #[arg(long)]
        legacy: Option<PathBuf>,

        /// Also write findings here (JSON, or CSV for a .csv path)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Guess words from image file names (info only)
        #[arg(long)]
        image_hints: bool,
    },

    /// Build a dataset from legacy per-card HTML documents
    Extract {
        legacy_dir: PathBuf,

        /// Theme metadata JSON ({"themes": {...}} or a bare map)
        #[arg(long)]
        themes: Option<PathBuf>,

        #[arg(long)]
        out: Option<PathBuf>,

        /// Replace an existing output file
        #[arg(long)]
        allow_overwrite: bool,
    },

    /// Fill missing card fields from a JSON/YAML table
    Backfill {
        table: PathBuf,
        dataset: Option<PathBuf>,

        /// Save even though schema violations drop values from the file
        #[arg(long)]
        allow_overwrite: bool,
    },

    /// Insert the scale token into unscaled vendor image URLs
    RewriteUrls {
        dataset: Option<PathBuf>,

        /// Save even though schema violations drop values from the file
        #[arg(long)]
        allow_overwrite: bool,
    },

    /// Add one theme's cards (and metadata) to the dataset
    Merge {
        theme_file: PathBuf,
        dataset: Option<PathBuf>,

        /// Theme metadata JSON; defaults to a title from the theme file
        #[arg(long)]
        meta: Option<PathBuf>,

        /// Theme id; defaults to the file's "theme" key or its stem
        #[arg(long)]
        theme: Option<String>,

        /// Replace an existing theme, and save despite schema violations
        #[arg(long)]
        allow_overwrite: bool,
    },

    /// Write the per-theme split layout
    Split {
        dataset: Option<PathBuf>,

        #[arg(long)]
        out: Option<PathBuf>,

        /// Write even though schema violations drop values from the layout
        #[arg(long)]
        allow_overwrite: bool,
    },

    /// Rebuild the dataset file from a split layout
    Join {
        dir: PathBuf,

        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Parse `args` (including the program name) and run. Returns the exit code:
/// 0 success, 1 error findings or failure, 2 usage error.
pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 2,
            };
        }
    };
    init_logging(cli.verbose);

    let config = match RunConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    match run(cli.command, config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .try_init();
}

fn run(command: Command, mut config: RunConfig) -> Result<i32, DeckError> {
    match command {
        Command::Validate {
            dataset,
            legacy,
            report,
            image_hints,
        } => {
            if let Some(path) = dataset {
                config.dataset_path = path;
            }
            if legacy.is_some() {
                config.legacy_source_dir = legacy;
            }
            if report.is_some() {
                config.report_output_path = report;
            }
            config.image_hints |= image_hints;
            handle_validate(&config)
        }
        Command::Extract {
            legacy_dir,
            themes,
            out,
            allow_overwrite,
        } => {
            config.allow_overwrite |= allow_overwrite;
            let out = out.unwrap_or_else(|| config.dataset_path.clone());
            handle_extract(&legacy_dir, themes.as_deref(), &out, config.allow_overwrite)
        }
        Command::Backfill {
            table,
            dataset,
            allow_overwrite,
        } => {
            let lossy_ok = config.allow_overwrite || allow_overwrite;
            let path = dataset.unwrap_or(config.dataset_path);
            let table = load_backfill_table(&table)?;
            mutate_in_place(&path, lossy_ok, |dataset| backfill(dataset, &table))
        }
        Command::RewriteUrls {
            dataset,
            allow_overwrite,
        } => {
            let lossy_ok = config.allow_overwrite || allow_overwrite;
            let path = dataset.unwrap_or_else(|| config.dataset_path.clone());
            let rule = config.scale_rule;
            mutate_in_place(&path, lossy_ok, |dataset| {
                let targets = check_image_urls(&dataset, &rule);
                rewrite_image_urls(dataset, &targets, &rule)
            })
        }
        Command::Merge {
            theme_file,
            dataset,
            meta,
            theme,
            allow_overwrite,
        } => {
            let path = dataset.unwrap_or_else(|| config.dataset_path.clone());
            let file = load_theme_file(&theme_file)?;
            let Some(theme_id) = theme.or_else(|| file.theme_id(&theme_file)) else {
                eprintln!("cannot determine theme id for {}; pass --theme", theme_file.display());
                return Ok(2);
            };
            let meta = match meta {
                Some(meta_path) => read_theme_meta(&meta_path)?,
                None => file.default_meta(&theme_id),
            };
            let overwrite = config.allow_overwrite || allow_overwrite;
            mutate_in_place(&path, overwrite, |dataset| {
                merge_theme(dataset, &theme_id, meta, file.cards, overwrite)
            })
        }
        Command::Split {
            dataset,
            out,
            allow_overwrite,
        } => {
            let lossy_ok = config.allow_overwrite || allow_overwrite;
            let path = dataset.unwrap_or(config.dataset_path);
            let out = out.unwrap_or_else(|| default_split_dir(&path));
            let Some(loaded) = load_checked(&path, lossy_ok)? else {
                return Ok(1);
            };
            split(&loaded.dataset).write(&out)?;
            println!(
                "split {} themes into {}",
                loaded.dataset.cards.len(),
                out.display()
            );
            Ok(0)
        }
        Command::Join { dir, out } => {
            let out = out.unwrap_or(config.dataset_path);
            let dataset = join(&SplitLayout::read(&dir)?);
            save_dataset(&dataset, &out)?;
            println!(
                "joined {} cards from {} into {}",
                dataset.card_count(),
                dir.display(),
                out.display()
            );
            Ok(0)
        }
    }
}

fn handle_validate(config: &RunConfig) -> Result<i32, DeckError> {
    let loaded = load_dataset(&config.dataset_path)?;
    let corpus = config
        .legacy_source_dir
        .as_ref()
        .map(LegacyCorpus::load)
        .transpose()?;

    let mut report = run_battery(&loaded.dataset, corpus.as_ref(), &config.report_options());
    report.extend(loaded.violations);
    print!("{}", report.render_text());

    if let Some(path) = &config.report_output_path {
        write_report(path, report.findings())?;
    }
    Ok(report.exit_code())
}

fn handle_extract(
    legacy_dir: &Path,
    themes: Option<&Path>,
    out: &Path,
    allow_overwrite: bool,
) -> Result<i32, DeckError> {
    if out.exists() && !allow_overwrite {
        eprintln!(
            "refusing to overwrite {}; pass --allow-overwrite",
            out.display()
        );
        return Ok(1);
    }
    let corpus = LegacyCorpus::load(legacy_dir)?;
    let themes = themes.map(read_theme_map).transpose()?;
    let dataset = extract_dataset(&corpus, themes.as_ref());
    save_dataset(&dataset, out)?;
    println!(
        "extracted {} cards in {} themes into {}",
        dataset.card_count(),
        dataset.cards.len(),
        out.display()
    );
    Ok(0)
}

/// Load, apply `mutate`, save when something changed. Exit 1 when the
/// mutator refused with an error finding, or when the file has schema
/// violations and `lossy_ok` is not set.
fn mutate_in_place(
    path: &Path,
    lossy_ok: bool,
    mutate: impl FnOnce(Dataset) -> Mutation,
) -> Result<i32, DeckError> {
    let Some(loaded) = load_checked(path, lossy_ok)? else {
        return Ok(1);
    };
    let mutation = mutate(loaded.dataset);
    for change in &mutation.changes {
        println!("{change}");
    }
    for finding in &mutation.findings {
        println!("{finding}");
    }
    if mutation.has_errors() {
        println!("no changes written");
        return Ok(1);
    }
    if mutation.is_changed() {
        save_dataset(&mutation.dataset, path)?;
    }
    println!("{} changes", mutation.changes.len());
    Ok(0)
}

/// Load for rewriting. Values that violate the schema are not held by the
/// typed model and would vanish on save, so the violations are printed and
/// `None` is returned unless `lossy_ok` is set.
fn load_checked(path: &Path, lossy_ok: bool) -> Result<Option<LoadedDataset>, DeckError> {
    let loaded = load_dataset(path)?;
    if loaded.violations.is_empty() {
        return Ok(Some(loaded));
    }
    for finding in &loaded.violations {
        println!("{finding}");
    }
    if !lossy_ok {
        println!(
            "{} has {} schema violations that saving would drop; no changes written \
             (pass --allow-overwrite to save anyway)",
            path.display(),
            loaded.violations.len()
        );
        return Ok(None);
    }
    log::warn!(
        "{}: saving despite {} schema violations",
        path.display(),
        loaded.violations.len()
    );
    Ok(Some(loaded))
}

fn default_split_dir(dataset_path: &Path) -> PathBuf {
    match dataset_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(DEFAULT_SPLIT_DIR),
        _ => PathBuf::from(DEFAULT_SPLIT_DIR),
    }
}

fn read_json_value(path: &Path) -> Result<Value, DeckError> {
    let raw = fs::read_to_string(path).map_err(|err| DeckError::read(path, err))?;
    serde_json::from_str(&raw).map_err(|err| DeckError::malformed(path, err.to_string()))
}

fn read_theme_meta(path: &Path) -> Result<ThemeMeta, DeckError> {
    let value = read_json_value(path)?;
    serde_json::from_value(value).map_err(|err| DeckError::malformed(path, err.to_string()))
}

/// Accepts `{"themes": {...}}` (the split layout's themes.json) or a bare map.
fn read_theme_map(
    path: &Path,
) -> Result<std::collections::BTreeMap<String, ThemeMeta>, DeckError> {
    let value = match read_json_value(path)? {
        Value::Object(mut map) if map.get("themes").is_some_and(Value::is_object) => {
            map.remove("themes").unwrap_or_default()
        }
        other => other,
    };
    serde_json::from_value(value).map_err(|err| DeckError::malformed(path, err.to_string()))
}
