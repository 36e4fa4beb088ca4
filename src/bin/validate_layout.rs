//! Check a split card layout: config.json, themes.json and cards/*.json agree.
//! Run: cargo run --bin validate_layout -- [DIR]

use std::path::PathBuf;

use vocabdeck::mutate::check_layout;
use vocabdeck::report::Report;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("cards-data"));
    if !dir.is_dir() {
        eprintln!("Layout directory not found: {}", dir.display());
        eprintln!("Create it first: vocabdeck split");
        std::process::exit(1);
    }

    let report = Report::new(check_layout(&dir));
    print!("{}", report.render_text());
    std::process::exit(report.exit_code());
}
