//! Run the validator battery and present the findings.

mod export;

use std::fmt::Write as _;

use crate::dataset::Dataset;
use crate::extract::LegacyCorpus;
use crate::mutate::ScaleRule;
use crate::validate::{
    check_completeness, check_cross_source, check_image_hints, check_image_urls,
    check_referential, check_structure, check_uniqueness, shared_images, Finding, Severity,
};

pub use export::{findings_csv, write_report};

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub scale_rule: ScaleRule,
    /// Enable the image-filename word lint (info only).
    pub image_hints: bool,
}

/// Findings sorted by theme (dataset-level first), kind, then filename.
#[derive(Debug, Clone, Default)]
pub struct Report {
    findings: Vec<Finding>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl Tally {
    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.infos
    }
}

/// Run every dataset check, plus the legacy checks when a corpus is given.
pub fn run_battery(
    dataset: &Dataset,
    corpus: Option<&LegacyCorpus>,
    options: &ReportOptions,
) -> Report {
    let mut findings = Vec::new();
    findings.extend(check_referential(dataset));
    findings.extend(check_completeness(dataset));
    findings.extend(check_uniqueness(dataset));
    findings.extend(check_image_urls(dataset, &options.scale_rule));
    findings.extend(shared_images(dataset));
    if let Some(corpus) = corpus {
        findings.extend(check_cross_source(dataset, corpus));
        findings.extend(check_structure(corpus));
    }
    if options.image_hints {
        findings.extend(check_image_hints(dataset));
    }
    let report = Report::new(findings);
    log::info!(
        "battery over {} cards: {} findings",
        dataset.card_count(),
        report.len()
    );
    report
}

impl Report {
    pub fn new(findings: Vec<Finding>) -> Self {
        let mut report = Self { findings };
        report.sort();
        report
    }

    fn sort(&mut self) {
        self.findings.sort_by(Finding::report_order);
    }

    /// Add findings from elsewhere (load-time schema violations, mutators).
    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.findings.extend(findings);
        self.sort();
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for finding in &self.findings {
            match finding.severity {
                Severity::Error => tally.errors += 1,
                Severity::Warning => tally.warnings += 1,
                Severity::Info => tally.infos += 1,
            }
        }
        tally
    }

    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(Finding::is_error)
    }

    pub fn exit_code(&self) -> i32 {
        if self.has_errors() {
            1
        } else {
            0
        }
    }

    /// Human-readable rendering, grouped by theme then kind.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let mut current_theme: Option<Option<&str>> = None;
        let mut current_kind: Option<&str> = None;

        for finding in &self.findings {
            let theme = finding.theme.as_deref();
            if current_theme != Some(theme) {
                let _ = writeln!(out, "== {} ==", theme.unwrap_or("dataset"));
                current_theme = Some(theme);
                current_kind = None;
            }
            let kind = finding.kind.name();
            if current_kind != Some(kind) {
                let _ = writeln!(out, "  {kind}");
                current_kind = Some(kind);
            }
            let _ = writeln!(
                out,
                "    [{}] {}: {}",
                finding.severity,
                finding.filename.as_deref().unwrap_or("-"),
                finding.kind.describe()
            );
        }

        let tally = self.tally();
        if !self.findings.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "Total: {} findings ({} errors, {} warnings, {} info)",
            tally.total(),
            tally.errors,
            tally.warnings,
            tally.infos
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Card, ThemeMeta};
    use crate::validate::FindingKind;

    fn complete(theme: &str, filename: &str, word: &str) -> Card {
        let mut card = Card::new(theme, filename);
        card.word = Some(word.into());
        for field in [
            "pronunciation",
            "chinese",
            "definition_en",
            "definition_zh",
            "example_en",
            "example_zh",
            "category",
        ] {
            card.set_field(field, format!("{word} {field}"));
        }
        card.image = Some(format!("https://img.example.com/{theme}/{word}.png"));
        card
    }

    #[test]
    fn clean_dataset_exits_zero() {
        let mut dataset = Dataset::new("1.0.0", "2025-10-24");
        dataset.themes.insert("mario".into(), ThemeMeta::titled("Mario"));
        dataset
            .cards
            .insert("mario".into(), vec![complete("mario", "kart.html", "Kart")]);
        let report = run_battery(&dataset, None, &ReportOptions::default());
        assert!(report.is_empty());
        assert_eq!(report.exit_code(), 0);
        assert!(report
            .render_text()
            .contains("Total: 0 findings (0 errors, 0 warnings, 0 info)"));
    }

    #[test]
    fn warnings_alone_do_not_fail() {
        let report = Report::new(vec![Finding::card(
            "zelda",
            "cooking.html",
            FindingKind::WordMismatch {
                expected: "cooking".into(),
                actual: Some("Cooking".into()),
            },
        )]);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.tally().warnings, 1);
    }

    #[test]
    fn text_groups_by_theme_then_kind() {
        let report = Report::new(vec![
            Finding::card(
                "zelda",
                "ore.html",
                FindingKind::MissingField {
                    field: "chinese".into(),
                },
            ),
            Finding::theme("hayday", FindingKind::OrphanCardList),
            Finding::card(
                "zelda",
                "korok.html",
                FindingKind::MissingField {
                    field: "image".into(),
                },
            ),
        ]);
        let text = report.render_text();
        let hayday = text.find("== hayday ==").expect("hayday group");
        let zelda = text.find("== zelda ==").expect("zelda group");
        assert!(hayday < zelda);
        assert_eq!(text.matches("  MissingField\n").count(), 1);
        assert!(text.find("korok.html").expect("korok") < text.find("ore.html").expect("ore"));
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn image_hints_are_opt_in() {
        let mut dataset = Dataset::new("1.0.0", "2025-10-24");
        dataset.themes.insert("zelda".into(), ThemeMeta::titled("Zelda"));
        let mut card = complete("zelda", "cooking.html", "Cooking");
        card.image = Some("https://cdn.wikimg.net/images/BotW_Hyrule_Day_Artwork.jpg".into());
        dataset.cards.insert("zelda".into(), vec![card]);

        assert!(run_battery(&dataset, None, &ReportOptions::default()).is_empty());
        let options = ReportOptions {
            image_hints: true,
            ..ReportOptions::default()
        };
        let report = run_battery(&dataset, None, &options);
        assert_eq!(report.len(), 1);
        assert_eq!(report.exit_code(), 0);
    }
}
