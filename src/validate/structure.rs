//! Tag and bracket balance for the legacy HTML representation.

use std::sync::LazyLock;

use regex::Regex;

use crate::extract::{LegacyCorpus, LegacyDocument};
use crate::validate::{Finding, FindingKind};

static DIV_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<div[^>]*>").expect("div pattern is valid"));
static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<script[^>]*>(.*?)</script>").expect("script pattern is valid")
});
static DOCTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<!DOCTYPE html>").expect("doctype pattern is valid"));

/// Elements every top-level page must contain. `<head` must not match `<header>`.
static PAGE_ELEMENTS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    ["html", "head", "body"]
        .into_iter()
        .map(|name| {
            let pattern =
                Regex::new(&format!(r"(?i)<{name}[\s>]")).expect("element pattern is valid");
            (name, pattern)
        })
        .collect()
});

/// Check every readable document in the corpus. Pages also get the
/// document-skeleton checks; per-card documents only the balance checks.
pub fn check_structure(corpus: &LegacyCorpus) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (theme, documents) in &corpus.themes {
        for (filename, document) in documents {
            let LegacyDocument::Text(text) = document else {
                continue;
            };
            let file = format!("{theme}/{filename}");
            for kind in document_findings(&file, text) {
                findings.push(Finding::card(theme, filename, kind));
            }
        }
    }
    for (filename, document) in &corpus.pages {
        match document {
            LegacyDocument::Text(text) => {
                let kinds = page_findings(filename, text)
                    .into_iter()
                    .chain(document_findings(filename, text));
                for kind in kinds {
                    findings.push(Finding::new(kind, None, Some(filename.clone())));
                }
            }
            LegacyDocument::Unreadable(reason) => findings.push(Finding::new(
                FindingKind::UnreadableDocument {
                    reason: reason.clone(),
                },
                None,
                Some(filename.clone()),
            )),
        }
    }
    findings
}

/// Balance checks on one document's text.
pub fn document_findings(file: &str, text: &str) -> Vec<FindingKind> {
    let mut kinds = Vec::new();

    let open_divs = DIV_OPEN.find_iter(text).count();
    let close_divs = text.matches("</div>").count();
    if open_divs != close_divs {
        kinds.push(imbalance(file, "<div> tags", open_divs, close_divs));
    }

    for (index, caps) in SCRIPT_BLOCK.captures_iter(text).enumerate() {
        let Some(script) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let block = index + 1;
        let label = format!("{file} script block {block}");
        for (marker, open, close) in [("braces", '{', '}'), ("parentheses", '(', ')')] {
            let open_count = script.matches(open).count();
            let close_count = script.matches(close).count();
            if open_count != close_count {
                kinds.push(imbalance(&label, marker, open_count, close_count));
            }
        }
        if script.contains("await ") && !script.contains("async ") {
            kinds.push(FindingKind::AwaitOutsideAsync {
                file: file.to_string(),
                block,
            });
        }
    }
    kinds
}

fn page_findings(file: &str, text: &str) -> Vec<FindingKind> {
    let mut kinds = Vec::new();
    if !DOCTYPE.is_match(text) {
        kinds.push(missing(file, "<!DOCTYPE html>"));
    }
    for (name, pattern) in PAGE_ELEMENTS.iter() {
        if !pattern.is_match(text) {
            kinds.push(missing(file, &format!("<{name}>")));
        }
    }
    kinds
}

fn imbalance(file: &str, marker: &str, open_count: usize, close_count: usize) -> FindingKind {
    FindingKind::StructuralImbalance {
        file: file.to_string(),
        marker: marker.to_string(),
        open_count,
        close_count,
    }
}

fn missing(file: &str, element: &str) -> FindingKind {
    FindingKind::MissingDocumentElement {
        file: file.to_string(),
        element: element.to_string(),
    }
}
