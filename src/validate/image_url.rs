use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::dataset::Dataset;
use crate::mutate::ScaleRule;
use crate::validate::{Finding, FindingKind};

static ABSOLUTE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[A-Za-z0-9](?:[A-Za-z0-9.-]*[A-Za-z0-9])?(?::\d+)?(?:[/?#]\S*)?$")
        .expect("absolute URL pattern is valid")
});

pub fn is_absolute_http_url(url: &str) -> bool {
    ABSOLUTE_URL.is_match(url)
}

/// Shape of every present image URL, plus the scale token for vendor URLs.
/// Absent or blank images are left to the completeness check.
pub fn check_image_urls(dataset: &Dataset, rule: &ScaleRule) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (theme, cards) in &dataset.cards {
        for (index, card) in cards.iter().enumerate() {
            let Some(url) = card.image.as_deref().filter(|url| !url.trim().is_empty()) else {
                continue;
            };
            if !is_absolute_http_url(url) {
                findings.push(Finding::card(
                    theme,
                    card.label(index),
                    FindingKind::InvalidImageUrl {
                        url: url.to_string(),
                    },
                ));
            } else if rule.is_unscaled(url) {
                findings.push(Finding::card(
                    theme,
                    card.label(index),
                    FindingKind::UnscaledImageUrl {
                        url: url.to_string(),
                    },
                ));
            }
        }
    }
    findings
}

/// Image URLs used by two or more cards. Noted for review, never an error.
pub fn shared_images(dataset: &Dataset) -> Vec<Finding> {
    let mut users: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (theme, cards) in &dataset.cards {
        for (index, card) in cards.iter().enumerate() {
            if let Some(url) = card.image.as_deref().filter(|url| !url.trim().is_empty()) {
                users
                    .entry(url)
                    .or_default()
                    .push(format!("{theme}/{}", card.label(index)));
            }
        }
    }
    users
        .into_iter()
        .filter(|(_, used_by)| used_by.len() > 1)
        .map(|(url, used_by)| {
            Finding::dataset(FindingKind::SharedImageUrl {
                url: url.to_string(),
                used_by,
            })
        })
        .collect()
}
