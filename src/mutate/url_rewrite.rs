//! Insert the vendor scale token into image URLs that lack it.

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::mutate::{Change, Mutation};
use crate::validate::{Finding, FindingKind};

/// Where and what to insert. Defaults describe the wikia CDN, where
/// `.../revision/latest?cb=N` becomes
/// `.../revision/latest/scale-to-width-down/400?cb=N`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleRule {
    /// Substring identifying URLs the rule applies to.
    pub host_marker: String,
    /// Path segment the token is inserted after.
    pub anchor: String,
    pub token: String,
    /// Presence means the URL is already scaled.
    pub marker: String,
}

impl Default for ScaleRule {
    fn default() -> Self {
        Self {
            host_marker: "wikia.nocookie.net".to_string(),
            anchor: "/revision/latest".to_string(),
            token: "/scale-to-width-down/400".to_string(),
            marker: "scale-to-width-down".to_string(),
        }
    }
}

impl ScaleRule {
    pub fn applies_to(&self, url: &str) -> bool {
        url.contains(&self.host_marker)
    }

    /// Byte offset just past an anchor that ends the path (followed by `?` or end of string).
    fn insertion_point(&self, url: &str) -> Option<usize> {
        if self.anchor.is_empty() {
            return None;
        }
        url.match_indices(&self.anchor)
            .map(|(start, _)| start + self.anchor.len())
            .find(|&end| matches!(url.as_bytes().get(end), None | Some(b'?')))
    }

    pub fn is_unscaled(&self, url: &str) -> bool {
        self.applies_to(url) && !url.contains(&self.marker) && self.insertion_point(url).is_some()
    }

    /// The rewritten URL, or `None` when the rule does not apply or the URL is already scaled.
    pub fn rewrite(&self, url: &str) -> Option<String> {
        if !self.is_unscaled(url) {
            return None;
        }
        let at = self.insertion_point(url)?;
        let mut rewritten = String::with_capacity(url.len() + self.token.len());
        rewritten.push_str(&url[..at]);
        rewritten.push_str(&self.token);
        rewritten.push_str(&url[at..]);
        Some(rewritten)
    }
}

/// Pure single-URL form: unchanged when nothing needs inserting.
pub fn rewrite_image_url(url: &str, rule: &ScaleRule) -> String {
    rule.rewrite(url).unwrap_or_else(|| url.to_string())
}

/// Rewrite the image of every card named by an `UnscaledImageUrl` finding.
/// Other finding kinds are ignored. Running twice with the same targets is a no-op.
pub fn rewrite_image_urls(dataset: Dataset, targets: &[Finding], rule: &ScaleRule) -> Mutation {
    let mut mutation = Mutation::new(dataset);
    for target in targets {
        let FindingKind::UnscaledImageUrl { url } = &target.kind else {
            continue;
        };
        let (Some(theme), Some(filename)) = (target.theme.as_deref(), target.filename.as_deref())
        else {
            continue;
        };
        let Some(cards) = mutation.dataset.cards.get_mut(theme) else {
            log::warn!("rewrite target {theme}/{filename}: theme not in dataset");
            continue;
        };
        for (index, card) in cards.iter_mut().enumerate() {
            if card.label(index) != filename || card.image.as_deref() != Some(url.as_str()) {
                continue;
            }
            if let Some(rewritten) = rule.rewrite(url) {
                log::debug!("{theme}/{filename}: scaled image URL");
                mutation.changes.push(Change {
                    theme: theme.to_string(),
                    filename: Some(filename.to_string()),
                    field: "image".to_string(),
                    before: card.image.replace(rewritten.clone()),
                    after: rewritten,
                });
            }
        }
    }
    log::info!("rewrote {} image URLs", mutation.changes.len());
    mutation.finish()
}
