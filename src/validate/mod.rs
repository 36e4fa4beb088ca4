//! The validation battery. Every check is a pure function returning findings.

mod completeness;
mod cross_source;
mod finding;
mod image_hint;
mod image_url;
mod referential;
mod schema;
mod structure;
mod uniqueness;

pub use completeness::check_completeness;
pub use cross_source::check_cross_source;
pub use finding::{Finding, FindingKind, Severity};
pub use image_hint::{check_image_hints, word_from_image_url};
pub use image_url::{check_image_urls, is_absolute_http_url, shared_images};
pub use referential::check_referential;
pub use schema::validate_schema;
pub use structure::{check_structure, document_findings};
pub use uniqueness::check_uniqueness;
