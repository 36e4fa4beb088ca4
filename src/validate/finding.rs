use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a validator or mutator found. Serialized as `{"kind": ..., "detail": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum FindingKind {
    MalformedDataset {
        reason: String,
    },
    SchemaViolation {
        field: String,
        problem: String,
    },
    MissingField {
        field: String,
    },
    DuplicateFilename {
        occurrences: usize,
    },
    WordMismatch {
        expected: String,
        actual: Option<String>,
    },
    OrphanInDataset {
        word: Option<String>,
    },
    OrphanOnDisk {
        word: Option<String>,
    },
    UnreadableDocument {
        reason: String,
    },
    InvalidImageUrl {
        url: String,
    },
    UnscaledImageUrl {
        url: String,
    },
    SharedImageUrl {
        url: String,
        used_by: Vec<String>,
    },
    ImageWordHint {
        word: String,
        url_word: String,
    },
    StructuralImbalance {
        file: String,
        marker: String,
        open_count: usize,
        close_count: usize,
    },
    MissingDocumentElement {
        file: String,
        element: String,
    },
    AwaitOutsideAsync {
        file: String,
        block: usize,
    },
    OrphanThemeMeta,
    OrphanCardList,
    MergeConflict {
        reason: String,
    },
    BackfillConflict {
        field: String,
        existing: String,
        proposed: String,
    },
}

impl FindingKind {
    pub fn severity(&self) -> Severity {
        match self {
            Self::MalformedDataset { .. }
            | Self::SchemaViolation { .. }
            | Self::MissingField { .. }
            | Self::DuplicateFilename { .. }
            | Self::InvalidImageUrl { .. }
            | Self::OrphanThemeMeta
            | Self::OrphanCardList
            | Self::MergeConflict { .. } => Severity::Error,
            Self::WordMismatch { .. }
            | Self::OrphanInDataset { .. }
            | Self::OrphanOnDisk { .. }
            | Self::UnreadableDocument { .. }
            | Self::UnscaledImageUrl { .. }
            | Self::StructuralImbalance { .. }
            | Self::MissingDocumentElement { .. }
            | Self::AwaitOutsideAsync { .. }
            | Self::BackfillConflict { .. } => Severity::Warning,
            Self::SharedImageUrl { .. } | Self::ImageWordHint { .. } => Severity::Info,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MalformedDataset { .. } => "MalformedDataset",
            Self::SchemaViolation { .. } => "SchemaViolation",
            Self::MissingField { .. } => "MissingField",
            Self::DuplicateFilename { .. } => "DuplicateFilename",
            Self::WordMismatch { .. } => "WordMismatch",
            Self::OrphanInDataset { .. } => "OrphanInDataset",
            Self::OrphanOnDisk { .. } => "OrphanOnDisk",
            Self::UnreadableDocument { .. } => "UnreadableDocument",
            Self::InvalidImageUrl { .. } => "InvalidImageUrl",
            Self::UnscaledImageUrl { .. } => "UnscaledImageUrl",
            Self::SharedImageUrl { .. } => "SharedImageUrl",
            Self::ImageWordHint { .. } => "ImageWordHint",
            Self::StructuralImbalance { .. } => "StructuralImbalance",
            Self::MissingDocumentElement { .. } => "MissingDocumentElement",
            Self::AwaitOutsideAsync { .. } => "AwaitOutsideAsync",
            Self::OrphanThemeMeta => "OrphanThemeMeta",
            Self::OrphanCardList => "OrphanCardList",
            Self::MergeConflict { .. } => "MergeConflict",
            Self::BackfillConflict { .. } => "BackfillConflict",
        }
    }

    /// Position in report grouping: structural problems first, hints last.
    fn rank(&self) -> u8 {
        match self {
            Self::MalformedDataset { .. } => 0,
            Self::SchemaViolation { .. } => 1,
            Self::OrphanThemeMeta => 2,
            Self::OrphanCardList => 3,
            Self::MergeConflict { .. } => 4,
            Self::MissingField { .. } => 5,
            Self::DuplicateFilename { .. } => 6,
            Self::InvalidImageUrl { .. } => 7,
            Self::WordMismatch { .. } => 8,
            Self::OrphanInDataset { .. } => 9,
            Self::OrphanOnDisk { .. } => 10,
            Self::UnreadableDocument { .. } => 11,
            Self::UnscaledImageUrl { .. } => 12,
            Self::BackfillConflict { .. } => 13,
            Self::StructuralImbalance { .. } => 14,
            Self::MissingDocumentElement { .. } => 15,
            Self::AwaitOutsideAsync { .. } => 16,
            Self::SharedImageUrl { .. } => 17,
            Self::ImageWordHint { .. } => 18,
        }
    }

    /// One-line human description, without location.
    pub fn describe(&self) -> String {
        match self {
            Self::MalformedDataset { reason } => format!("malformed dataset: {reason}"),
            Self::SchemaViolation { field, problem } => format!("'{field}' {problem}"),
            Self::MissingField { field } => format!("missing {field}"),
            Self::DuplicateFilename { occurrences } => {
                format!("filename appears {occurrences} times")
            }
            Self::WordMismatch { expected, actual } => match actual {
                Some(actual) => {
                    format!("dataset says '{expected}' but legacy document shows '{actual}'")
                }
                None => format!("dataset says '{expected}' but legacy document has no word"),
            },
            Self::OrphanInDataset { word } => format!(
                "listed in dataset (word: '{}') but no legacy document exists",
                word.as_deref().unwrap_or("?")
            ),
            Self::OrphanOnDisk { word } => format!(
                "legacy document exists (word: '{}') but is not in the dataset",
                word.as_deref().unwrap_or("?")
            ),
            Self::UnreadableDocument { reason } => format!("legacy document unreadable: {reason}"),
            Self::InvalidImageUrl { url } => format!("invalid image URL '{url}'"),
            Self::UnscaledImageUrl { url } => format!("image URL lacks scale token '{url}'"),
            Self::SharedImageUrl { url, used_by } => {
                format!("image '{url}' shared by {}", used_by.join(", "))
            }
            Self::ImageWordHint { word, url_word } => {
                format!("card word '{word}' but image name suggests '{url_word}'")
            }
            Self::StructuralImbalance {
                file,
                marker,
                open_count,
                close_count,
            } => format!("{file}: mismatched {marker} ({open_count} open, {close_count} close)"),
            Self::MissingDocumentElement { file, element } => {
                format!("{file}: missing {element}")
            }
            Self::AwaitOutsideAsync { file, block } => {
                format!("{file} script block {block}: 'await' used outside async function")
            }
            Self::OrphanThemeMeta => "theme metadata has no card list".to_string(),
            Self::OrphanCardList => "card list has no theme metadata".to_string(),
            Self::MergeConflict { reason } => format!("merge refused: {reason}"),
            Self::BackfillConflict {
                field,
                existing,
                proposed,
            } => format!("backfill kept {field} '{existing}', table proposed '{proposed}'"),
        }
    }
}

/// A single located issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub theme: Option<String>,
    pub filename: Option<String>,
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: FindingKind,
}

impl Finding {
    pub fn new(kind: FindingKind, theme: Option<String>, filename: Option<String>) -> Self {
        Self {
            theme,
            filename,
            severity: kind.severity(),
            kind,
        }
    }

    /// Finding about the dataset as a whole.
    pub fn dataset(kind: FindingKind) -> Self {
        Self::new(kind, None, None)
    }

    pub fn theme(theme: impl Into<String>, kind: FindingKind) -> Self {
        Self::new(kind, Some(theme.into()), None)
    }

    pub fn card(theme: impl Into<String>, filename: impl Into<String>, kind: FindingKind) -> Self {
        Self::new(kind, Some(theme.into()), Some(filename.into()))
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Report order: theme (dataset-level first), kind, filename.
    pub fn report_order(&self, other: &Self) -> Ordering {
        self.theme
            .cmp(&other.theme)
            .then_with(|| self.kind.rank().cmp(&other.kind.rank()))
            .then_with(|| self.filename.cmp(&other.filename))
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = match (&self.theme, &self.filename) {
            (Some(theme), Some(filename)) => format!("{theme}/{filename}"),
            (Some(theme), None) => theme.clone(),
            (None, Some(filename)) => filename.clone(),
            (None, None) => "dataset".to_string(),
        };
        write!(
            f,
            "[{}] {}: {}",
            self.severity,
            location,
            self.kind.describe()
        )
    }
}
