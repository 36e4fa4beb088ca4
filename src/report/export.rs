//! Machine-readable findings: a JSON array, or CSV when the path ends in `.csv`.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::dataset::{write_atomic, write_json_atomic};
use crate::error::DeckError;
use crate::validate::Finding;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    theme: &'a str,
    filename: &'a str,
    kind: &'static str,
    severity: &'static str,
    /// Kind-specific fields as compact JSON; empty for unit kinds.
    detail: String,
}

pub fn write_report(path: impl AsRef<Path>, findings: &[Finding]) -> Result<(), DeckError> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        write_atomic(path, &findings_csv(findings)?)?;
    } else {
        write_json_atomic(path, findings)?;
    }
    log::info!("wrote {} findings to {}", findings.len(), path.display());
    Ok(())
}

pub fn findings_csv(findings: &[Finding]) -> Result<Vec<u8>, DeckError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for finding in findings {
        let detail = match serde_json::to_value(finding)?.get("detail") {
            Some(Value::Null) | None => String::new(),
            Some(detail) => detail.to_string(),
        };
        writer.serialize(CsvRow {
            theme: finding.theme.as_deref().unwrap_or(""),
            filename: finding.filename.as_deref().unwrap_or(""),
            kind: finding.kind.name(),
            severity: finding.severity.as_str(),
            detail,
        })?;
    }
    writer
        .into_inner()
        .map_err(|err| DeckError::Csv(csv::Error::from(err.into_error())))
}
