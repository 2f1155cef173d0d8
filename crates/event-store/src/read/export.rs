//! Log export in JSON, JSON Lines and CSV

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::{EsError, EsErrorKind, EsResult};
use crate::model::LogEntry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Pretty-printed array
    Json,
    /// Header line followed by one entry per line
    Jsonl,
    /// Flattened columns for spreadsheets
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Jsonl => "jsonl",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "jsonl" | "ndjson" => Some(ExportFormat::Jsonl),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

const CSV_HEADER: [&str; 12] = [
    "timestamp",
    "type",
    "selector",
    "tag",
    "text",
    "value",
    "key",
    "x",
    "y",
    "title",
    "url",
    "session_id",
];

/// Serialize entries in the requested format.
pub fn export_entries(entries: &[LogEntry], format: ExportFormat) -> EsResult<Vec<u8>> {
    match format {
        ExportFormat::Json => serde_json::to_vec_pretty(entries).map_err(export_error),
        ExportFormat::Jsonl => {
            let mut out = serde_json::to_vec(&json!({
                "count": entries.len(),
                "exported_at": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            }))
            .map_err(export_error)?;
            out.push(b'\n');
            for entry in entries {
                serde_json::to_writer(&mut out, entry).map_err(export_error)?;
                out.push(b'\n');
            }
            Ok(out)
        }
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(CSV_HEADER).map_err(export_error)?;
            for entry in entries {
                writer.write_record(csv_row(entry)).map_err(export_error)?;
            }
            writer
                .into_inner()
                .map_err(|err| export_error(err.into_error()))
        }
    }
}

fn csv_row(entry: &LogEntry) -> [String; 12] {
    let element = entry.element.as_ref();
    let text = |value: Option<&String>| value.cloned().unwrap_or_default();
    let (x, y) = entry
        .mouse
        .map(|mouse| (mouse.x.to_string(), mouse.y.to_string()))
        .unwrap_or_default();
    [
        entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        entry.kind.as_str().to_string(),
        text(entry.selector.as_ref()),
        element.map(|el| el.tag_name.clone()).unwrap_or_default(),
        text(element.and_then(|el| el.text.as_ref())),
        text(element.and_then(|el| el.value.as_ref())),
        text(entry.key.as_ref()),
        x,
        y,
        entry.page_title().unwrap_or_default().to_string(),
        entry.page_url().unwrap_or_default().to_string(),
        entry
            .session_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_default(),
    ]
}

/// Write an export atomically through a sibling temp file.
pub fn write_export_file(path: &Path, entries: &[LogEntry], format: ExportFormat) -> EsResult<()> {
    let body = export_entries(entries, format)?;
    write_atomic(path, &body).map_err(export_error)
}

fn write_atomic(path: &Path, body: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)?;
    file.write_all(body)?;
    file.sync_all()?;
    fs::rename(tmp, path)
}

fn export_error(err: impl std::fmt::Display) -> EsError {
    EsError::new(EsErrorKind::ExportFailed(err.to_string()))
}
