use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use soulrecorder_event_store::LogEntry;

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct IngestArgs {
    /// JSONL file (one entry per line) or a JSON array of entries
    pub file: PathBuf,
}

#[derive(Debug, Default, Serialize)]
struct IngestReport {
    appended: usize,
    skipped: usize,
}

pub async fn cmd_ingest(args: IngestArgs, ctx: &CliContext) -> Result<()> {
    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let (entries, skipped) = parse_entries(&raw)?;

    let log = ctx.event_log().await?;
    let mut report = IngestReport {
        skipped,
        ..Default::default()
    };
    for entry in entries {
        let ack = log.append(entry).await;
        if !ack.success {
            bail!(
                "failed to store entry after {} appended: {}",
                report.appended,
                ack.error.unwrap_or_default()
            );
        }
        report.appended += 1;
    }
    info!(appended = report.appended, skipped = report.skipped, file = %args.file.display(), "ingested entries");

    ctx.output().emit(&report, || {
        println!(
            "Ingested {} entries ({} skipped)",
            report.appended, report.skipped
        )
    })
}

/// Entries in file order plus the number of unreadable records.
fn parse_entries(raw: &str) -> Result<(Vec<LogEntry>, usize)> {
    let records: Vec<(usize, Value)> = if raw.trim_start().starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(raw).context("parsing JSON array")?;
        values.into_iter().enumerate().map(|(i, v)| (i + 1, v)).collect()
    } else {
        let mut records = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(value) => records.push((idx + 1, value)),
                Err(err) => {
                    warn!(line = idx + 1, error = %err, "skipping unparsable line");
                    records.push((idx + 1, Value::Null));
                }
            }
        }
        records
    };

    let mut entries = Vec::new();
    let mut skipped = 0;
    for (position, value) in records {
        if value.is_null() {
            skipped += 1;
            continue;
        }
        match serde_json::from_value::<LogEntry>(value) {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                warn!(record = position, error = %err, "skipping record that is not a log entry");
                skipped += 1;
            }
        }
    }
    Ok((entries, skipped))
}
