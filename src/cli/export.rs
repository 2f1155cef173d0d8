use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use soulrecorder_event_store::{export_entries, write_export_file, EntryFilter, ExportFormat};

use soulrecorder_core_types::EventKind;

use crate::cli::context::CliContext;
use crate::cli::log::parse_kind;

#[derive(Args, Clone, Debug)]
pub struct ExportArgs {
    /// Export format (inferred from --output's extension when omitted)
    #[arg(short, long)]
    pub format: Option<DataFormat>,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only export entries of these types
    #[arg(short = 't', long = "type", value_parser = parse_kind)]
    pub kinds: Vec<EventKind>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DataFormat {
    Json,
    Jsonl,
    Csv,
}

impl From<DataFormat> for ExportFormat {
    fn from(value: DataFormat) -> Self {
        match value {
            DataFormat::Json => ExportFormat::Json,
            DataFormat::Jsonl => ExportFormat::Jsonl,
            DataFormat::Csv => ExportFormat::Csv,
        }
    }
}

pub async fn cmd_export(args: ExportArgs, ctx: &CliContext) -> Result<()> {
    let format = args
        .format
        .map(ExportFormat::from)
        .or_else(|| args.output.as_deref().and_then(ExportFormat::from_path))
        .unwrap_or(ExportFormat::Json);

    let log = ctx.event_log().await?;
    let entries = if args.kinds.is_empty() {
        log.entries().await?
    } else {
        let filter = EntryFilter::kinds(args.kinds.clone());
        log.entries()
            .await?
            .into_iter()
            .filter(|entry| filter.matches(entry))
            .collect()
    };

    match &args.output {
        Some(path) => {
            write_export_file(path, &entries, format).with_context(|| format!("writing {}", path.display()))?;
            info!(count = entries.len(), path = %path.display(), "exported log");
            println!(
                "Exported {} events to {}",
                entries.len(),
                path.display()
            );
        }
        None => {
            let bytes = export_entries(&entries, format)?;
            print!("{}", String::from_utf8_lossy(&bytes));
        }
    }
    Ok(())
}
