use anyhow::Result;
use clap::Args;
use tracing::debug;

use soulrecorder_core_types::EventKind;
use soulrecorder_event_store::EntryFilter;

use crate::cli::context::CliContext;
use crate::render::{render_log, RenderOptions};

#[derive(Args, Clone, Debug)]
pub struct LogArgs {
    /// Number of most recent entries to show (defaults to the retained log size)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Only show entries of these types (click, keypress, form_submit, ...)
    #[arg(short = 't', long = "type", value_parser = parse_kind)]
    pub kinds: Vec<EventKind>,

    /// Only show entries of the current session
    #[arg(long)]
    pub current_session: bool,

    /// Title of the page being viewed; entries from it omit their title line
    #[arg(long)]
    pub title: Option<String>,

    /// Show timestamps in local time instead of UTC
    #[arg(long)]
    pub local_time: bool,
}

pub fn parse_kind(raw: &str) -> Result<EventKind, String> {
    EventKind::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = EventKind::all().iter().map(|kind| kind.as_str()).collect();
        format!("unknown event type '{}' (expected one of {})", raw, known.join(", "))
    })
}

pub async fn cmd_log(args: LogArgs, ctx: &CliContext) -> Result<()> {
    let log = ctx.event_log().await?;
    let max_log_size = ctx.config().recorder.max_log_size;

    let mut filter = EntryFilter::default();
    if !args.kinds.is_empty() {
        filter.kinds = Some(args.kinds.clone());
    }
    if args.current_session {
        filter.session = Some(log.current_session().await?.session_id);
    }
    let entries = log
        .tail(args.limit.unwrap_or(max_log_size), Some(&filter))
        .await?;
    debug!(count = entries.len(), "loaded log tail");

    let options = RenderOptions {
        current_title: args.title.clone(),
        local_time: args.local_time,
        max_log_size,
    };
    ctx.output()
        .emit(&entries, || print!("{}", render_log(&entries, &options)))
}
