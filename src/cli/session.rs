use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;

use soulrecorder_core_types::SessionId;
use soulrecorder_event_store::SessionStats;

use crate::cli::context::CliContext;
use crate::render::format_timestamp;

#[derive(Args, Clone, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub action: SessionAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum SessionAction {
    /// Show the current session and its statistics
    Show,

    /// Start a new session
    New,

    /// List statistics of every retained session, newest first
    Stats,

    /// Drop statistics of all but the most recent sessions
    Cleanup,

    /// Clear the event log and statistics, keeping the current session
    Clear,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    session_id: SessionId,
    start_time: DateTime<Utc>,
    stats: Option<SessionStats>,
}

pub async fn cmd_session(args: SessionArgs, ctx: &CliContext) -> Result<()> {
    let log = ctx.event_log().await?;
    match args.action {
        SessionAction::Show => {
            let session = log.current_session().await?;
            let stats = log.session_stats(&session.session_id).await?;
            let view = SessionView {
                session_id: session.session_id,
                start_time: session.start_time,
                stats,
            };
            ctx.output().emit(&view, || {
                println!("Session: {}", view.session_id);
                println!("Started: {}", view.start_time.to_rfc3339());
                match &view.stats {
                    Some(stats) => print_stats(stats),
                    None => println!("No events recorded in this session yet."),
                }
            })?;
        }
        SessionAction::New => {
            let session = log.start_new_session().await?;
            ctx.output()
                .emit(&session, || println!("Started session {}", session.session_id))?;
        }
        SessionAction::Stats => {
            let mut table: Vec<(SessionId, SessionStats)> = log.stats().await?.into_iter().collect();
            table.sort_by(|a, b| b.1.start_time.cmp(&a.1.start_time));
            let current = log.current_session().await?.session_id;
            let rows: Vec<_> = table
                .iter()
                .map(|(id, stats)| serde_json::json!({ "sessionId": id, "stats": stats }))
                .collect();
            ctx.output().emit(&rows, || {
                if table.is_empty() {
                    println!("No session statistics recorded.");
                }
                for (id, stats) in &table {
                    let marker = if *id == current { "*" } else { " " };
                    println!("{} {}", marker, id);
                    print_stats(stats);
                }
            })?;
        }
        SessionAction::Cleanup => {
            let dropped = log.cleanup_sessions().await?;
            ctx.output().emit(&dropped, || {
                println!(
                    "Removed {} session(s), keeping the {} most recent",
                    dropped.len(),
                    log.policy().max_sessions
                );
                for id in &dropped {
                    println!("  - {}", id);
                }
            })?;
        }
        SessionAction::Clear => {
            log.clear().await?;
            println!("Event log cleared");
        }
    }
    Ok(())
}

fn print_stats(stats: &SessionStats) {
    let active = (stats.last_activity - stats.start_time)
        .to_std()
        .unwrap_or_default();
    println!(
        "    {} events, active for {}, last at {}",
        stats.event_count,
        humantime::format_duration(round_to_seconds(active)),
        format_timestamp(stats.last_activity, false)
    );
    for (kind, count) in &stats.event_types {
        println!("      {:<12} {}", kind, count);
    }
}

fn round_to_seconds(duration: std::time::Duration) -> std::time::Duration {
    std::time::Duration::from_secs(duration.as_secs())
}
