use clap::Subcommand;

use super::config::ConfigArgs;
use super::export::ExportArgs;
use super::ingest::IngestArgs;
use super::log::LogArgs;
use super::record::RecordArgs;
use super::script::ScriptArgs;
use super::selector::SelectorArgs;
use super::session::SessionArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Synthesize CSS selectors for elements of an HTML file
    Selector(SelectorArgs),

    /// Play scripted interactions against a static page and log them
    Record(RecordArgs),

    /// Append entries captured elsewhere to the event log
    Ingest(IngestArgs),

    /// Show the most recent events, newest first
    Log(LogArgs),

    /// Export the event log as JSON, JSONL or CSV
    Export(ExportArgs),

    /// Generate a Playwright script from the event log
    Script(ScriptArgs),

    /// Inspect and maintain sessions
    Session(SessionArgs),

    /// Manage SoulRecorder configuration
    Config(ConfigArgs),
}
