use super::config::cmd_config;
use super::env::CliArgs;
use super::export::cmd_export;
use super::ingest::cmd_ingest;
use super::log::cmd_log;
use super::record::cmd_record;
use super::script::cmd_script;
use super::selector::cmd_selector;
use super::session::cmd_session;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Selector(args) => cmd_selector(args, ctx).await,
        Commands::Record(args) => cmd_record(args, ctx).await,
        Commands::Ingest(args) => cmd_ingest(args, ctx).await,
        Commands::Log(args) => cmd_log(args, ctx).await,
        Commands::Export(args) => cmd_export(args, ctx).await,
        Commands::Script(args) => cmd_script(args, ctx).await,
        Commands::Session(args) => cmd_session(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
    }
}
