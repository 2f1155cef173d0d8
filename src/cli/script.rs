use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use crate::cli::context::CliContext;
use crate::script::{build_script_steps, generate_script, ScriptLanguage, ScriptOptions};

#[derive(Args, Clone, Debug)]
pub struct ScriptArgs {
    /// Target language
    #[arg(short, long, default_value = "javascript")]
    pub language: LanguageArg,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only use entries of the current session
    #[arg(long)]
    pub current_session: bool,

    /// Do not translate pauses between events into waits
    #[arg(long)]
    pub no_waits: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LanguageArg {
    #[value(name = "javascript", alias = "js")]
    JavaScript,
    #[value(name = "python", alias = "py")]
    Python,
}

impl From<LanguageArg> for ScriptLanguage {
    fn from(value: LanguageArg) -> Self {
        match value {
            LanguageArg::JavaScript => ScriptLanguage::JavaScript,
            LanguageArg::Python => ScriptLanguage::Python,
        }
    }
}

pub async fn cmd_script(args: ScriptArgs, ctx: &CliContext) -> Result<()> {
    let log = ctx.event_log().await?;
    let mut entries = log.entries().await?;
    if args.current_session {
        let session = log.current_session().await?.session_id;
        entries.retain(|entry| entry.session_id.as_ref() == Some(&session));
    }

    let options = ScriptOptions {
        waits: !args.no_waits,
    };
    let steps = build_script_steps(&entries, &options);
    let script = generate_script(args.language.into(), &steps);

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &script)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            info!(steps = steps.len(), path = %path.display(), "generated script");
            println!(
                "Wrote {} steps from {} events to {}",
                steps.len(),
                entries.len(),
                path.display()
            );
        }
        None => print!("{}", script),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::commands::Commands;
    use crate::cli::env::CliArgs;

    fn language(args: &[&str]) -> Option<ScriptLanguage> {
        let cli = CliArgs::try_parse_from(args).ok()?;
        match cli.command {
            Commands::Script(script) => Some(script.language.into()),
            _ => None,
        }
    }

    #[test]
    fn language_defaults_to_javascript_and_accepts_aliases() {
        assert_eq!(language(&["soulrecorder", "script"]), Some(ScriptLanguage::JavaScript));
        assert_eq!(
            language(&["soulrecorder", "script", "--language", "javascript"]),
            Some(ScriptLanguage::JavaScript)
        );
        assert_eq!(
            language(&["soulrecorder", "script", "-l", "js"]),
            Some(ScriptLanguage::JavaScript)
        );
        assert_eq!(
            language(&["soulrecorder", "script", "--language", "python"]),
            Some(ScriptLanguage::Python)
        );
        assert_eq!(language(&["soulrecorder", "script", "--language", "java-script"]), None);
    }
}
