use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use selector_synth::{HtmlDocument, SelectorSynthesizer, Synthesis};
use serde::Serialize;
use tracing::debug;

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct SelectorArgs {
    /// HTML file to load
    pub html: PathBuf,

    /// CSS query locating an element; the first match is used
    #[arg(short, long = "target", value_name = "CSS")]
    pub targets: Vec<String>,

    /// Synthesize for every element inside <body>
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
struct SelectorRow {
    target: String,
    #[serde(flatten)]
    synthesis: Synthesis,
}

pub async fn cmd_selector(args: SelectorArgs, ctx: &CliContext) -> Result<()> {
    if args.targets.is_empty() && !args.all {
        bail!("pass at least one --target or use --all");
    }

    let source = tokio::fs::read_to_string(&args.html)
        .await
        .with_context(|| format!("reading {}", args.html.display()))?;
    let doc = HtmlDocument::parse(&source);
    let synth = SelectorSynthesizer::with_options(&doc, ctx.config().selector.clone());

    let mut rows = Vec::new();
    for target in &args.targets {
        let node = doc
            .select_one(target)
            .with_context(|| format!("resolving --target {}", target))?;
        rows.push(SelectorRow {
            target: target.clone(),
            synthesis: synth.synthesize_detailed(Some(&node)),
        });
    }
    if args.all {
        for (idx, node) in doc.select_all("body *")?.into_iter().enumerate() {
            let tag = doc
                .element(node)
                .map(|el| el.value().name().to_string())
                .unwrap_or_default();
            rows.push(SelectorRow {
                target: format!("{}#{}", tag, idx + 1),
                synthesis: synth.synthesize_detailed(Some(&node)),
            });
        }
    }
    debug!(count = rows.len(), file = %args.html.display(), "synthesized selectors");

    ctx.output().emit(&rows, || {
        for row in &rows {
            println!(
                "{:<24} {}  [{}{}]",
                row.target,
                row.synthesis.selector,
                row.synthesis.strategy.name(),
                if row.synthesis.unique { ", unique" } else { "" }
            );
        }
    })
}
