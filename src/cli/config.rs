use std::path::Path;

use crate::cli::context::CliContext;
use crate::config::Config;
use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde_json::{Map, Value as JsonValue};
use tokio::fs;
use tracing::info;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value (dotted key, e.g. recorder.max_log_size)
    Set {
        /// Configuration key
        key: String,

        /// Configuration value, parsed as JSON when possible
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Reset configuration to defaults
    Reset,

    /// Validate configuration
    Validate,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    let path = ctx.config_path().to_path_buf();
    match args.action {
        ConfigAction::Show => {
            let config = load_config_file(&path).await?;
            ctx.output().emit(&config, || {
                println!("Current configuration ({}):", path.display());
                print!("{}", serde_yaml::to_string(&config).unwrap_or_default());
            })?;
        }
        ConfigAction::Set { key, value } => {
            let config = load_config_file(&path).await?;
            let mut json = serde_json::to_value(&config)?;
            let segments = split_key(&key)?;
            if get_json_value(&json, &segments).is_none() {
                bail!("{} is not a configuration key", key);
            }
            set_json_value(&mut json, &segments, parse_cli_value(&value))?;
            let updated: Config = serde_json::from_value(json)
                .with_context(|| format!("invalid value for {}", key))?;
            save_config_file(&path, &updated).await?;
            info!("Updated configuration key {}", key);
            println!("Saved configuration to {}", path.display());
        }
        ConfigAction::Get { key } => {
            let config = load_config_file(&path).await?;
            let json = serde_json::to_value(&config)?;
            let segments = split_key(&key)?;
            let Some(value) = get_json_value(&json, &segments) else {
                bail!("{} not found in configuration", key);
            };
            ctx.output()
                .emit(value, || print!("{}", serde_yaml::to_string(value).unwrap_or_default()))?;
        }
        ConfigAction::Reset => {
            save_config_file(&path, &Config::default()).await?;
            println!(
                "Configuration reset to defaults and written to {}",
                path.display()
            );
        }
        ConfigAction::Validate => {
            if !fs::try_exists(&path).await? {
                println!(
                    "No configuration file at {}; defaults are valid",
                    path.display()
                );
                return Ok(());
            }
            let config = load_config_file(&path).await?;
            let problems = config.validate();
            if !problems.is_empty() {
                for problem in &problems {
                    eprintln!("  - {}", problem);
                }
                bail!(
                    "configuration file {} has {} problem(s)",
                    path.display(),
                    problems.len()
                );
            }
            println!("Configuration file {} is valid", path.display());
        }
    }

    Ok(())
}

async fn load_config_file(path: &Path) -> Result<Config> {
    if !fs::try_exists(path).await? {
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

async fn save_config_file(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let serialized = serde_yaml::to_string(config)?;
    fs::write(path, serialized)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn parse_cli_value(raw: &str) -> JsonValue {
    serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

fn split_key(key: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = key
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.is_empty() {
        bail!("configuration key cannot be empty");
    }
    Ok(segments)
}

fn set_json_value(target: &mut JsonValue, path: &[&str], value: JsonValue) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        bail!("configuration key cannot be empty");
    };
    let mut current = target;
    for segment in parents {
        let map = ensure_object(current, segment)?;
        current = map.entry((*segment).to_string()).or_insert(JsonValue::Null);
    }
    ensure_object(current, last)?.insert((*last).to_string(), value);
    Ok(())
}

fn ensure_object<'a>(
    value: &'a mut JsonValue,
    segment: &str,
) -> Result<&'a mut Map<String, JsonValue>> {
    if value.is_null() {
        *value = JsonValue::Object(Map::new());
    }
    match value {
        JsonValue::Object(map) => Ok(map),
        _ => bail!(
            "{} resolves to a non-object value; cannot assign nested configuration",
            segment
        ),
    }
}

fn get_json_value<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let mut current = value;
    for segment in path {
        match current {
            JsonValue::Object(map) => {
                current = map.get(*segment)?;
            }
            _ => return None,
        }
    }
    Some(current)
}
