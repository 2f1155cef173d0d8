use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Logs go to stderr so command output on stdout stays machine readable.
pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(())
}

pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
}

pub fn default_config_path() -> Result<PathBuf> {
    // Priority: ./config/config.yaml > ~/.config/soulrecorder/config.yaml
    let local_config = PathBuf::from("config/config.yaml");
    if local_config.exists() {
        return Ok(local_config);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("soulrecorder");
    path.push("config.yaml");
    Ok(path)
}

pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let config_path = match config_path {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };

    if !config_path.exists() {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        return Ok(LoadedConfig {
            config: Config::default(),
            path: config_path,
        });
    }

    let content = fs::read_to_string(&config_path)
        .await
        .context("Failed to read config file")?;
    let config: Config = serde_yaml::from_str(&content).context("Failed to parse config file")?;
    for problem in config.validate() {
        warn!(path = %config_path.display(), "{}", problem);
    }

    info!("Loaded configuration from: {}", config_path.display());
    Ok(LoadedConfig {
        config,
        path: config_path,
    })
}
