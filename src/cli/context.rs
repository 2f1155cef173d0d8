use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::OnceCell;
use tracing::debug;

use soulrecorder_event_store::{EventLog, StorageManager};

use super::output::OutputFormat;
use crate::config::{Config, StorageBackend};

pub struct CliContext {
    config: Arc<Config>,
    config_path: PathBuf,
    output: OutputFormat,
    event_log: OnceCell<Arc<EventLog>>,
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf, output: OutputFormat) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            output,
            event_log: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output(&self) -> &OutputFormat {
        &self.output
    }

    /// Event log over the configured backend, opened on first use.
    pub async fn event_log(&self) -> Result<Arc<EventLog>> {
        self.event_log
            .get_or_try_init(|| async {
                let manager = match self.config.storage.backend {
                    StorageBackend::File => {
                        let dir = self.config.state_dir();
                        tokio::fs::create_dir_all(&dir).await?;
                        debug!(path = %dir.display(), "opening file-backed event log");
                        StorageManager::file_based(dir)
                    }
                    StorageBackend::Memory => StorageManager::in_memory(),
                };
                Ok::<_, anyhow::Error>(Arc::new(EventLog::new(
                    manager.backend(),
                    self.config.log_policy(),
                )))
            })
            .await
            .map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_log_is_opened_once_under_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.path = Some(dir.path().join("state"));
        let ctx = CliContext::new(config, dir.path().join("config.yaml"), OutputFormat::Human);

        let first = ctx.event_log().await.unwrap();
        let second = ctx.event_log().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(dir.path().join("state").is_dir());
    }
}
