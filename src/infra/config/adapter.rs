use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::infra::config::{load, AppConfig};

/// Source of the application configuration.
pub trait ConfigAdapter {
    fn load(&self) -> Result<AppConfig>;
}

/// Reads `config.toml` (or the `--config` path) and merges it over defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfigAdapter {
    path: Option<PathBuf>,
}

impl FileConfigAdapter {
    pub fn new(path: Option<&Path>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
        }
    }
}

impl ConfigAdapter for FileConfigAdapter {
    fn load(&self) -> Result<AppConfig> {
        let config = load(self.path.as_deref())?;
        tracing::debug!(
            path = ?self.path,
            has_bot_token = !config.bot.token.is_empty(),
            "configuration loaded"
        );
        Ok(config)
    }
}
