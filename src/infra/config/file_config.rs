use std::path::PathBuf;

use serde::Deserialize;

use crate::infra::config::{AppConfig, BotConfig, LogConfig, StorageConfig};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub bot: Option<FileBotConfig>,
    pub storage: Option<FileStorageConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(bot) = self.bot {
            bot.merge_into(&mut config.bot);
        }

        if let Some(storage) = self.storage {
            storage.merge_into(&mut config.storage);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }

        if let Some(file) = self.file {
            config.file = Some(file);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileBotConfig {
    pub token: Option<String>,
    pub api_base_url: Option<String>,
    pub poll_timeout_secs: Option<u64>,
    pub error_backoff_ms: Option<u64>,
}

impl FileBotConfig {
    fn merge_into(self, config: &mut BotConfig) {
        if let Some(token) = self.token {
            config.token = token;
        }

        if let Some(api_base_url) = self.api_base_url {
            config.api_base_url = api_base_url;
        }

        if let Some(poll_timeout_secs) = self.poll_timeout_secs {
            config.poll_timeout_secs = poll_timeout_secs;
        }

        if let Some(error_backoff_ms) = self.error_backoff_ms {
            config.error_backoff_ms = error_backoff_ms;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileStorageConfig {
    pub database: Option<PathBuf>,
}

impl FileStorageConfig {
    fn merge_into(self, config: &mut StorageConfig) {
        if let Some(database) = self.database {
            config.database = Some(database);
        }
    }
}
