mod adapter;
mod app_config;
mod file_config;
mod loader;

pub use adapter::{ConfigAdapter, FileConfigAdapter};
pub use app_config::{AppConfig, BotConfig, LogConfig, StorageConfig};
pub use loader::load;
