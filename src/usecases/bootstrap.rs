use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    infra::{
        self,
        config::{AppConfig, ConfigAdapter, FileConfigAdapter, StorageConfig},
        error::AppError,
        secrets::{install_panic_redaction_hook, Redactor},
        sqlite_store::SqliteWorkLogStore,
        storage_layout::StorageLayout,
    },
    usecases::{
        context::AppContext, contracts::SystemClock, dispatcher::Dispatcher,
        time_tracking::TimeTrackingService,
    },
};

pub fn bootstrap(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let config = load_config(&FileConfigAdapter::new(config_path))?;
    let log_guard = infra::logging::init(&config.logging)?;
    install_panic_redaction_hook(Redactor::default().with_secret(&config.bot.token));

    Ok(build_context(config)?.with_log_guard(log_guard))
}

fn load_config(adapter: &dyn ConfigAdapter) -> Result<AppConfig, AppError> {
    adapter.load().map_err(AppError::Other)
}

/// Wires store → service → dispatcher for the configured database.
pub(crate) fn build_context(config: AppConfig) -> Result<AppContext, AppError> {
    let database_path = resolve_database_path(&config.storage)?;
    let store = SqliteWorkLogStore::open(&database_path).map_err(|source| {
        AppError::StoreOpen {
            path: database_path.clone(),
            source,
        }
    })?;

    tracing::info!(database = %database_path.display(), "work log store opened");

    let service = Arc::new(TimeTrackingService::new(Arc::new(store)));
    let dispatcher = Arc::new(Dispatcher::new(service, Arc::new(SystemClock)));

    Ok(AppContext::new(config, database_path, dispatcher))
}

fn resolve_database_path(storage: &StorageConfig) -> Result<PathBuf, AppError> {
    match &storage.database {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| AppError::StorageDirCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            Ok(path.clone())
        }
        None => {
            let layout = StorageLayout::resolve()?;
            layout.ensure_dirs()?;
            Ok(layout.default_database_file())
        }
    }
}
