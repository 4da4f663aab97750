use std::{path::PathBuf, sync::Arc};

use tracing_appender::non_blocking::WorkerGuard;

use crate::{infra::config::AppConfig, usecases::dispatcher::Dispatcher};

pub struct AppContext {
    pub config: AppConfig,
    pub database_path: PathBuf,
    pub dispatcher: Arc<Dispatcher>,
    _log_guard: Option<WorkerGuard>,
}

impl AppContext {
    pub fn new(config: AppConfig, database_path: PathBuf, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            config,
            database_path,
            dispatcher,
            _log_guard: None,
        }
    }

    /// Keeps the file log writer alive as long as the context.
    pub fn with_log_guard(mut self, guard: Option<WorkerGuard>) -> Self {
        self._log_guard = guard;
        self
    }
}
