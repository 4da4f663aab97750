//! Infrastructure layer: adapters for config, storage, logging and the console.

pub mod config;
pub mod console;
pub mod error;
pub mod instance_lock;
pub mod logging;
pub mod secrets;
pub mod sqlite_store;
pub mod storage_layout;
#[cfg(test)]
pub mod stubs;

/// Returns the infra module name for smoke checks.
pub fn module_name() -> &'static str {
    "infra"
}
