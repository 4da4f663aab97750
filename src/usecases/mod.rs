//! Use case layer: time tracking, conversation handling and transport relay.

pub mod bootstrap;
pub mod context;
pub mod contracts;
pub mod dispatcher;
pub mod relay;
pub mod time_tracking;

/// Returns the usecases module name for smoke checks.
pub fn module_name() -> &'static str {
    "usecases"
}
