//! Domain layer: core entities and business rules.

pub mod command;
pub mod conversation;
pub mod employee;
pub mod session_state;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
