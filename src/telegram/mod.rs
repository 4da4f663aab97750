//! Telegram integration layer: Bot API client and the chat transport built on it.

pub mod bot_api;
pub mod transport;

/// Returns the telegram module name for smoke checks.
pub fn module_name() -> &'static str {
    "telegram"
}
