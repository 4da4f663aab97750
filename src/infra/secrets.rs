use std::panic;

const REDACTED: &str = "[REDACTED]";

const SENSITIVE_MARKERS: [&str; 3] = ["token", "secret", "password"];

/// Scrubs configured secrets and anything shaped like a bot token.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    secrets: Vec<String>,
}

impl Redactor {
    pub fn with_secret(mut self, secret: &str) -> Self {
        if !secret.is_empty() {
            self.secrets.push(secret.to_owned());
        }
        self
    }

    pub fn redact(&self, input: &str) -> String {
        let known_removed = self
            .secrets
            .iter()
            .fold(input.to_owned(), |text, secret| text.replace(secret, REDACTED));

        known_removed
            .split(' ')
            .map(redact_chunk)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn install_panic_redaction_hook(redactor: Redactor) {
    panic::set_hook(Box::new(move |panic_info| {
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic payload omitted".to_owned());

        let scrubbed = redactor.redact(&payload);

        match panic_info.location() {
            Some(location) => eprintln!(
                "shiftlog panic: {} at {}:{}:{}",
                scrubbed,
                location.file(),
                location.line(),
                location.column()
            ),
            None => eprintln!("shiftlog panic: {}", scrubbed),
        }
    }));
}

fn redact_chunk(chunk: &str) -> String {
    let lowered = chunk.to_ascii_lowercase();
    let has_marker_assignment = SENSITIVE_MARKERS
        .iter()
        .any(|marker| lowered.contains(&format!("{marker}=")));

    if has_marker_assignment || chunk.split('/').any(looks_like_bot_token) {
        REDACTED.to_owned()
    } else {
        chunk.to_owned()
    }
}

/// Telegram bot tokens look like `<bot id>:<35 url-safe characters>`,
/// optionally prefixed with `bot` inside API URLs.
fn looks_like_bot_token(value: &str) -> bool {
    let value = value.strip_prefix("bot").unwrap_or(value);
    let Some((id, secret)) = value.split_once(':') else {
        return false;
    };

    !id.is_empty()
        && id.chars().all(|ch| ch.is_ascii_digit())
        && secret.len() >= 30
        && secret
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}
