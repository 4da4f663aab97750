use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{
    domain::conversation::{InboundMessage, Reply, SessionId},
    usecases::contracts::{InboundSource, ReplySink},
};

use super::bot_api::{BotApiClient, Update};

const TELEGRAM_UPDATES_RECEIVED: &str = "TELEGRAM_UPDATES_RECEIVED";
/// `sendMessage` rejects longer text.
const MESSAGE_TEXT_LIMIT: usize = 4096;

/// Long-polling update source. Tracks the offset so every update is
/// delivered to the relay once.
pub struct TelegramUpdates {
    api: Arc<BotApiClient>,
    next_offset: Option<i64>,
}

impl TelegramUpdates {
    pub fn new(api: Arc<BotApiClient>) -> Self {
        Self {
            api,
            next_offset: None,
        }
    }
}

impl InboundSource for TelegramUpdates {
    fn next_batch(&mut self) -> Result<Option<Vec<InboundMessage>>> {
        let updates = self
            .api
            .get_updates(self.next_offset)
            .context("telegram getUpdates failed")?;

        if let Some(last) = updates.iter().map(|update| update.update_id).max() {
            self.next_offset = Some(last + 1);
            tracing::debug!(
                code = TELEGRAM_UPDATES_RECEIVED,
                count = updates.len(),
                next_offset = last + 1,
                "telegram updates received"
            );
        }

        Ok(Some(to_inbound_messages(updates)))
    }
}

/// Updates that carry no message (edits, channel posts) are dropped here;
/// messages without text are kept so the dispatcher can ignore them.
fn to_inbound_messages(updates: Vec<Update>) -> Vec<InboundMessage> {
    updates
        .into_iter()
        .filter_map(|update| update.message)
        .map(|message| InboundMessage {
            session: SessionId(message.chat.id),
            text: message.text,
        })
        .collect()
}

pub struct TelegramReplies {
    api: Arc<BotApiClient>,
}

impl TelegramReplies {
    pub fn new(api: Arc<BotApiClient>) -> Self {
        Self { api }
    }
}

impl ReplySink for TelegramReplies {
    /// Long replies go out as several messages; the menu rides on the last.
    fn send_reply(&self, session: SessionId, reply: &Reply) -> Result<()> {
        let chunks = split_message(&reply.text, MESSAGE_TEXT_LIMIT);
        let last = chunks.len().saturating_sub(1);

        for (index, chunk) in chunks.iter().enumerate() {
            let menu = if index == last {
                reply.menu.as_ref()
            } else {
                None
            };
            self.api
                .send_message(session.0, chunk, menu)
                .with_context(|| format!("telegram sendMessage to chat {session} failed"))?;
        }
        Ok(())
    }
}

/// Packs whole lines into chunks of at most `limit` characters. A single
/// line longer than `limit` is cut on character boundaries.
fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_owned()];
    }

    let mut chunks = Vec::new();
    let mut current: Option<(String, usize)> = None;

    for piece in text.split('\n').flat_map(|line| split_long_line(line, limit)) {
        let piece_len = piece.chars().count();
        current = match current.take() {
            Some((mut chunk, len)) if len + 1 + piece_len <= limit => {
                chunk.push('\n');
                chunk.push_str(&piece);
                Some((chunk, len + 1 + piece_len))
            }
            Some((chunk, _)) => {
                chunks.push(chunk);
                Some((piece, piece_len))
            }
            None => Some((piece, piece_len)),
        };
    }

    chunks.extend(current.map(|(chunk, _)| chunk));
    chunks
}

fn split_long_line(line: &str, limit: usize) -> Vec<String> {
    if line.chars().count() <= limit {
        return vec![line.to_owned()];
    }

    line.chars()
        .collect::<Vec<_>>()
        .chunks(limit)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
