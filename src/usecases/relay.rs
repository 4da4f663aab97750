//! Pumps inbound transport messages through the dispatcher and sends replies.

use std::{collections::HashMap, thread, time::Duration};

use anyhow::Result;

use crate::domain::conversation::{InboundMessage, SessionId};

use super::{
    contracts::{InboundSource, ReplySink},
    dispatcher::Dispatcher,
};

const RELAY_POLL_FAILED: &str = "RELAY_POLL_FAILED";
const RELAY_REPLY_FAILED: &str = "RELAY_REPLY_FAILED";
const RELAY_WORKER_PANICKED: &str = "RELAY_WORKER_PANICKED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOptions {
    /// Pause after a failed poll before asking the transport again.
    pub error_backoff: Duration,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            error_backoff: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayStats {
    pub messages: usize,
    pub replies_sent: usize,
    pub reply_failures: usize,
}

impl RelayStats {
    fn absorb(&mut self, other: RelayStats) {
        self.messages += other.messages;
        self.replies_sent += other.replies_sent;
        self.reply_failures += other.reply_failures;
    }
}

/// Runs until the source reports it is exhausted.
pub fn run_relay(
    dispatcher: &Dispatcher,
    source: &mut dyn InboundSource,
    sink: &dyn ReplySink,
    options: &RelayOptions,
) -> Result<RelayStats> {
    let mut stats = RelayStats::default();

    loop {
        match source.next_batch() {
            Ok(Some(batch)) => stats.absorb(deliver_batch(dispatcher, sink, batch)),
            Ok(None) => break,
            Err(error) => {
                tracing::warn!(
                    code = RELAY_POLL_FAILED,
                    error = %error,
                    backoff_ms = options.error_backoff.as_millis() as u64,
                    "polling the transport failed"
                );
                thread::sleep(options.error_backoff);
            }
        }
    }

    tracing::info!(
        messages = stats.messages,
        replies_sent = stats.replies_sent,
        reply_failures = stats.reply_failures,
        "relay stopped"
    );
    Ok(stats)
}

/// Sessions in one batch are handled on separate threads; messages of the
/// same session keep their arrival order.
pub fn deliver_batch(
    dispatcher: &Dispatcher,
    sink: &dyn ReplySink,
    batch: Vec<InboundMessage>,
) -> RelayStats {
    let groups = group_by_session(batch);

    if groups.len() <= 1 {
        return groups
            .into_iter()
            .map(|(_, messages)| deliver_session(dispatcher, sink, messages))
            .fold(RelayStats::default(), |mut total, stats| {
                total.absorb(stats);
                total
            });
    }

    thread::scope(|scope| {
        let workers: Vec<_> = groups
            .into_iter()
            .map(|(session, messages)| {
                let worker = thread::Builder::new()
                    .name(format!("shiftlog-session-{session}"))
                    .spawn_scoped(scope, move || deliver_session(dispatcher, sink, messages));
                (session, worker)
            })
            .collect();

        let mut total = RelayStats::default();
        for (session, worker) in workers {
            match worker.map(|handle| handle.join()) {
                Ok(Ok(stats)) => total.absorb(stats),
                Ok(Err(_)) => tracing::error!(
                    code = RELAY_WORKER_PANICKED,
                    session = %session,
                    "session worker panicked"
                ),
                Err(error) => tracing::error!(
                    code = RELAY_WORKER_PANICKED,
                    session = %session,
                    error = %error,
                    "session worker could not be spawned"
                ),
            }
        }
        total
    })
}

fn deliver_session(
    dispatcher: &Dispatcher,
    sink: &dyn ReplySink,
    messages: Vec<InboundMessage>,
) -> RelayStats {
    let mut stats = RelayStats::default();

    for message in messages {
        stats.messages += 1;
        let Some(reply) = dispatcher.handle(&message) else {
            continue;
        };

        match sink.send_reply(message.session, &reply) {
            Ok(()) => stats.replies_sent += 1,
            Err(error) => {
                stats.reply_failures += 1;
                tracing::warn!(
                    code = RELAY_REPLY_FAILED,
                    session = %message.session,
                    error = %error,
                    "reply could not be delivered"
                );
            }
        }
    }

    stats
}

fn group_by_session(batch: Vec<InboundMessage>) -> Vec<(SessionId, Vec<InboundMessage>)> {
    let mut positions: HashMap<SessionId, usize> = HashMap::new();
    let mut groups: Vec<(SessionId, Vec<InboundMessage>)> = Vec::new();

    for message in batch {
        let index = *positions.entry(message.session).or_insert_with(|| {
            groups.push((message.session, Vec::new()));
            groups.len() - 1
        });
        groups[index].1.push(message);
    }

    groups
}
