//! Line-oriented transport over stdin/stdout for local use.

use std::{
    io::{BufRead, Write},
    sync::{Mutex, PoisonError},
};

use anyhow::{Context, Result};

use crate::{
    domain::conversation::{InboundMessage, Reply, SessionId},
    usecases::contracts::{InboundSource, ReplySink},
};

/// Every input line becomes one message from a single session.
pub struct ConsoleSource<R> {
    reader: R,
    session: SessionId,
}

impl<R: BufRead> ConsoleSource<R> {
    pub fn new(reader: R, session: SessionId) -> Self {
        Self { reader, session }
    }
}

impl<R: BufRead> InboundSource for ConsoleSource<R> {
    fn next_batch(&mut self) -> Result<Option<Vec<InboundMessage>>> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .context("failed to read console input")?;

        if read == 0 {
            return Ok(None);
        }

        let text = line.trim_end_matches(['\r', '\n']);
        Ok(Some(vec![InboundMessage::text(self.session, text)]))
    }
}

pub struct ConsoleSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> ReplySink for ConsoleSink<W> {
    fn send_reply(&self, _session: SessionId, reply: &Reply) -> Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        writeln!(writer, "{}", reply.text)?;
        if let Some(menu) = &reply.menu {
            for row in &menu.rows {
                writeln!(writer, "  [ {} ]", row.join(" | "))?;
            }
        }
        writer.flush()?;

        Ok(())
    }
}
