//! In-memory transport for unit tests.

use super::Transport;
use crate::error::{Error, Result};
use std::collections::VecDeque;

/// Transport that replays scripted read chunks and records writes.
///
/// Each queued chunk is returned by one read (split if larger than the
/// buffer). An exhausted script reads as end of stream.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    chunks: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    reads: usize,
    tls: bool,
    upgrades: usize,
    closed: bool,
}

impl ScriptedTransport {
    pub fn new(chunks: &[&[u8]]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
            ..Self::default()
        }
    }

    pub const fn reads(&self) -> usize {
        self.reads
    }

    pub const fn upgrades(&self) -> usize {
        self.upgrades
    }

    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Everything written so far, as text.
    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }

    /// Written lines, without terminators.
    pub fn written_lines(&self) -> Vec<String> {
        self.written().split("\r\n").filter(|l| !l.is_empty()).map(String::from).collect()
    }
}

impl Transport for ScriptedTransport {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.closed {
            return Err(Error::NotConnected);
        }
        self.reads += 1;
        let Some(chunk) = self.chunks.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.chunks.push_front(chunk[n..].to_vec());
        }
        Ok(n)
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(Error::NotConnected);
        }
        self.written.extend_from_slice(data);
        Ok(())
    }

    async fn upgrade_to_tls(&mut self, _hostname: &str) -> Result<()> {
        if self.tls {
            return Err(Error::Protocol("Already using TLS".into()));
        }
        self.tls = true;
        self.upgrades += 1;
        Ok(())
    }

    fn is_tls(&self) -> bool {
        self.tls
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}
