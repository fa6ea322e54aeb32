//! Command/response exchange over a [`Transport`].

use super::Transport;
use crate::command::Command;
use crate::error::Result;
use crate::parser::ResponseParser;
use crate::types::Response;
use tracing::debug;

/// Size of the read buffer that defines "end of reply".
pub const READ_BUFFER_SIZE: usize = 1024;

/// Half-duplex SMTP exchange: one command out, one reply back.
#[derive(Debug)]
pub struct Protocol<T> {
    transport: T,
    buffer_size: usize,
}

impl<T: Transport> Protocol<T> {
    /// Wraps a transport using the default read buffer size.
    pub const fn new(transport: T) -> Self {
        Self::with_buffer_size(transport, READ_BUFFER_SIZE)
    }

    /// Wraps a transport with a custom read buffer size.
    pub const fn with_buffer_size(transport: T, buffer_size: usize) -> Self {
        Self {
            transport,
            buffer_size,
        }
    }

    /// Returns the underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a command and reads the reply.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or reading fails.
    pub async fn send(&mut self, command: &Command) -> Result<Response> {
        debug!(command = %command, "C:");
        self.transport.write_all(&command.serialize()).await?;
        self.read_response().await
    }

    /// Sends a text line, appending CRLF, and reads the reply.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or reading fails.
    pub async fn send_line(&mut self, line: &str) -> Result<Response> {
        debug!(command = line, "C:");
        let mut data = Vec::with_capacity(line.len() + 2);
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(b"\r\n");
        self.transport.write_all(&data).await?;
        self.read_response().await
    }

    /// Sends bytes as they are (no terminator added) and reads the reply.
    ///
    /// Used for the message payload, which carries its own `.` line.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or reading fails.
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<Response> {
        debug!(bytes = data.len(), "C: <message payload>");
        self.transport.write_all(data).await?;
        self.read_response().await
    }

    /// Reads one reply.
    ///
    /// Chunks are read until the transport returns fewer bytes than the
    /// buffer holds, or none at all. A full buffer means more may follow, so
    /// another read is issued. Continuation markers are not consulted.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub async fn read_response(&mut self) -> Result<Response> {
        let mut parser = ResponseParser::new();
        let mut buf = vec![0_u8; self.buffer_size];

        loop {
            let n = self.transport.read_chunk(&mut buf).await?;
            if n == 0 {
                break;
            }
            parser.feed(&buf[..n]);
            if n < buf.len() {
                break;
            }
        }

        let response = parser.finish();
        for line in response.lines() {
            debug!(code = ?line.code.map(|c| c.as_u16()), text = %line.text, "S:");
        }
        Ok(response)
    }

    /// Upgrades the transport to TLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the handshake fails.
    pub async fn upgrade_to_tls(&mut self, hostname: &str) -> Result<()> {
        self.transport.upgrade_to_tls(hostname).await
    }

    /// Closes the transport.
    pub async fn close(&mut self) {
        self.transport.close().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::connection::SmtpStream;
    use crate::connection::testing::ScriptedTransport;
    use crate::types::ReplyCode;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_send_appends_crlf() {
        let mock = Builder::new().write(b"NOOP\r\n").read(b"250 OK\r\n").build();
        let mut protocol = Protocol::new(SmtpStream::plain(mock));

        let response = protocol.send_line("NOOP").await.unwrap();
        assert!(response.contains_status(ReplyCode::OK));
        assert!(response.contains_text("OK"));
    }

    #[tokio::test]
    async fn test_send_command() {
        let mock = Builder::new().write(b"QUIT\r\n").read(b"221 Bye\r\n").build();
        let mut protocol = Protocol::new(SmtpStream::plain(mock));

        let response = protocol.send(&Command::Quit).await.unwrap();
        assert!(response.contains_status(ReplyCode::CLOSING));
    }

    #[tokio::test]
    async fn test_send_raw_adds_nothing() {
        let mock = Builder::new().write(b"body\r\n.\r\n").read(b"250 Queued\r\n").build();
        let mut protocol = Protocol::new(SmtpStream::plain(mock));

        let response = protocol.send_raw(b"body\r\n.\r\n").await.unwrap();
        assert_eq!(response.text(), "Queued");
    }

    #[tokio::test]
    async fn test_short_chunk_ends_reply() {
        let transport = ScriptedTransport::new(&[b"250 OK\r\n", b"221 Bye\r\n"]);
        let mut protocol = Protocol::new(transport);

        let first = protocol.read_response().await.unwrap();
        assert_eq!(first.lines().len(), 1);
        let second = protocol.read_response().await.unwrap();
        assert!(second.contains_status(ReplyCode::CLOSING));
    }

    #[tokio::test]
    async fn test_full_chunk_reads_again_until_empty() {
        let data: &[u8] = b"250-Hello\r\n250 End\r\n";
        let transport = ScriptedTransport::new(&[data, b""]);
        let mut protocol = Protocol::with_buffer_size(transport, data.len());

        let response = protocol.read_response().await.unwrap();
        assert_eq!(response.lines().len(), 2);
        assert_eq!(response.lines()[1].text, "End");
        // The full chunk forced a second read, which hit the empty chunk.
        assert_eq!(protocol.transport().reads(), 2);
    }

    #[tokio::test]
    async fn test_full_chunk_continues_into_next_chunk() {
        let data: &[u8] = b"250-Hello\r\n250-Mid";
        let transport = ScriptedTransport::new(&[data, b"dle\r\n250 End\r\n"]);
        let mut protocol = Protocol::with_buffer_size(transport, data.len());

        let response = protocol.read_response().await.unwrap();
        let texts: Vec<&str> = response.lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "Middle", "End"]);
    }

    #[tokio::test]
    async fn test_no_data_is_empty_response() {
        let mut protocol = Protocol::new(ScriptedTransport::new(&[]));
        let response = protocol.read_response().await.unwrap();
        assert!(response.is_empty());
    }
}
