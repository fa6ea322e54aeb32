//! Error types for SMTP operations.

use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Could not open the TCP connection.
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        /// `host:port` that was dialed.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// TLS handshake failed.
    #[error("TLS error: {0}")]
    Tls(#[source] io::Error),

    /// Hostname is not a valid TLS server name.
    #[error("Invalid hostname: {0}")]
    InvalidHostname(String),

    /// Protocol error (unexpected transport state).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Operation requires an open connection.
    #[error("Client is not connected")]
    NotConnected,

    /// Server kept offering STARTTLS on an encrypted connection.
    #[error("Server offered STARTTLS again after the TLS upgrade")]
    StartTlsRepeated,

    /// Message failed validation before anything was sent.
    #[error("Invalid message: {0}")]
    Message(#[from] postwire_mime::Error),
}

impl Error {
    /// Returns true if the error was raised before any network I/O.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Message(_))
    }
}
