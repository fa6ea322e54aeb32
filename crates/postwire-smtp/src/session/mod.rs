//! Session controller.
//!
//! Drives one message through connect, negotiation, `MAIL FROM`, `RCPT TO`,
//! `DATA`, the payload and `QUIT`, mapping each step onto a [`SendOutcome`].
//!
//! ```text
//! Idle ── connect ──→ Connected ── authenticate ──→ Authenticated
//!                                                        │
//!                          Closed ←── QUIT 221 ←── send_message
//!
//! any step ──→ Failed(outcome)
//! ```
//!
//! Transport errors never escape [`Session::send_message`]; they are logged
//! and reported as the outcome of the step they interrupted. The transport is
//! closed on every exit path once a message has been attempted, and dropping
//! a session releases its socket.

use crate::auth::negotiate;
use crate::command::Command;
use crate::config::{Config, RecipientPolicy};
use crate::connection::{Connect, Protocol, SmtpStream, Transport};
use crate::error::{Error, Result};
use crate::types::{ReplyCode, Response};
use postwire_mime::{Message, Serializer};
use std::fmt;
use tracing::{info, warn};

/// Result of a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message was accepted and the session closed cleanly.
    Ok,
    /// The connection could not be opened or the greeting was not 220.
    ConnectionFailed,
    /// Negotiation or credentials were rejected.
    AuthenticationFailed,
    /// `MAIL FROM`, `RCPT TO` (strict policy), `DATA` or the payload was
    /// rejected.
    CouldNotCreateMail,
    /// The server did not answer `QUIT` with 221.
    CouldNotCloseTransmissionChannel,
}

impl SendOutcome {
    /// Returns true for [`SendOutcome::Ok`].
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Ok => "message sent",
            Self::ConnectionFailed => "connection failed",
            Self::AuthenticationFailed => "authentication failed",
            Self::CouldNotCreateMail => "could not create mail",
            Self::CouldNotCloseTransmissionChannel => "could not close transmission channel",
        };
        f.write_str(text)
    }
}

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection yet.
    Idle,
    /// Greeting received.
    Connected,
    /// Negotiation finished; mail may be sent.
    Authenticated,
    /// Message delivered and connection closed.
    Closed,
    /// A step failed; never holds [`SendOutcome::Ok`].
    Failed(SendOutcome),
}

/// One SMTP session carrying one message.
pub struct Session<T = SmtpStream> {
    config: Config,
    protocol: Option<Protocol<T>>,
    state: SessionState,
}

impl<T> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Session<T> {
    /// Creates an idle session.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            protocol: None,
            state: SessionState::Idle,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true once the greeting was accepted.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected | SessionState::Authenticated)
    }

    /// Returns true once negotiation succeeded.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated)
    }

    /// Returns the transport, while connected.
    #[must_use]
    pub fn transport(&self) -> Option<&T> {
        self.protocol.as_ref().map(Protocol::transport)
    }

    /// Starts the session on an already opened transport.
    ///
    /// Any previous connection is closed first. Returns true if the server
    /// greeted with 220.
    pub async fn connect_with(&mut self, transport: T) -> bool {
        self.connect_protocol(Protocol::new(transport)).await
    }

    /// Like [`Session::connect_with`] with a custom read buffer size.
    pub async fn connect_with_buffer_size(&mut self, transport: T, buffer_size: usize) -> bool {
        self.connect_protocol(Protocol::with_buffer_size(transport, buffer_size))
            .await
    }

    async fn connect_protocol(&mut self, mut protocol: Protocol<T>) -> bool {
        self.release().await;

        let greeting = protocol.read_response().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read greeting");
            Response::default()
        });

        if greeting.contains_status(ReplyCode::SERVICE_READY) {
            info!(host = %self.config.host, text = %greeting.text(), "Connected");
            self.protocol = Some(protocol);
            self.state = SessionState::Connected;
            true
        } else {
            warn!(host = %self.config.host, code = ?greeting.code(), "Server did not greet with 220");
            protocol.close().await;
            self.state = SessionState::Failed(SendOutcome::ConnectionFailed);
            false
        }
    }

    /// Runs EHLO / STARTTLS / AUTH negotiation.
    ///
    /// Returns `Ok(false)` if the server rejected the credentials or offers
    /// no supported mechanism. The connection is closed on failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] before a successful connect, and
    /// transport or TLS errors raised during negotiation.
    pub async fn authenticate(&mut self) -> Result<bool> {
        if self.is_authenticated() {
            return Ok(true);
        }
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        let Some(protocol) = self.protocol.as_mut() else {
            return Err(Error::NotConnected);
        };

        match negotiate(protocol, &self.config).await {
            Ok(true) => {
                self.state = SessionState::Authenticated;
                Ok(true)
            }
            Ok(false) => {
                self.fail(SendOutcome::AuthenticationFailed).await;
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "Negotiation failed");
                self.fail(SendOutcome::AuthenticationFailed).await;
                Err(e)
            }
        }
    }

    /// Sends one message on a connected session.
    ///
    /// Authenticates first if needed. The connection is closed afterwards
    /// whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Message`] if the message has no sender, no
    /// recipients, or an address that could break an envelope command;
    /// nothing is sent in that case. Every other failure is
    /// reported through the returned [`SendOutcome`].
    pub async fn send_message(&mut self, message: &Message) -> Result<SendOutcome> {
        let payload = Serializer::new().serialize(message)?;

        if !self.is_connected() {
            warn!("send_message called without a connection");
            return Ok(SendOutcome::ConnectionFailed);
        }

        if !self.is_authenticated() && !self.authenticate().await.unwrap_or(false) {
            return Ok(SendOutcome::AuthenticationFailed);
        }

        let Some(protocol) = self.protocol.as_mut() else {
            return Ok(SendOutcome::ConnectionFailed);
        };

        let outcome = transact(protocol, self.config.recipient_policy, message, &payload).await;
        if outcome.is_ok() {
            info!(from = %message.from.address(), "Message accepted");
            self.release().await;
            self.state = SessionState::Closed;
        } else {
            self.fail(outcome).await;
        }
        Ok(outcome)
    }

    /// Closes the connection. Safe to call at any time, any number of times.
    pub async fn close(&mut self) {
        self.release().await;
        if !matches!(self.state, SessionState::Failed(_)) {
            self.state = SessionState::Closed;
        }
    }

    async fn release(&mut self) {
        if let Some(mut protocol) = self.protocol.take() {
            protocol.close().await;
        }
    }

    async fn fail(&mut self, outcome: SendOutcome) {
        warn!(%outcome, "Session failed");
        self.release().await;
        self.state = SessionState::Failed(outcome);
    }
}

impl<T: Connect> Session<T> {
    /// Opens the connection described by the configuration.
    ///
    /// An existing connection is closed first. Returns true if the server
    /// greeted with 220.
    pub async fn connect(&mut self) -> bool {
        match T::open(&self.config).await {
            Ok(transport) => self.connect_with(transport).await,
            Err(e) => {
                warn!(error = %e, "Connection failed");
                self.release().await;
                self.state = SessionState::Failed(SendOutcome::ConnectionFailed);
                false
            }
        }
    }

    /// Connects if needed, then sends the message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Message`] if the message fails validation, before
    /// any connection is opened.
    pub async fn deliver(&mut self, message: &Message) -> Result<SendOutcome> {
        message.validate()?;
        if !self.is_connected() && !self.connect().await {
            return Ok(SendOutcome::ConnectionFailed);
        }
        self.send_message(message).await
    }
}

/// Sends one message with a fresh session over TCP.
///
/// # Errors
///
/// Returns [`Error::Message`] if the message fails validation.
pub async fn send(config: Config, message: &Message) -> Result<SendOutcome> {
    let mut session: Session = Session::new(config);
    let outcome = session.deliver(message).await;
    session.close().await;
    outcome
}

/// MAIL FROM, RCPT TO for each list, DATA, payload, QUIT.
async fn transact<T: Transport>(
    protocol: &mut Protocol<T>,
    policy: RecipientPolicy,
    message: &Message,
    payload: &str,
) -> SendOutcome {
    let from = Command::MailFrom {
        from: message.from.address().to_string(),
    };
    if !exchange(protocol, &from).await.contains_status(ReplyCode::OK) {
        return SendOutcome::CouldNotCreateMail;
    }

    for (list, recipients) in [("to", &message.to), ("cc", &message.cc), ("bcc", &message.bcc)] {
        for mailbox in recipients.iter().filter(|m| !m.is_empty()) {
            let rcpt = Command::RcptTo {
                to: mailbox.address().to_string(),
            };
            let reply = exchange(protocol, &rcpt).await;
            if !reply.contains_status(ReplyCode::OK) {
                warn!(list, recipient = %mailbox.address(), code = ?reply.code(), "Recipient rejected");
                match policy {
                    RecipientPolicy::Strict => return SendOutcome::CouldNotCreateMail,
                    // Skips the rest of this list only.
                    RecipientPolicy::BestEffort => break,
                }
            }
        }
    }

    if !exchange(protocol, &Command::Data).await.contains_status(ReplyCode::START_DATA) {
        return SendOutcome::CouldNotCreateMail;
    }

    let accepted = protocol.send_raw(payload.as_bytes()).await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to send message payload");
        Response::default()
    });
    if !accepted.contains_status(ReplyCode::OK) {
        warn!(code = ?accepted.code(), text = %accepted.text(), "Message rejected");
        return SendOutcome::CouldNotCreateMail;
    }

    if !exchange(protocol, &Command::Quit).await.contains_status(ReplyCode::CLOSING) {
        return SendOutcome::CouldNotCloseTransmissionChannel;
    }

    SendOutcome::Ok
}

/// Sends a command; a transport failure reads as an empty reply.
async fn exchange<T: Transport>(protocol: &mut Protocol<T>, command: &Command) -> Response {
    match protocol.send(command).await {
        Ok(reply) => {
            if reply.code().is_some_and(|c| c.is_transient() || c.is_permanent()) {
                warn!(command = %command, code = ?reply.code(), text = %reply.text(), "Command failed");
            }
            reply
        }
        Err(e) => {
            warn!(command = %command, error = %e, "Exchange failed");
            Response::default()
        }
    }
}
