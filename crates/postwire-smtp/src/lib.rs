//! # postwire-smtp
//!
//! An async SMTP submission client that carries one message per session.
//!
//! ## Features
//!
//! - **Tolerant reply parsing**: byte-level state machine over multi-line replies
//! - **TLS support**: Both implicit TLS (port 465) and STARTTLS
//! - **Authentication**: LOGIN (preferred) and PLAIN
//! - **Recipient policies**: best effort per list, or strict
//! - **MIME**: plain or HTML bodies with base64 attachments via [`postwire_mime`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use postwire_smtp::{Config, Mailbox, Message, SendOutcome};
//!
//! #[tokio::main]
//! async fn main() -> postwire_smtp::Result<()> {
//!     let config = Config::builder("smtp.example.com")
//!         .tls(true)
//!         .credentials("user@example.com", "password")
//!         .build();
//!
//!     let message = Message::new(
//!         Mailbox::with_name("Sender", "user@example.com"),
//!         "Hello",
//!         "Hello, World!",
//!     )
//!     .to("recipient@example.com");
//!
//!     let outcome = postwire_smtp::send(config, &message).await?;
//!     assert_eq!(outcome, SendOutcome::Ok);
//!     Ok(())
//! }
//! ```
//!
//! ## Session States
//!
//! ```text
//! Idle ── connect() ──→ Connected ── authenticate() ──→ Authenticated
//!                                                            │
//!                        Closed ←──────── send_message() ────┘
//! ```
//!
//! ## Modules
//!
//! - [`auth`]: EHLO, STARTTLS and AUTH negotiation
//! - [`command`]: SMTP command serialization
//! - [`config`]: Connection settings
//! - [`connection`]: Transports and the request/reply protocol
//! - [`parser`]: Reply parser
//! - [`session`]: Session controller
//! - [`types`]: Replies and mechanisms

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod command;
pub mod config;
pub mod connection;
mod error;
pub mod parser;
pub mod session;
pub mod types;

pub use config::{Config, ConfigBuilder, RecipientPolicy};
pub use connection::{Connect, Protocol, SmtpStream, Transport};
pub use error::{Error, Result};
pub use parser::ResponseParser;
pub use postwire_mime::{Attachment, Mailbox, Message, Priority};
pub use session::{SendOutcome, Session, SessionState, send};
pub use types::{AuthMechanism, ReplyCode, Response, ResponseLine};
