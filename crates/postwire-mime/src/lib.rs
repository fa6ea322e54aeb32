//! # postwire-mime
//!
//! Message model and MIME serializer for SMTP submission.
//!
//! ## Features
//!
//! - **Message model**: sender, To/Cc/Bcc recipients, subject, plain or HTML
//!   body, attachments and priority
//! - **Serialization**: headers, `multipart/mixed` with base64 attachments and
//!   the terminating `.` line, ready to be written after `DATA`
//! - **Encoding**: Base64 with line wrapping, RFC 2047 header encoding and
//!   dot-stuffing of body lines
//!
//! ## Quick Start
//!
//! ```ignore
//! use postwire_mime::{Attachment, Mailbox, Message, serialize};
//!
//! let message = Message::new(Mailbox::with_name("Alice", "alice@example.com"), "Report", "See attached.")
//!     .to("bob@example.com")
//!     .attach(Attachment::new("report.csv", b"a,b\n1,2\n".to_vec()));
//!
//! let payload = serialize(&message)?;
//! assert!(payload.ends_with("\r\n.\r\n"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod mailbox;
mod message;
mod serialize;

pub mod encoding;

pub use error::{Error, Result};
pub use mailbox::Mailbox;
pub use message::{Attachment, Message, Priority};
pub use serialize::{CHARSET, Serializer, generate_boundary, serialize};
