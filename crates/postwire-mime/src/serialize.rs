//! Renders a [`Message`] into the DATA payload.
//!
//! The output is the complete transmission body: headers, the text part,
//! base64 attachments between multipart boundaries, and the terminating
//! `.` line.

use crate::encoding::{
    CRLF, dot_stuff, encode_base64_wrapped, encode_rfc2047, needs_rfc2047, sanitize_header,
};
use crate::error::Result;
use crate::mailbox::Mailbox;
use crate::message::{Attachment, Message};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fmt::Write as _;

/// `Date` header format. The timestamp is always rendered in UTC.
const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S +0000";

/// Charset announced for text bodies.
pub const CHARSET: &str = "utf-8";

/// Prefix of every generated boundary.
///
/// `_` is outside the base64 alphabet, so a boundary can never occur inside
/// an encoded attachment.
const BOUNDARY_PREFIX: &str = "_MESSAGE_PART_";

/// Generates a fresh multipart boundary.
#[must_use]
pub fn generate_boundary() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    format!("{BOUNDARY_PREFIX}{token}")
}

/// Message serializer.
///
/// Captures the send time and boundary when created so the same values are
/// used for the whole message.
#[derive(Debug, Clone)]
pub struct Serializer {
    date: DateTime<Utc>,
    boundary: String,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    /// Creates a serializer stamped with the current time and a random boundary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            date: Utc::now(),
            boundary: generate_boundary(),
        }
    }

    /// Overrides the `Date` header timestamp.
    #[must_use]
    pub const fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Overrides the multipart boundary.
    #[must_use]
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    /// Returns the multipart boundary.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Serializes the message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message has no sender or no recipients.
    pub fn serialize(&self, message: &Message) -> Result<String> {
        message.validate()?;

        let mut out = String::with_capacity(message.body.len() + 512);
        self.write_headers(&mut out, message);

        let multipart = !message.attachments.is_empty();
        if multipart {
            let _ = write!(
                out,
                "Content-Type: multipart/mixed; boundary=\"{}\"{CRLF}{CRLF}",
                self.boundary
            );
            let _ = write!(out, "--{}{CRLF}", self.boundary);
        }

        if message.body_is_html() {
            let _ = write!(out, "Content-Type: text/html{CRLF}");
        } else {
            let _ = write!(out, "Content-Type: text/plain; charset={CHARSET}{CRLF}");
        }
        out.push_str(CRLF);
        out.push_str(&dot_stuff(&message.body));
        out.push_str(CRLF);
        out.push_str(CRLF);

        if multipart {
            for attachment in &message.attachments {
                self.write_attachment(&mut out, attachment);
            }
            let _ = write!(out, "--{}--{CRLF}", self.boundary);
        }

        out.push('.');
        out.push_str(CRLF);
        Ok(out)
    }

    fn write_headers(&self, out: &mut String, message: &Message) {
        let _ = write!(out, "Date: {}{CRLF}", self.date.format(DATE_FORMAT));
        let _ = write!(out, "X-Priority: {}{CRLF}", message.priority.x_priority());
        let _ = write!(out, "From: {}{CRLF}", message.from.to_header());

        for (name, list) in [("To", &message.to), ("Cc", &message.cc), ("Bcc", &message.bcc)] {
            if let Some(value) = join_mailboxes(list) {
                let _ = write!(out, "{name}: {value}{CRLF}");
            }
        }

        let subject = encode_rfc2047(&sanitize_header(&message.subject), CHARSET);
        let _ = write!(out, "Subject: {subject}{CRLF}");
        let _ = write!(out, "MIME-Version: 1.0{CRLF}");
    }

    fn write_attachment(&self, out: &mut String, attachment: &Attachment) {
        let filename = sanitize_header(&attachment.filename);
        let filename = if needs_rfc2047(&filename) {
            encode_rfc2047(&filename, CHARSET)
        } else {
            filename.replace('"', "\\\"")
        };
        let disposition = if attachment.inline { "inline" } else { "attachment" };

        let _ = write!(out, "--{}{CRLF}", self.boundary);
        let _ = write!(out, "Content-Type: application/octet-stream; name=\"{filename}\"{CRLF}");
        let _ = write!(out, "Content-Transfer-Encoding: base64{CRLF}");
        if let Some(id) = &attachment.content_id {
            let _ = write!(out, "Content-ID: <{}>{CRLF}", sanitize_header(id));
        }
        let _ = write!(out, "Content-Disposition: {disposition}; filename=\"{filename}\"{CRLF}");
        out.push_str(CRLF);
        out.push_str(&encode_base64_wrapped(&attachment.content));
        out.push_str(CRLF);
    }
}

/// Joins non-empty mailboxes with `, `; `None` when nothing is left.
fn join_mailboxes(list: &[Mailbox]) -> Option<String> {
    let parts: Vec<String> = list
        .iter()
        .filter(|m| !m.is_empty())
        .map(Mailbox::to_header)
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

/// Serializes a message with the current time and a fresh boundary.
///
/// # Errors
///
/// Returns an error if the message has no sender or no recipients.
pub fn serialize(message: &Message) -> Result<String> {
    Serializer::new().serialize(message)
}
