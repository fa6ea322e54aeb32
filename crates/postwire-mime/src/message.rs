//! Outgoing message model.

use crate::error::{Error, Result};
use crate::mailbox::Mailbox;

/// Message priority, emitted as the `X-Priority` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Priority {
    /// Low priority (`X-Priority: 5`).
    Low,
    /// Normal priority (`X-Priority: 3`).
    #[default]
    Normal,
    /// High priority (`X-Priority: 1`).
    High,
}

impl Priority {
    /// Returns the `X-Priority` header value.
    #[must_use]
    pub const fn x_priority(self) -> &'static str {
        match self {
            Self::High => "1",
            Self::Normal => "3",
            Self::Low => "5",
        }
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name shown to the recipient.
    pub filename: String,
    /// Raw file content.
    pub content: Vec<u8>,
    /// Content-ID for inline references (`cid:`).
    pub content_id: Option<String>,
    /// Display inline instead of as a download.
    pub inline: bool,
}

impl Attachment {
    /// Creates a regular (non-inline) attachment.
    #[must_use]
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            content_id: None,
            inline: false,
        }
    }

    /// Creates an inline attachment referenced by `content_id`.
    #[must_use]
    pub fn inline(
        filename: impl Into<String>,
        content: impl Into<Vec<u8>>,
        content_id: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            content_id: Some(content_id.into()),
            inline: true,
        }
    }
}

/// An email message to send.
#[derive(Debug, Clone, Default)]
pub struct Message {
    /// Sender.
    pub from: Mailbox,
    /// Recipients.
    pub to: Vec<Mailbox>,
    /// CC recipients.
    pub cc: Vec<Mailbox>,
    /// BCC recipients.
    pub bcc: Vec<Mailbox>,
    /// Subject line.
    pub subject: String,
    /// Body text (plain or HTML).
    pub body: String,
    /// Send the body as `text/html`.
    pub is_html: bool,
    /// Attachments.
    pub attachments: Vec<Attachment>,
    /// Priority.
    pub priority: Priority,
}

impl Message {
    /// Creates a new message.
    #[must_use]
    pub fn new(
        from: impl Into<Mailbox>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<Mailbox>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, recipient: impl Into<Mailbox>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, recipient: impl Into<Mailbox>) -> Self {
        self.bcc.push(recipient.into());
        self
    }

    /// Marks the body as HTML.
    #[must_use]
    pub const fn html(mut self, is_html: bool) -> Self {
        self.is_html = is_html;
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Returns true if the body should be sent as `text/html`.
    #[must_use]
    pub fn body_is_html(&self) -> bool {
        self.is_html || self.body.starts_with("<html>")
    }

    /// Returns true if the message has at least one recipient.
    #[must_use]
    pub fn has_recipients(&self) -> bool {
        [&self.to, &self.cc, &self.bcc]
            .iter()
            .any(|list| list.iter().any(|m| !m.is_empty()))
    }

    /// Checks the invariants required before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSender`] if the sender address is empty,
    /// [`Error::NoRecipients`] if To, Cc and Bcc are all empty, and
    /// [`Error::InvalidAddress`] if the sender or any recipient address could
    /// break an envelope command.
    pub fn validate(&self) -> Result<()> {
        if self.from.is_empty() {
            return Err(Error::MissingSender);
        }
        if !self.has_recipients() {
            return Err(Error::NoRecipients);
        }
        std::iter::once(&self.from)
            .chain(&self.to)
            .chain(&self.cc)
            .chain(&self.bcc)
            .filter(|mailbox| !mailbox.is_empty())
            .try_for_each(Mailbox::validate)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_header_values() {
        assert_eq!(Priority::High.x_priority(), "1");
        assert_eq!(Priority::Normal.x_priority(), "3");
        assert_eq!(Priority::Low.x_priority(), "5");
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn test_builder() {
        let message = Message::new("me@x.com", "Hi", "Body")
            .to("a@x.com")
            .cc(Mailbox::with_name("Bee", "b@x.com"))
            .bcc("c@x.com")
            .priority(Priority::High);

        assert_eq!(message.from.address(), "me@x.com");
        assert_eq!(message.to.len(), 1);
        assert_eq!(message.cc[0].name(), Some("Bee"));
        assert_eq!(message.bcc.len(), 1);
        assert_eq!(message.priority, Priority::High);
        assert!(message.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_sender() {
        let message = Message::new("", "Hi", "Body").to("a@x.com");
        assert_eq!(message.validate(), Err(Error::MissingSender));
    }

    #[test]
    fn test_validate_no_recipients() {
        let message = Message::new("me@x.com", "Hi", "Body");
        assert_eq!(message.validate(), Err(Error::NoRecipients));
    }

    #[test]
    fn test_validate_bcc_only_is_enough() {
        let message = Message::new("me@x.com", "Hi", "Body").bcc("hidden@x.com");
        assert!(message.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_line_breaks_in_recipient() {
        let message = Message::new("me@x.com", "Hi", "Body")
            .to("a@x.com>\r\nRCPT TO:<evil@attacker.com");
        assert_eq!(
            message.validate(),
            Err(Error::InvalidAddress("a@x.com>\\r\\nRCPT TO:<evil@attacker.com".to_string()))
        );
    }

    #[test]
    fn test_validate_checks_every_envelope_address() {
        let base = || Message::new("me@x.com", "Hi", "Body").to("a@x.com");
        assert!(base().validate().is_ok());
        assert!(matches!(base().cc("c@x.com\n").validate(), Err(Error::InvalidAddress(_))));
        assert!(matches!(base().bcc("<b@x.com>").validate(), Err(Error::InvalidAddress(_))));
        let sender = Message::new("me@x.com\rDATA", "Hi", "Body").to("a@x.com");
        assert!(matches!(sender.validate(), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_html_detection() {
        assert!(Message::new("me@x.com", "", "<html><body/></html>").body_is_html());
        assert!(Message::new("me@x.com", "", "<p>hi</p>").html(true).body_is_html());
        assert!(!Message::new("me@x.com", "", "<p>hi</p>").body_is_html());
    }

    #[test]
    fn test_inline_attachment() {
        let attachment = Attachment::inline("logo.png", vec![1, 2, 3], "logo@x");
        assert!(attachment.inline);
        assert_eq!(attachment.content_id.as_deref(), Some("logo@x"));
        assert!(!Attachment::new("a.txt", b"x".to_vec()).inline);
    }
}
