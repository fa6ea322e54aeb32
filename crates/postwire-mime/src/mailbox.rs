//! Mailbox (display name + address).

use crate::encoding::{encode_rfc2047, needs_rfc2047, sanitize_header};
use crate::error::{Error, Result};
use std::fmt;

/// Characters that would end or split a `MAIL FROM`/`RCPT TO` line.
const ENVELOPE_FORBIDDEN: [char; 4] = ['\r', '\n', '<', '>'];

/// Mailbox: an optional display name and an address.
///
/// Immutable once built. A bare address is a mailbox without a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mailbox {
    name: Option<String>,
    address: String,
}

impl Mailbox {
    /// Creates a mailbox with just an address.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            name: None,
            address: address.into(),
        }
    }

    /// Creates a mailbox with a display name and address.
    ///
    /// An empty name is treated as no name.
    #[must_use]
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: (!name.is_empty()).then_some(name),
            address: address.into(),
        }
    }

    /// Returns the display name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns true if the address is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.address.trim().is_empty()
    }

    /// Checks that the address can be placed between `<` and `>` in an SMTP
    /// envelope command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the address contains CR, LF, `<`
    /// or `>`.
    pub fn validate(&self) -> Result<()> {
        if self.address.contains(ENVELOPE_FORBIDDEN) {
            return Err(Error::InvalidAddress(self.address.escape_debug().to_string()));
        }
        Ok(())
    }

    /// Formats the mailbox for a `From`/`To`/`Cc`/`Bcc` header.
    ///
    /// `"Name"<address>` for ASCII names, an RFC 2047 encoded word followed by
    /// `<address>` otherwise, and `<address>` when there is no name.
    #[must_use]
    pub fn to_header(&self) -> String {
        let address = sanitize_header(&self.address);
        match self.name.as_deref().map(sanitize_header) {
            Some(name) if needs_rfc2047(&name) => {
                format!("{}<{address}>", encode_rfc2047(&name, "utf-8"))
            }
            Some(name) => format!("\"{}\"<{address}>", name.replace('"', "\\\"")),
            None => format!("<{address}>"),
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "\"{name}\"<{}>", self.address),
            None => write!(f, "<{}>", self.address),
        }
    }
}

impl From<&str> for Mailbox {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for Mailbox {
    fn from(address: String) -> Self {
        Self::new(address)
    }
}
