//! SMTP command builder.

use crate::types::AuthMechanism;
use std::fmt;

/// SMTP command.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO - Extended greeting
    Ehlo {
        /// Domain announced to the server
        domain: String,
    },
    /// STARTTLS - Upgrade to TLS
    StartTls,
    /// AUTH - Begin authentication
    Auth {
        /// Authentication mechanism
        mechanism: AuthMechanism,
    },
    /// Base64 line answering a 334 challenge
    AuthResponse(String),
    /// MAIL FROM - Start mail transaction
    MailFrom {
        /// Sender address
        from: String,
    },
    /// RCPT TO - Add recipient
    RcptTo {
        /// Recipient address
        to: String,
    },
    /// DATA - Begin message data
    Data,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Serializes the command to bytes, including the trailing CRLF.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        match self {
            Self::Ehlo { domain } => {
                buf.extend_from_slice(b"EHLO ");
                buf.extend_from_slice(domain.as_bytes());
            }
            Self::StartTls => {
                buf.extend_from_slice(b"STARTTLS");
            }
            Self::Auth { mechanism } => {
                buf.extend_from_slice(b"AUTH ");
                buf.extend_from_slice(mechanism.as_str().as_bytes());
            }
            Self::AuthResponse(encoded) => {
                buf.extend_from_slice(encoded.as_bytes());
            }
            Self::MailFrom { from } => {
                buf.extend_from_slice(b"MAIL FROM:<");
                buf.extend_from_slice(from.as_bytes());
                buf.push(b'>');
            }
            Self::RcptTo { to } => {
                buf.extend_from_slice(b"RCPT TO:<");
                buf.extend_from_slice(to.as_bytes());
                buf.push(b'>');
            }
            Self::Data => {
                buf.extend_from_slice(b"DATA");
            }
            Self::Quit => {
                buf.extend_from_slice(b"QUIT");
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}

// Credentials must never reach the logs.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthResponse(_) => f.write_str("<redacted>"),
            other => {
                let line = other.serialize();
                f.write_str(String::from_utf8_lossy(&line).trim_end())
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({self})")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_ehlo_command() {
        let cmd = Command::Ehlo {
            domain: "smtp.example.com".to_string(),
        };
        assert_eq!(cmd.serialize(), b"EHLO smtp.example.com\r\n");
    }

    #[test]
    fn test_starttls_command() {
        assert_eq!(Command::StartTls.serialize(), b"STARTTLS\r\n");
    }

    #[test]
    fn test_auth_commands() {
        let login = Command::Auth {
            mechanism: AuthMechanism::Login,
        };
        let plain = Command::Auth {
            mechanism: AuthMechanism::Plain,
        };
        assert_eq!(login.serialize(), b"AUTH LOGIN\r\n");
        assert_eq!(plain.serialize(), b"AUTH PLAIN\r\n");
    }

    #[test]
    fn test_auth_response() {
        let cmd = Command::AuthResponse("dXNlcg==".to_string());
        assert_eq!(cmd.serialize(), b"dXNlcg==\r\n");
    }

    #[test]
    fn test_mail_from() {
        let cmd = Command::MailFrom {
            from: "sender@example.com".to_string(),
        };
        assert_eq!(cmd.serialize(), b"MAIL FROM:<sender@example.com>\r\n");
    }

    #[test]
    fn test_rcpt_to() {
        let cmd = Command::RcptTo {
            to: "recipient@example.com".to_string(),
        };
        assert_eq!(cmd.serialize(), b"RCPT TO:<recipient@example.com>\r\n");
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::Data.serialize(), b"DATA\r\n");
        assert_eq!(Command::Quit.serialize(), b"QUIT\r\n");
    }

    #[test]
    fn test_display_redacts_credentials() {
        let cmd = Command::AuthResponse("c2VjcmV0".to_string());
        assert_eq!(cmd.to_string(), "<redacted>");
        assert_eq!(format!("{cmd:?}"), "Command(<redacted>)");
        assert_eq!(Command::Data.to_string(), "DATA");
    }
}
