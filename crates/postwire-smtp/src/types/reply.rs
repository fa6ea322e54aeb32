//! SMTP reply types.

use std::fmt;

/// One line of a server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseLine {
    /// Reply code, `None` when the 3-byte prefix is not a number.
    pub code: Option<ReplyCode>,
    /// Text after the code and its separator.
    pub text: String,
}

impl ResponseLine {
    /// Creates a new response line.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // String is not const-compatible
    pub fn new(code: Option<ReplyCode>, text: String) -> Self {
        Self { code, text }
    }
}

/// One logical server reply, possibly spanning several lines.
///
/// An empty response means nothing was received: the connection was closed
/// or the exchange failed at the transport level. Every predicate treats it
/// as containing nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    lines: Vec<ResponseLine>,
}

impl Response {
    /// Creates a response from parsed lines.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec is not const-compatible
    pub fn new(lines: Vec<ResponseLine>) -> Self {
        Self { lines }
    }

    /// Returns the parsed lines in arrival order.
    #[must_use]
    pub fn lines(&self) -> &[ResponseLine] {
        &self.lines
    }

    /// Returns true if no line was received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns true if any line carries `code`.
    #[must_use]
    pub fn contains_status(&self, code: ReplyCode) -> bool {
        self.lines.iter().any(|line| line.code == Some(code))
    }

    /// Returns true if any line's text contains `needle` (case-sensitive).
    #[must_use]
    pub fn contains_text(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.text.contains(needle))
    }

    /// Returns the code of the last line that has one.
    #[must_use]
    pub fn code(&self) -> Option<ReplyCode> {
        self.lines.iter().rev().find_map(|line| line.code)
    }

    /// Returns the full text as a single string.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Three-digit SMTP reply code.
///
/// The first digit gives the class: 2 completed, 3 waiting for more input,
/// 4 try again later, 5 rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Greeting accepted; also the go-ahead for the TLS handshake.
    pub const SERVICE_READY: Self = Self(220);
    /// Reply to `QUIT`.
    pub const CLOSING: Self = Self(221);
    /// Credentials accepted.
    pub const AUTH_SUCCESSFUL: Self = Self(235);
    /// Command completed.
    pub const OK: Self = Self(250);
    /// Server waits for the next authentication step.
    pub const AUTH_CONTINUE: Self = Self(334);
    /// Server waits for the message payload.
    pub const START_DATA: Self = Self(354);
    /// TLS or authentication temporarily unavailable.
    pub const TLS_UNAVAILABLE: Self = Self(454);
    /// Credentials rejected.
    pub const AUTH_FAILED: Self = Self(535);

    /// Wraps a numeric code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    const fn class(self) -> u16 {
        self.0 / 100
    }

    /// 2xx.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.class() == 2
    }

    /// 3xx.
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        self.class() == 3
    }

    /// 4xx.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.class() == 4
    }

    /// 5xx.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.class() == 5
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    mod reply_code_tests {
        use super::*;

        #[test]
        fn classes() {
            assert!(ReplyCode::OK.is_success());
            assert!(ReplyCode::AUTH_SUCCESSFUL.is_success());
            assert!(ReplyCode::AUTH_CONTINUE.is_intermediate());
            assert!(ReplyCode::START_DATA.is_intermediate());
            assert!(ReplyCode::TLS_UNAVAILABLE.is_transient());
            assert!(ReplyCode::new(550).is_permanent());
            assert!(ReplyCode::AUTH_FAILED.is_permanent());
            assert!(!ReplyCode::OK.is_permanent());
            assert!(!ReplyCode::new(600).is_permanent());
        }

        #[test]
        fn display() {
            assert_eq!(format!("{}", ReplyCode::OK), "250");
            assert_eq!(ReplyCode::new(354), ReplyCode::START_DATA);
        }
    }

    mod response_tests {
        use super::*;

        fn line(code: u16, text: &str) -> ResponseLine {
            ResponseLine::new(Some(ReplyCode::new(code)), text.to_string())
        }

        #[test]
        fn contains_status_any_line() {
            let response = Response::new(vec![line(250, "smtp.example.com"), line(250, "AUTH LOGIN")]);
            assert!(response.contains_status(ReplyCode::OK));
            assert!(!response.contains_status(ReplyCode::SERVICE_READY));
        }

        #[test]
        fn contains_text_is_case_sensitive() {
            let response = Response::new(vec![line(250, "STARTTLS")]);
            assert!(response.contains_text("STARTTLS"));
            assert!(response.contains_text("TLS"));
            assert!(!response.contains_text("starttls"));
        }

        #[test]
        fn empty_response_contains_nothing() {
            let response = Response::default();
            assert!(response.is_empty());
            assert!(!response.contains_status(ReplyCode::OK));
            assert!(!response.contains_text(""));
            assert_eq!(response.code(), None);
        }

        #[test]
        fn code_and_text() {
            let response = Response::new(vec![
                line(250, "first"),
                ResponseLine::new(None, "garbled".to_string()),
            ]);
            assert_eq!(response.code(), Some(ReplyCode::OK));
            assert_eq!(response.text(), "first\ngarbled");
        }
    }
}
