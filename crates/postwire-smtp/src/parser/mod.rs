//! SMTP response parser.
//!
//! A byte-at-a-time state machine that turns arbitrary chunks into reply
//! lines. Chunk boundaries carry no meaning: a code, a text run or a CRLF may
//! be split across any number of [`ResponseParser::feed`] calls.
//!
//! The parser does not look at the continuation marker (`250-` vs `250 `).
//! Deciding when a reply is complete is left to the reader, which stops once
//! the transport runs out of data (see
//! [`Protocol::read_response`](crate::connection::Protocol::read_response)).

use crate::types::{ReplyCode, Response, ResponseLine};

/// Number of bytes in a reply code.
const CODE_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Accumulating the 3-byte code.
    Code,
    /// Code complete, the next byte may be the `-`/` ` separator.
    Separator,
    /// Accumulating text until CR or LF.
    Text,
    /// A CR ended the last line; a directly following LF belongs to it.
    AfterCr,
}

/// Incremental reply parser.
#[derive(Debug)]
pub struct ResponseParser {
    state: State,
    code: Vec<u8>,
    text: Vec<u8>,
    lines: Vec<ResponseLine>,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser {
    /// Creates a parser positioned at the start of a line.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Code,
            code: Vec::with_capacity(CODE_LEN),
            text: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Parses a complete buffer into one response.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Response {
        let mut parser = Self::new();
        parser.feed(bytes);
        parser.finish()
    }

    /// Feeds the next chunk of bytes.
    pub fn feed(&mut self, chunk: &[u8]) {
        for &byte in chunk {
            self.push(byte);
        }
    }

    /// Returns the number of complete lines parsed so far.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Finishes parsing and returns the response.
    ///
    /// A trailing line without a terminator is kept.
    #[must_use]
    pub fn finish(mut self) -> Response {
        if !self.code.is_empty() || !self.text.is_empty() {
            self.emit();
        }
        Response::new(self.lines)
    }

    fn push(&mut self, byte: u8) {
        match (self.state, byte) {
            (State::AfterCr, b'\n') => self.state = State::Code,
            (State::AfterCr, _) => {
                self.state = State::Code;
                self.push(byte);
            }
            (State::Code, b'\r' | b'\n') => {
                // Blank lines between replies carry nothing.
                if !self.code.is_empty() {
                    self.emit();
                }
                self.state = Self::after_terminator(byte);
            }
            (State::Code, _) => {
                self.code.push(byte);
                if self.code.len() == CODE_LEN {
                    self.state = State::Separator;
                }
            }
            (State::Separator | State::Text, b'\r' | b'\n') => {
                self.emit();
                self.state = Self::after_terminator(byte);
            }
            (State::Separator, b' ' | b'-') => self.state = State::Text,
            (State::Separator | State::Text, _) => {
                self.text.push(byte);
                self.state = State::Text;
            }
        }
    }

    const fn after_terminator(byte: u8) -> State {
        if byte == b'\r' {
            State::AfterCr
        } else {
            State::Code
        }
    }

    fn emit(&mut self) {
        let code = parse_code(&self.code);
        let text = String::from_utf8_lossy(&self.text).into_owned();
        self.lines.push(ResponseLine::new(code, text));
        self.code.clear();
        self.text.clear();
    }
}

/// Parses a 3-digit reply code; anything else yields `None`.
fn parse_code(bytes: &[u8]) -> Option<ReplyCode> {
    if bytes.len() != CODE_LEN || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(bytes)
        .ok()?
        .parse::<u16>()
        .ok()
        .map(ReplyCode::new)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pairs(response: &Response) -> Vec<(Option<u16>, &str)> {
        response
            .lines()
            .iter()
            .map(|l| (l.code.map(ReplyCode::as_u16), l.text.as_str()))
            .collect()
    }

    #[test]
    fn test_parse_single_line_reply() {
        let response = ResponseParser::parse(b"250 OK\r\n");
        assert_eq!(pairs(&response), vec![(Some(250), "OK")]);
    }

    #[test]
    fn test_parse_multi_line_reply() {
        let response = ResponseParser::parse(b"250-smtp.example.com\r\n250-AUTH LOGIN PLAIN\r\n250 STARTTLS\r\n");
        assert_eq!(
            pairs(&response),
            vec![
                (Some(250), "smtp.example.com"),
                (Some(250), "AUTH LOGIN PLAIN"),
                (Some(250), "STARTTLS"),
            ]
        );
    }

    #[test]
    fn test_bare_lf_and_bare_cr_terminate_lines() {
        let response = ResponseParser::parse(b"220 one\n250 two\r354 three\r\n");
        assert_eq!(
            pairs(&response),
            vec![(Some(220), "one"), (Some(250), "two"), (Some(354), "three")]
        );
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut parser = ResponseParser::new();
        parser.feed(b"250 OK\r");
        assert_eq!(parser.line_count(), 1);
        parser.feed(b"\n221 Bye\r\n");
        let response = parser.finish();
        assert_eq!(pairs(&response), vec![(Some(250), "OK"), (Some(221), "Bye")]);
    }

    #[test]
    fn test_code_split_across_chunks() {
        let mut parser = ResponseParser::new();
        parser.feed(b"2");
        parser.feed(b"5");
        parser.feed(b"0 O");
        parser.feed(b"K\r\n");
        assert_eq!(pairs(&parser.finish()), vec![(Some(250), "OK")]);
    }

    #[test]
    fn test_invalid_code_is_none() {
        let response = ResponseParser::parse(b"ABC hello\r\n250 OK\r\n");
        assert_eq!(pairs(&response), vec![(None, "hello"), (Some(250), "OK")]);
    }

    #[test]
    fn test_code_only_line() {
        let response = ResponseParser::parse(b"250\r\n");
        assert_eq!(pairs(&response), vec![(Some(250), "")]);
    }

    #[test]
    fn test_short_line_has_no_code() {
        let response = ResponseParser::parse(b"25\r\n");
        assert_eq!(pairs(&response), vec![(None, "")]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let response = ResponseParser::parse(b"\r\n\r\n250 OK\r\n");
        assert_eq!(pairs(&response), vec![(Some(250), "OK")]);
    }

    #[test]
    fn test_unterminated_line_is_kept() {
        let response = ResponseParser::parse(b"250 OK\r\n221 Bye");
        assert_eq!(pairs(&response), vec![(Some(250), "OK"), (Some(221), "Bye")]);
    }

    #[test]
    fn test_empty_input_is_empty_response() {
        assert!(ResponseParser::parse(b"").is_empty());
    }

    #[test]
    fn test_text_without_separator() {
        let response = ResponseParser::parse(b"250OK\r\n");
        assert_eq!(pairs(&response), vec![(Some(250), "OK")]);
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let response = ResponseParser::parse(b"250 caf\xe9\r\n");
        assert_eq!(response.lines()[0].text, "caf\u{fffd}");
    }

    proptest! {
        #[test]
        fn prop_chunking_does_not_change_result(
            lines in proptest::collection::vec(("[2-5][0-9][0-9]", "[ -]", "[a-zA-Z0-9 .]{0,30}"), 1..6),
            cuts in proptest::collection::vec(any::<usize>(), 0..8),
        ) {
            let raw: Vec<u8> = lines
                .iter()
                .flat_map(|(code, sep, text)| format!("{code}{sep}{text}\r\n").into_bytes())
                .collect();

            let mut points: Vec<usize> = cuts.iter().map(|c| c % (raw.len() + 1)).collect();
            points.sort_unstable();

            let mut parser = ResponseParser::new();
            let mut start = 0;
            for point in points {
                parser.feed(&raw[start..point]);
                start = point;
            }
            parser.feed(&raw[start..]);

            prop_assert_eq!(parser.finish(), ResponseParser::parse(&raw));
        }
    }
}
