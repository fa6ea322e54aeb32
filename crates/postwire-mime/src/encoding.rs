//! MIME encoding utilities.
//!
//! Supports Base64 (with RFC 2045 line wrapping), RFC 2047 header encoding
//! and SMTP body transparency.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Line break used on the wire.
pub const CRLF: &str = "\r\n";

/// Maximum line length for Base64 bodies (RFC 2045).
const MAX_LINE_LENGTH: usize = 76;

/// Maximum length of one encoded word (RFC 2047 section 2).
const MAX_ENCODED_WORD: usize = 75;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into lines of at most 76 characters.
///
/// Lines are joined with CRLF; there is no trailing line break.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = encode_base64(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2);

    // Base64 output is pure ASCII, so byte chunks are valid char boundaries.
    for (i, chunk) in encoded.as_bytes().chunks(MAX_LINE_LENGTH).enumerate() {
        if i > 0 {
            result.push_str(CRLF);
        }
        result.push_str(&String::from_utf8_lossy(chunk));
    }

    result
}

/// Encodes a header value using RFC 2047 encoding.
///
/// Format: `=?charset?B?encoded-text?=`. Plain ASCII without `=?` markers is
/// returned unchanged. Values too long for one 75-character word are split
/// on character boundaries into several words, folded with CRLF and a space.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if !needs_rfc2047(text) {
        return text.to_string();
    }

    // `=?` + charset + `?B?` + `?=`
    let overhead = charset.len() + 7;
    let max_bytes = (MAX_ENCODED_WORD.saturating_sub(overhead) / 4 * 3).max(4);

    let mut words = Vec::new();
    let mut start = 0;
    let mut end = 0;
    for (i, c) in text.char_indices() {
        let next = i + c.len_utf8();
        if next - start > max_bytes && end > start {
            words.push(&text[start..end]);
            start = end;
        }
        end = next;
    }
    words.push(&text[start..]);

    words
        .iter()
        .map(|word| format!("=?{charset}?B?{}?=", encode_base64(word.as_bytes())))
        .collect::<Vec<_>>()
        .join("\r\n ")
}

/// Returns true if the value would be rewritten by [`encode_rfc2047`]:
/// it contains non-ASCII characters or something that reads as an encoded
/// word.
#[must_use]
pub fn needs_rfc2047(text: &str) -> bool {
    !text.is_ascii() || text.contains("=?")
}

/// Replaces CR and LF in a header value with spaces.
///
/// Header values come from callers and must never start a new header line.
#[must_use]
pub fn sanitize_header(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// Prepares body text for the DATA phase.
///
/// Normalizes every line break (`\r\n`, bare `\n`) to CRLF and escapes lines
/// starting with `.` by doubling the dot (RFC 5321 section 4.5.2).
#[must_use]
pub fn dot_stuff(body: &str) -> String {
    let mut result = String::with_capacity(body.len() + 16);

    for (i, line) in body.split('\n').enumerate() {
        if i > 0 {
            result.push_str(CRLF);
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.starts_with('.') {
            result.push('.');
        }
        result.push_str(line);
    }

    result
}
