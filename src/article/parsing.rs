//! Article parsing functions
//!
//! This module contains functions for parsing raw article text into structured data.

use crate::{NntpError, Result};

use super::types::Headers;

/// Split raw article bytes into (header section, body)
///
/// Splits at the first blank line (CRLF CRLF, or LF LF for bare-LF input).
/// An article that starts with a blank line has no headers; one with no
/// blank line at all is headers only.
pub fn split_article(raw: &[u8]) -> (&[u8], &[u8]) {
    let empty = &raw[..0];
    if let Some(rest) = raw.strip_prefix(b"\r\n") {
        return (empty, rest);
    }
    if let Some(rest) = raw.strip_prefix(b"\n") {
        return (empty, rest);
    }

    if let Some(pos) = find(raw, b"\r\n\r\n") {
        return (&raw[..pos + 2], &raw[pos + 4..]);
    }
    if let Some(pos) = find(raw, b"\n\n") {
        return (&raw[..pos + 1], &raw[pos + 2..]);
    }

    (raw, empty)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Parse comma-separated list (for Newsgroups, Followup-To, etc.)
///
/// RFC 5536: Values are comma-separated, whitespace around commas is optional
pub fn parse_comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Unfold header value by removing continuation line breaks
///
/// RFC 5536/5322: Continuation lines start with whitespace (space or tab).
/// Each line break plus the whitespace run after it becomes one space, and any
/// remaining TAB, CR or LF is turned into a space so the result fits on a
/// single tab-separated overview line.
///
/// ```
/// use nntp_server::article::unfold_header;
///
/// assert_eq!(unfold_header("multi\r\n\tline\r\n  subject"), "multi line subject");
/// assert_eq!(unfold_header("a\tb"), "a b");
/// ```
pub fn unfold_header(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\r' | '\n' => {
                // Swallow the whole break and the indentation of the continuation line
                while matches!(chars.peek(), Some('\r' | '\n' | ' ' | '\t')) {
                    chars.next();
                }
                if !result.ends_with(' ') {
                    result.push(' ');
                }
            }
            '\t' => result.push(' '),
            _ => result.push(ch),
        }
    }

    result.trim().to_string()
}

/// Parse headers from raw header text
///
/// RFC 5536 Section 3: Header field format is "name: value"
/// - Header names are case-insensitive, kept with their original spelling
/// - Continuation lines start with whitespace and stay attached to the raw value
/// - Leading whitespace after the colon is not part of the value
///
/// Non-UTF-8 bytes are replaced rather than rejected.
pub fn parse_headers(headers_text: &[u8]) -> Result<Headers> {
    let text = String::from_utf8_lossy(headers_text);
    let mut headers = Headers::new();
    let mut current: Option<(String, String)> = None;

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            continue;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            let Some((_, value)) = current.as_mut() else {
                return Err(NntpError::MalformedArticle(
                    "Continuation line before first header".to_string(),
                ));
            };
            value.push_str("\r\n");
            value.push_str(line);
            continue;
        }

        if let Some((name, value)) = current.take() {
            headers.push(name, value);
        }

        let Some((name, value)) = line.split_once(':') else {
            return Err(NntpError::MalformedArticle(format!(
                "Header line without colon: {line}"
            )));
        };
        let name = name.trim_end();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(NntpError::MalformedArticle(format!(
                "Invalid header name: {name:?}"
            )));
        }
        current = Some((name.to_string(), value.trim_start().to_string()));
    }

    if let Some((name, value)) = current {
        headers.push(name, value);
    }

    Ok(headers)
}

/// Parse a complete article from raw bytes into (headers, body)
///
/// RFC 5536: Article format is headers, blank line, body. The body is
/// returned untouched.
pub fn parse_article(raw: &[u8]) -> Result<(Headers, Vec<u8>)> {
    let (headers_text, body) = split_article(raw);
    let headers = parse_headers(headers_text)?;
    Ok((headers, body.to_vec()))
}
