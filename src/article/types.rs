//! Article type definitions
//!
//! This module contains the core data structures for representing stored articles.

use serde::{Deserialize, Serialize};

use super::parsing::unfold_header;

/// Ordered header fields of an article
///
/// Field names compare case-insensitively; the original spelling and order
/// are kept so the article is re-emitted exactly as it was posted. Values are
/// stored raw, so a folded value keeps its `CRLF` + whitespace continuation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty header block
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, keeping any existing field of the same name
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Insert a field before all others
    pub fn prepend(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(0, (name.into(), value.into()));
    }

    /// Replace the first field with this name, or append it
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .fields
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Remove every field with this name
    pub fn remove(&mut self, name: &str) {
        self.fields.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Raw value of the first field with this name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of the first field with this name, folds collapsed to single spaces
    #[must_use]
    pub fn get_unfolded(&self, name: &str) -> Option<String> {
        self.get(name).map(unfold_header)
    }

    /// Whether a field with this name is present
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Fields in their original order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Target groups named by the Newsgroups header
    pub fn newsgroups(&self) -> Vec<String> {
        self.get_unfolded("Newsgroups")
            .map(|v| super::parsing::parse_comma_list(&v))
            .unwrap_or_default()
    }

    /// Header block in wire form: one `Name: value` line per field, CRLF terminated
    pub fn to_bytes(&self) -> Vec<u8> {
        let capacity = self.fields.iter().map(|(n, v)| n.len() + v.len() + 4).sum();
        let mut out = Vec::with_capacity(capacity);
        for (name, value) in &self.fields {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

/// A stored article
///
/// Immutable once stored. The body is an opaque byte sequence of
/// CRLF-terminated lines, held without dot-stuffing.
///
/// # Examples
///
/// ```
/// use nntp_server::article::{Article, Headers};
///
/// let headers: Headers = [("Subject", "hi")].into_iter().collect();
/// let article = Article::new("<1@test>", headers, b"line one\r\nline two\r\n".to_vec());
/// assert_eq!(article.line_count(), 2);
/// assert_eq!(article.headers.get("subject"), Some("hi"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Globally unique message identifier, including angle brackets
    pub message_id: String,
    /// Header fields in posted order
    pub headers: Headers,
    /// Body bytes (after the blank separator line)
    pub body: Vec<u8>,
}

impl Article {
    /// Create an article from its parts
    pub fn new(message_id: impl Into<String>, headers: Headers, body: Vec<u8>) -> Self {
        Self {
            message_id: message_id.into(),
            headers,
            body,
        }
    }

    /// Size of the article on the wire: headers, blank line and body
    pub fn byte_size(&self) -> usize {
        self.headers.to_bytes().len() + 2 + self.body.len()
    }

    /// Number of lines in the body
    pub fn line_count(&self) -> usize {
        if self.body.is_empty() {
            return 0;
        }
        let newlines = self.body.iter().filter(|&&b| b == b'\n').count();
        if self.body.ends_with(b"\n") {
            newlines
        } else {
            newlines + 1
        }
    }

    /// Body split into lines, terminators stripped
    pub fn body_lines(&self) -> impl Iterator<Item = &[u8]> {
        let body = self.body.strip_suffix(b"\n").unwrap_or(&self.body);
        let lines = (!self.body.is_empty()).then(|| body.split(|&b| b == b'\n'));
        lines
            .into_iter()
            .flatten()
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
    }

    /// Whole article in wire form (headers, blank line, body), without dot-stuffing
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.headers.to_bytes();
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }

    /// Parse the Control header, if any (RFC 5537 Section 5)
    pub fn control_message(&self) -> Option<ControlMessage> {
        self.headers
            .get_unfolded("Control")
            .and_then(|v| ControlMessage::parse(&v))
    }
}

/// Control message carried in a Control header (RFC 5537 Section 5)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// Withdraw a previously posted article (RFC 5537 Section 5.3)
    ///
    /// Format: `cancel <message-id>`
    Cancel {
        /// Message-ID of the article to withdraw
        message_id: String,
    },

    /// Any other control message; stored as an ordinary article
    Other {
        /// The raw Control header value
        value: String,
    },
}

impl ControlMessage {
    /// Parse a control message from a Control header value
    ///
    /// ```
    /// use nntp_server::article::ControlMessage;
    ///
    /// let msg = ControlMessage::parse("cancel <spam@example.com>").unwrap();
    /// assert_eq!(
    ///     msg,
    ///     ControlMessage::Cancel { message_id: "<spam@example.com>".to_string() }
    /// );
    /// ```
    pub fn parse(control: &str) -> Option<ControlMessage> {
        let control = control.trim();
        let mut parts = control.split_whitespace();
        let command = parts.next()?;

        if command.eq_ignore_ascii_case("cancel")
            && let Some(message_id) = parts.next()
        {
            return Some(ControlMessage::Cancel {
                message_id: message_id.to_string(),
            });
        }

        Some(ControlMessage::Other {
            value: control.to_string(),
        })
    }
}
