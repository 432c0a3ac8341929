//! Article builder for constructing valid articles
//!
//! This module provides the ArticleBuilder, which turns a client posting (or a
//! programmatic one) into an RFC 5536 article ready to be stored: required
//! headers are checked, Message-ID and Date are generated when missing, and
//! the Path header gets the local host name.

use chrono::Utc;
use uuid::Uuid;

use super::parsing::parse_article;
use super::types::{Article, Headers};
use crate::validation::{format_date, parse_date, validate_message_id};
use crate::{NntpError, Result};

/// Builder that validates and completes an article before it is stored
///
/// # Examples
///
/// ```
/// use nntp_server::article::ArticleBuilder;
///
/// let article = ArticleBuilder::new()
///     .hostname("news.example.com")
///     .from("user@example.com")
///     .subject("Test Article")
///     .newsgroups(vec!["comp.lang.rust"])
///     .body("This is the article body.")
///     .build()
///     .unwrap();
///
/// assert!(article.message_id.ends_with("@news.example.com>"));
/// assert_eq!(article.headers.get("Path"), Some("news.example.com!not-for-mail"));
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct ArticleBuilder {
    headers: Headers,
    body: Vec<u8>,
    hostname: String,
}

impl Default for ArticleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleBuilder {
    /// Create a new ArticleBuilder with no headers and an empty body
    pub fn new() -> Self {
        Self {
            headers: Headers::new(),
            body: Vec::new(),
            hostname: "localhost".to_string(),
        }
    }

    /// Start from a raw posted article (headers, blank line, body)
    pub fn from_raw(raw: &[u8]) -> Result<Self> {
        let (headers, body) = parse_article(raw)?;
        Ok(Self {
            headers,
            body,
            ..Self::new()
        })
    }

    /// Host name used for generated Message-IDs and the Path header
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Set the From header (required)
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.headers.set("From", from);
        self
    }

    /// Set the Subject header (required)
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.headers.set("Subject", subject);
        self
    }

    /// Set the Newsgroups header (required, at least one newsgroup)
    pub fn newsgroups(mut self, newsgroups: Vec<impl Into<String>>) -> Self {
        let list: Vec<String> = newsgroups.into_iter().map(|s| s.into()).collect();
        self.headers.set("Newsgroups", list.join(","));
        self
    }

    /// Set the Message-ID header (auto-generated if not provided)
    pub fn message_id(mut self, message_id: impl Into<String>) -> Self {
        self.headers.set("Message-ID", message_id);
        self
    }

    /// Set the Date header (auto-generated if not provided)
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.headers.set("Date", date);
        self
    }

    /// Set the References header for threading
    pub fn references(mut self, references: Vec<impl Into<String>>) -> Self {
        let list: Vec<String> = references.into_iter().map(|s| s.into()).collect();
        self.headers.set("References", list.join(" "));
        self
    }

    /// Add any other header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(name, value);
        self
    }

    /// Set the body from text; line endings become CRLF and the last line is terminated
    pub fn body(mut self, body: &str) -> Self {
        let mut bytes = Vec::with_capacity(body.len() + 2);
        for line in body.lines() {
            bytes.extend_from_slice(line.as_bytes());
            bytes.extend_from_slice(b"\r\n");
        }
        self.body = bytes;
        self
    }

    /// Set the body bytes as-is
    pub fn body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Build the article, validating required fields and generating defaults
    ///
    /// Returns `MalformedArticle` if From, Subject or Newsgroups is missing or
    /// empty, or if a supplied Message-ID or Date is invalid.
    pub fn build(self) -> Result<Article> {
        let Self {
            mut headers,
            body,
            hostname,
        } = self;

        for required in ["From", "Subject", "Newsgroups"] {
            match headers.get_unfolded(required) {
                Some(value) if !value.is_empty() => {}
                _ => {
                    return Err(NntpError::MalformedArticle(format!(
                        "{required} header is required"
                    )));
                }
            }
        }
        if headers.newsgroups().is_empty() {
            return Err(NntpError::MalformedArticle(
                "At least one newsgroup is required".to_string(),
            ));
        }

        let message_id = match headers.get_unfolded("Message-ID") {
            Some(id) => {
                validate_message_id(&id)
                    .map_err(|e| NntpError::MalformedArticle(e.to_string()))?;
                headers.set("Message-ID", id.clone());
                id
            }
            None => {
                let id = format!("<{}@{}>", Uuid::new_v4(), hostname);
                headers.push("Message-ID", id.clone());
                id
            }
        };

        match headers.get_unfolded("Date") {
            Some(date) => {
                parse_date(&date).map_err(|e| NntpError::MalformedArticle(e.to_string()))?;
            }
            None => headers.push("Date", format_date(&Utc::now())),
        }

        let path = match headers.get_unfolded("Path") {
            Some(existing) if !existing.is_empty() => format!("{hostname}!{existing}"),
            _ => format!("{hostname}!not-for-mail"),
        };
        headers.remove("Path");
        headers.prepend("Path", path);

        Ok(Article::new(message_id, headers, body))
    }
}
