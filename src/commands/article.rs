//! Article selectors for retrieval and range commands

use crate::error::{NntpError, Result};

/// Which article ARTICLE / HEAD / BODY / STAT refer to (RFC 3977 Section 6.2)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleSpec {
    /// No argument: the current article of the selected group
    Current,
    /// Article number in the selected group
    Number(u64),
    /// Message-ID, independent of any group
    MessageId(String),
}

impl ArticleSpec {
    /// Parse an optional retrieval argument
    pub fn parse(arg: Option<&str>) -> Result<Self> {
        match arg {
            None => Ok(ArticleSpec::Current),
            Some(arg) if arg.starts_with('<') => parse_message_id(arg).map(ArticleSpec::MessageId),
            Some(arg) => parse_number(arg).map(ArticleSpec::Number),
        }
    }
}

/// Article range argument (RFC 3977 Section 4.2): `n`, `n-` or `n-m`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleRange {
    /// First number of the range
    pub low: u64,
    /// Last number, or `None` for "through the end of the group"
    pub high: Option<u64>,
}

impl ArticleRange {
    /// Parse a range argument
    ///
    /// ```
    /// use nntp_server::commands::ArticleRange;
    ///
    /// assert_eq!(ArticleRange::parse("5").unwrap().bounds(100), (5, 5));
    /// assert_eq!(ArticleRange::parse("5-").unwrap().bounds(100), (5, 100));
    /// assert_eq!(ArticleRange::parse("5-9").unwrap().bounds(100), (5, 9));
    /// assert!(ArticleRange::parse("x-9").is_err());
    /// ```
    pub fn parse(arg: &str) -> Result<Self> {
        match arg.split_once('-') {
            None => {
                let n = parse_number(arg)?;
                Ok(Self {
                    low: n,
                    high: Some(n),
                })
            }
            Some((low, "")) => Ok(Self {
                low: parse_number(low)?,
                high: None,
            }),
            Some((low, high)) => Ok(Self {
                low: parse_number(low)?,
                high: Some(parse_number(high)?),
            }),
        }
    }

    /// Inclusive bounds, resolving an open end to `group_high`
    ///
    /// A range whose end is before its start selects nothing; callers see
    /// that as `low > high`.
    pub fn bounds(&self, group_high: u64) -> (u64, u64) {
        (self.low, self.high.unwrap_or(group_high))
    }
}

/// Argument of OVER / HDR / LISTGROUP-style commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// No argument: the current article
    Current,
    /// Range of numbers in the selected group
    Range(ArticleRange),
    /// Single article by Message-ID
    MessageId(String),
}

impl Selection {
    /// Parse an optional range-or-message-id argument
    pub fn parse(arg: Option<&str>) -> Result<Self> {
        match arg {
            None => Ok(Selection::Current),
            Some(arg) if arg.starts_with('<') => parse_message_id(arg).map(Selection::MessageId),
            Some(arg) => ArticleRange::parse(arg).map(Selection::Range),
        }
    }
}

fn parse_number(arg: &str) -> Result<u64> {
    if arg.is_empty() || !arg.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NntpError::MalformedCommand(format!(
            "Invalid article number: {arg}"
        )));
    }
    arg.parse()
        .map_err(|_| NntpError::MalformedCommand(format!("Article number out of range: {arg}")))
}

fn parse_message_id(arg: &str) -> Result<String> {
    if arg.len() < 3 || !arg.ends_with('>') {
        return Err(NntpError::MalformedCommand(format!(
            "Invalid message-id: {arg}"
        )));
    }
    Ok(arg.to_string())
}
