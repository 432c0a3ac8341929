//! NNTP command parsing
//!
//! Turns one client command line into a [`Command`]. Keywords are matched
//! case-insensitively (RFC 3977 Section 3.1); arguments keep their case.
//! An unrecognized keyword is `UnknownCommand` (500) and a recognized
//! keyword with bad arguments is `MalformedCommand` (501).

mod article;
mod list;

use chrono::{DateTime, Utc};

pub use self::article::{ArticleRange, ArticleSpec, Selection};
pub use self::list::ListKeyword;
use crate::error::{NntpError, Result};
use crate::validation::parse_nntp_datetime;
use crate::wildmat::Wildmat;

/// Which part of an article a retrieval command returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticlePart {
    /// ARTICLE: headers, blank line, body
    Whole,
    /// HEAD: headers only
    Head,
    /// BODY: body only
    Body,
    /// STAT: status line only
    Stat,
}

/// A parsed client command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// CAPABILITIES [keyword]
    Capabilities,
    /// MODE READER
    ModeReader,
    /// HELP
    Help,
    /// DATE
    Date,
    /// QUIT
    Quit,
    /// GROUP name
    Group(String),
    /// LISTGROUP [name [range]]
    ListGroup {
        group: Option<String>,
        range: Option<ArticleRange>,
    },
    /// NEXT
    Next,
    /// LAST
    Last,
    /// ARTICLE, HEAD, BODY or STAT
    Retrieve { part: ArticlePart, spec: ArticleSpec },
    /// POST
    Post,
    /// LIST [keyword [args]]
    List(ListKeyword),
    /// OVER / XOVER [range | message-id]
    Over(Selection),
    /// HDR / XHDR field [range | message-id]
    Hdr {
        field: String,
        target: Selection,
        /// XHDR answers 221 instead of 225
        legacy: bool,
    },
    /// NEWGROUPS date time [GMT]
    NewGroups(DateTime<Utc>),
    /// NEWNEWS wildmat date time [GMT]
    NewNews {
        wildmat: Wildmat,
        since: DateTime<Utc>,
    },
    /// AUTHINFO USER name
    AuthInfoUser(String),
    /// AUTHINFO PASS password
    AuthInfoPass(String),
    /// Recognized but unavailable on this server (peer transfer, SASL)
    Unavailable(String),
}

impl Command {
    /// Parse one command line (without its CRLF)
    ///
    /// ```
    /// use nntp_server::commands::{ArticlePart, ArticleSpec, Command};
    ///
    /// assert_eq!(
    ///     Command::parse("group alt.test").unwrap(),
    ///     Command::Group("alt.test".to_string())
    /// );
    /// assert_eq!(
    ///     Command::parse("HEAD <1@test>").unwrap(),
    ///     Command::Retrieve {
    ///         part: ArticlePart::Head,
    ///         spec: ArticleSpec::MessageId("<1@test>".to_string()),
    ///     }
    /// );
    /// assert!(Command::parse("FROBNICATE").is_err());
    /// ```
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_ascii_whitespace();
        let Some(keyword) = words.next() else {
            return Err(NntpError::UnknownCommand(String::new()));
        };
        let args: Vec<&str> = words.collect();
        let keyword = keyword.to_ascii_uppercase();

        match keyword.as_str() {
            "CAPABILITIES" => {
                at_most(&keyword, &args, 1)?;
                Ok(Command::Capabilities)
            }
            "MODE" => match args.as_slice() {
                [mode] if mode.eq_ignore_ascii_case("READER") => Ok(Command::ModeReader),
                [mode] if mode.eq_ignore_ascii_case("STREAM") => {
                    Ok(Command::Unavailable("MODE STREAM".to_string()))
                }
                _ => Err(syntax("MODE takes READER")),
            },
            "HELP" => no_args(&keyword, &args, Command::Help),
            "DATE" => no_args(&keyword, &args, Command::Date),
            "QUIT" => no_args(&keyword, &args, Command::Quit),
            "NEXT" => no_args(&keyword, &args, Command::Next),
            "LAST" => no_args(&keyword, &args, Command::Last),
            "POST" => no_args(&keyword, &args, Command::Post),
            "GROUP" => match args.as_slice() {
                [group] => Ok(Command::Group(group.to_string())),
                _ => Err(syntax("GROUP takes exactly one newsgroup name")),
            },
            "LISTGROUP" => match args.as_slice() {
                [] => Ok(Command::ListGroup {
                    group: None,
                    range: None,
                }),
                [group] => Ok(Command::ListGroup {
                    group: Some(group.to_string()),
                    range: None,
                }),
                [group, range] => Ok(Command::ListGroup {
                    group: Some(group.to_string()),
                    range: Some(ArticleRange::parse(range)?),
                }),
                _ => Err(syntax("Too many arguments to LISTGROUP")),
            },
            "ARTICLE" => retrieve(ArticlePart::Whole, &keyword, &args),
            "HEAD" => retrieve(ArticlePart::Head, &keyword, &args),
            "BODY" => retrieve(ArticlePart::Body, &keyword, &args),
            "STAT" => retrieve(ArticlePart::Stat, &keyword, &args),
            "LIST" => Ok(Command::List(ListKeyword::parse(&args)?)),
            "OVER" | "XOVER" => {
                at_most(&keyword, &args, 1)?;
                Ok(Command::Over(Selection::parse(args.first().copied())?))
            }
            "HDR" | "XHDR" => match args.as_slice() {
                [field, rest @ ..] if rest.len() <= 1 => Ok(Command::Hdr {
                    field: field.to_string(),
                    target: Selection::parse(rest.first().copied())?,
                    legacy: keyword == "XHDR",
                }),
                _ => Err(syntax("HDR takes a field and an optional range or message-id")),
            },
            "NEWGROUPS" => match args.as_slice() {
                [date, time, tail @ ..] => {
                    gmt_tail(tail)?;
                    Ok(Command::NewGroups(parse_nntp_datetime(date, time)?))
                }
                _ => Err(syntax("NEWGROUPS takes date and time")),
            },
            "NEWNEWS" => match args.as_slice() {
                [wildmat, date, time, tail @ ..] => {
                    gmt_tail(tail)?;
                    Ok(Command::NewNews {
                        wildmat: Wildmat::new(wildmat),
                        since: parse_nntp_datetime(date, time)?,
                    })
                }
                _ => Err(syntax("NEWNEWS takes wildmat, date and time")),
            },
            "AUTHINFO" => match args.as_slice() {
                [sub, value] if sub.eq_ignore_ascii_case("USER") => {
                    Ok(Command::AuthInfoUser(value.to_string()))
                }
                [sub, value] if sub.eq_ignore_ascii_case("PASS") => {
                    Ok(Command::AuthInfoPass(value.to_string()))
                }
                [sub, ..] if sub.eq_ignore_ascii_case("SASL") => {
                    Ok(Command::Unavailable("AUTHINFO SASL".to_string()))
                }
                _ => Err(syntax("AUTHINFO takes USER or PASS and a value")),
            },
            "IHAVE" | "CHECK" | "TAKETHIS" => Ok(Command::Unavailable(keyword)),
            _ => Err(NntpError::UnknownCommand(keyword)),
        }
    }

    /// Command name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Capabilities => "CAPABILITIES",
            Command::ModeReader => "MODE READER",
            Command::Help => "HELP",
            Command::Date => "DATE",
            Command::Quit => "QUIT",
            Command::Group(_) => "GROUP",
            Command::ListGroup { .. } => "LISTGROUP",
            Command::Next => "NEXT",
            Command::Last => "LAST",
            Command::Retrieve { part, .. } => match part {
                ArticlePart::Whole => "ARTICLE",
                ArticlePart::Head => "HEAD",
                ArticlePart::Body => "BODY",
                ArticlePart::Stat => "STAT",
            },
            Command::Post => "POST",
            Command::List(_) => "LIST",
            Command::Over(_) => "OVER",
            Command::Hdr { .. } => "HDR",
            Command::NewGroups(_) => "NEWGROUPS",
            Command::NewNews { .. } => "NEWNEWS",
            Command::AuthInfoUser(_) | Command::AuthInfoPass(_) => "AUTHINFO",
            Command::Unavailable(_) => "UNAVAILABLE",
        }
    }
}

fn syntax(message: &str) -> NntpError {
    NntpError::MalformedCommand(message.to_string())
}

fn no_args(keyword: &str, args: &[&str], command: Command) -> Result<Command> {
    at_most(keyword, args, 0)?;
    Ok(command)
}

fn at_most(keyword: &str, args: &[&str], max: usize) -> Result<()> {
    if args.len() > max {
        return Err(NntpError::MalformedCommand(format!(
            "Too many arguments to {keyword}"
        )));
    }
    Ok(())
}

fn retrieve(part: ArticlePart, keyword: &str, args: &[&str]) -> Result<Command> {
    at_most(keyword, args, 1)?;
    Ok(Command::Retrieve {
        part,
        spec: ArticleSpec::parse(args.first().copied())?,
    })
}

/// Accept the optional trailing `GMT` of NEWGROUPS / NEWNEWS
///
/// Times are always interpreted as UTC.
fn gmt_tail(tail: &[&str]) -> Result<()> {
    match tail {
        [] => Ok(()),
        [gmt] if gmt.eq_ignore_ascii_case("GMT") => Ok(()),
        _ => Err(syntax("Expected optional GMT after date and time")),
    }
}
