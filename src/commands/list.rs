//! LIST command variants (RFC 3977 Section 7.6, RFC 6048)

use crate::error::{NntpError, Result};
use crate::wildmat::Wildmat;

/// Keyword of a LIST command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListKeyword {
    /// `LIST` / `LIST ACTIVE [wildmat]`: `name high low status`
    Active(Wildmat),
    /// `LIST ACTIVE.TIMES [wildmat]`: `name created creator`
    ActiveTimes(Wildmat),
    /// `LIST NEWSGROUPS [wildmat]`: `name description`
    Newsgroups(Wildmat),
    /// `LIST OVERVIEW.FMT`
    OverviewFmt,
    /// `LIST HEADERS [MSGID|RANGE]`
    Headers,
    /// `LIST SUBSCRIPTIONS`
    Subscriptions,
    /// Any other keyword; answered with 503
    Unsupported(String),
}

impl ListKeyword {
    /// Parse the arguments following `LIST`
    pub fn parse(args: &[&str]) -> Result<Self> {
        let Some((keyword, rest)) = args.split_first() else {
            return Ok(ListKeyword::Active(Wildmat::any()));
        };

        let keyword = keyword.to_ascii_uppercase();
        match keyword.as_str() {
            "ACTIVE" => Ok(ListKeyword::Active(wildmat_arg(rest)?)),
            "ACTIVE.TIMES" => Ok(ListKeyword::ActiveTimes(wildmat_arg(rest)?)),
            "NEWSGROUPS" => Ok(ListKeyword::Newsgroups(wildmat_arg(rest)?)),
            "OVERVIEW.FMT" => no_args(rest, ListKeyword::OverviewFmt),
            "SUBSCRIPTIONS" => no_args(rest, ListKeyword::Subscriptions),
            "HEADERS" => match rest {
                [] => Ok(ListKeyword::Headers),
                [arg] if arg.eq_ignore_ascii_case("MSGID") || arg.eq_ignore_ascii_case("RANGE") => {
                    Ok(ListKeyword::Headers)
                }
                _ => Err(NntpError::MalformedCommand(
                    "LIST HEADERS takes MSGID or RANGE".to_string(),
                )),
            },
            _ => Ok(ListKeyword::Unsupported(keyword)),
        }
    }
}

fn wildmat_arg(rest: &[&str]) -> Result<Wildmat> {
    match rest {
        [] => Ok(Wildmat::any()),
        [pattern] => Ok(Wildmat::new(pattern)),
        _ => Err(NntpError::MalformedCommand(
            "Too many arguments to LIST".to_string(),
        )),
    }
}

fn no_args(rest: &[&str], keyword: ListKeyword) -> Result<ListKeyword> {
    if rest.is_empty() {
        Ok(keyword)
    } else {
        Err(NntpError::MalformedCommand(
            "LIST keyword takes no arguments".to_string(),
        ))
    }
}
