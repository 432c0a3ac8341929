//! NNTP response status lines and status codes

use std::fmt;

use tracing::warn;

use crate::error::NntpError;

/// NNTP status line: 3-digit code followed by a human-readable summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// 3-digit NNTP response code
    pub code: u16,
    /// Status message sent after the code
    pub message: String,
}

impl Response {
    /// Create a status line
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Check if response indicates success (2xx)
    pub fn is_success(&self) -> bool {
        self.code >= 200 && self.code < 300
    }

    /// Check if response indicates continuation (3xx)
    pub fn is_continuation(&self) -> bool {
        self.code >= 300 && self.code < 400
    }

    /// Check if response indicates error (4xx or 5xx)
    pub fn is_error(&self) -> bool {
        self.code >= 400
    }

    /// Serialize the status line with its CRLF terminator
    pub fn to_wire(&self) -> String {
        if self.message.is_empty() {
            format!("{}\r\n", self.code)
        } else {
            format!("{} {}\r\n", self.code, self.message)
        }
    }

    /// Translate a request failure into the status line the client receives
    ///
    /// Storage failures are logged here and reported as a generic internal fault;
    /// the session keeps running.
    pub fn from_error(err: &NntpError) -> Self {
        use codes::*;

        match err {
            NntpError::NoSuchGroup(_) => Self::new(NO_SUCH_GROUP, "No such newsgroup"),
            NntpError::NoGroupSelected => Self::new(NO_GROUP_SELECTED, "No newsgroup selected"),
            NntpError::NoCurrentArticle => {
                Self::new(NO_CURRENT_ARTICLE, "Current article number is invalid")
            }
            NntpError::NoNextArticle => Self::new(NO_NEXT_ARTICLE, "No next article in this group"),
            NntpError::NoPreviousArticle => {
                Self::new(NO_PREV_ARTICLE, "No previous article in this group")
            }
            NntpError::NoSuchArticleNumber(_) => {
                Self::new(NO_SUCH_ARTICLE_NUMBER, "No article with that number")
            }
            NntpError::NoSuchArticle(_) | NntpError::NotFound(_) => {
                Self::new(NO_SUCH_ARTICLE_ID, "No article with that message-id")
            }
            NntpError::DuplicateArticle(id) => {
                Self::new(POSTING_FAILED, format!("Posting failed: duplicate {id}"))
            }
            NntpError::MalformedArticle(reason) => {
                Self::new(POSTING_FAILED, format!("Posting failed: {reason}"))
            }
            NntpError::PostingFailed(reason) => {
                Self::new(POSTING_FAILED, format!("Posting failed: {reason}"))
            }
            NntpError::PostingNotPermitted => {
                Self::new(POSTING_NOT_PERMITTED, "Posting not permitted")
            }
            NntpError::GroupExists(name) => {
                Self::new(ACCESS_DENIED, format!("Newsgroup {name} already exists"))
            }
            NntpError::MalformedCommand(reason) => Self::new(COMMAND_SYNTAX_ERROR, reason.clone()),
            NntpError::InvalidName(reason) => Self::new(COMMAND_SYNTAX_ERROR, reason.clone()),
            NntpError::UnknownCommand(_) => Self::new(COMMAND_NOT_RECOGNIZED, "Unknown command"),
            NntpError::Unsupported(what) => {
                Self::new(ACCESS_DENIED, format!("{what} not available on this server"))
            }
            NntpError::Timeout => Self::new(SERVICE_UNAVAILABLE, "Idle timeout, closing connection"),
            NntpError::ConnectionClosed => Self::new(CLOSING_CONNECTION, "Connection closing"),
            NntpError::Io(_)
            | NntpError::Serialization(_)
            | NntpError::Storage(_)
            | NntpError::Other(_) => {
                warn!("Internal fault while serving request: {}", err);
                Self::new(INTERNAL_FAULT, "Internal fault, try again later")
            }
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

/// NNTP response codes (RFC 3977)
pub mod codes {
    // 1xx - Informational
    /// Help text follows
    pub const HELP_TEXT_FOLLOWS: u16 = 100;
    /// Capability list follows (RFC 3977 Section 5.2)
    pub const CAPABILITY_LIST: u16 = 101;
    /// Server date/time (RFC 3977 Section 7.1)
    pub const SERVER_DATE: u16 = 111;

    // 2xx - Success
    /// Server ready, posting allowed
    pub const READY_POSTING_ALLOWED: u16 = 200;
    /// Server ready, no posting
    pub const READY_NO_POSTING: u16 = 201;
    /// Closing connection
    pub const CLOSING_CONNECTION: u16 = 205;
    /// Group selected
    pub const GROUP_SELECTED: u16 = 211;
    /// List of newsgroups follows (RFC 3977 Section 7.6)
    pub const LIST_INFORMATION_FOLLOWS: u16 = 215;
    /// Article follows
    pub const ARTICLE_FOLLOWS: u16 = 220;
    /// Head follows
    pub const HEAD_FOLLOWS: u16 = 221;
    /// Body follows
    pub const BODY_FOLLOWS: u16 = 222;
    /// Article stat
    pub const ARTICLE_STAT: u16 = 223;
    /// Overview information follows
    pub const OVERVIEW_INFO_FOLLOWS: u16 = 224;
    /// Headers follow
    pub const HEADERS_FOLLOW: u16 = 225;
    /// List of new articles follows (RFC 3977 Section 7.4)
    pub const NEW_ARTICLE_LIST_FOLLOWS: u16 = 230;
    /// List of new newsgroups follows (RFC 3977 Section 7.3)
    pub const NEW_NEWSGROUPS_FOLLOW: u16 = 231;
    /// Article posted successfully (RFC 3977 Section 6.3.1)
    pub const ARTICLE_POSTED: u16 = 240;
    /// Authentication accepted
    pub const AUTH_ACCEPTED: u16 = 281;

    // 3xx - Continuation
    /// Send article to be posted
    pub const SEND_ARTICLE: u16 = 340;
    /// Continue with authentication
    pub const AUTH_CONTINUE: u16 = 381;

    // 4xx - Temporary errors
    /// Service temporarily unavailable
    pub const SERVICE_UNAVAILABLE: u16 = 400;
    /// Internal fault or server resource problem (RFC 3977)
    pub const INTERNAL_FAULT: u16 = 403;
    /// No such newsgroup
    pub const NO_SUCH_GROUP: u16 = 411;
    /// No newsgroup selected
    pub const NO_GROUP_SELECTED: u16 = 412;
    /// No current article
    pub const NO_CURRENT_ARTICLE: u16 = 420;
    /// No next article
    pub const NO_NEXT_ARTICLE: u16 = 421;
    /// No previous article
    pub const NO_PREV_ARTICLE: u16 = 422;
    /// No article with that number
    pub const NO_SUCH_ARTICLE_NUMBER: u16 = 423;
    /// No article with that message-id
    pub const NO_SUCH_ARTICLE_ID: u16 = 430;
    /// Posting not permitted (RFC 3977 Section 6.3.1)
    pub const POSTING_NOT_PERMITTED: u16 = 440;
    /// Posting failed (RFC 3977 Section 6.3.1)
    pub const POSTING_FAILED: u16 = 441;
    /// Authentication out of sequence
    pub const AUTH_OUT_OF_SEQUENCE: u16 = 482;

    // 5xx - Permanent errors
    /// Command not recognized
    pub const COMMAND_NOT_RECOGNIZED: u16 = 500;
    /// Command syntax error
    pub const COMMAND_SYNTAX_ERROR: u16 = 501;
    /// Access denied / command unavailable
    pub const ACCESS_DENIED: u16 = 502;
    /// Feature not supported / optional functionality absent (RFC 3977)
    pub const FEATURE_NOT_SUPPORTED: u16 = 503;
}
