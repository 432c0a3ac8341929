//! NNTP server error types

use thiserror::Error;

/// Errors raised by the article store, group index, overview cache and sessions
#[derive(Error, Debug)]
pub enum NntpError {
    /// IO error during storage or network operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored record is corrupt or does not match its key
    #[error("Storage error: {0}")]
    Storage(String),

    /// Client did not send or drain data in time
    #[error("Connection timeout")]
    Timeout,

    /// Connection closed by the peer
    #[error("Connection closed")]
    ConnectionClosed,

    /// No such newsgroup
    #[error("No such newsgroup: {0}")]
    NoSuchGroup(String),

    /// Newsgroup already exists
    #[error("Newsgroup already exists: {0}")]
    GroupExists(String),

    /// No article with that message-id
    #[error("No such article: {0}")]
    NoSuchArticle(String),

    /// No article with that number in the selected group
    #[error("No article with number {0}")]
    NoSuchArticleNumber(u64),

    /// Store-level lookup miss
    #[error("Article not found in store: {0}")]
    NotFound(String),

    /// Message-id already present in the store
    #[error("Duplicate article: {0}")]
    DuplicateArticle(String),

    /// No newsgroup selected
    #[error("No newsgroup selected")]
    NoGroupSelected,

    /// Current article number is invalid
    #[error("No current article selected")]
    NoCurrentArticle,

    /// Current article is the last one in the group
    #[error("No next article in this group")]
    NoNextArticle,

    /// Current article is the first one in the group
    #[error("No previous article in this group")]
    NoPreviousArticle,

    /// Command recognized but its arguments are invalid
    #[error("Syntax error: {0}")]
    MalformedCommand(String),

    /// Command not recognized
    #[error("Command not recognized: {0}")]
    UnknownCommand(String),

    /// Posted article is missing required headers or is unparseable
    #[error("Malformed article: {0}")]
    MalformedArticle(String),

    /// Posting not permitted
    #[error("Posting not permitted")]
    PostingNotPermitted,

    /// Posting failed
    #[error("Posting failed: {0}")]
    PostingFailed(String),

    /// Message-id or newsgroup name with invalid syntax
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Recognized but deliberately unsupported command or keyword
    #[error("Not supported: {0}")]
    Unsupported(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl NntpError {
    /// Whether this error comes from durable storage rather than the request itself
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            NntpError::Io(_)
                | NntpError::Serialization(_)
                | NntpError::Storage(_)
                | NntpError::Other(_)
        )
    }
}

/// Result type alias using NntpError
pub type Result<T> = std::result::Result<T, NntpError>;
