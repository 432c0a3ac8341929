//! RFC 5536 Article Format
//!
//! Reference: https://datatracker.ietf.org/doc/html/rfc5536
//!
//! Articles are stored as an ordered header block plus an opaque body.
//!
//! This module is organized into:
//! - `types`: Core article data structures (Article, Headers, ControlMessage)
//! - `parsing`: Raw article and header parsing
//! - `builder`: ArticleBuilder, which validates and completes a posting

mod builder;
mod parsing;
mod types;

pub use self::builder::ArticleBuilder;
pub use self::parsing::{
    parse_article, parse_comma_list, parse_headers, split_article, unfold_header,
};
pub use self::types::{Article, ControlMessage, Headers};
