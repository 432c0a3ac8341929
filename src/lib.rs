#![doc = include_str!("../README.md")]

/// RFC 5536 article model, parsing and posting normalization
pub mod article;
mod capabilities;
/// NNTP command parsing
pub mod commands;
mod config;
mod durable;
mod error;
/// Per-group article numbering and metadata
pub mod groups;
/// Overview rows and their cache
pub mod overview;
/// Connection admission control
pub mod ratelimit;
mod response;
mod server;
mod service;
/// Per-connection session state machine and wire I/O
pub mod session;
/// Article storage backends
pub mod store;
/// Message-ID, newsgroup name and date validation
pub mod validation;
/// RFC 3977 wildmat matching
pub mod wildmat;

pub use article::{Article, ArticleBuilder, ControlMessage, Headers};
pub use capabilities::Capabilities;
pub use config::{GroupConfig, ServerConfig, StorageBackend};
pub use error::{NntpError, Result};
pub use groups::{GroupIndex, GroupInfo, GroupStats};
pub use overview::{OverviewCache, OverviewRow};
pub use ratelimit::{ConnectionLimiter, ConnectionPermit};
pub use response::{Response, codes};
pub use server::NntpServer;
pub use service::{NewsService, PostOutcome};
pub use session::{Connection, Session, SessionState};
pub use store::{ArticleStore, FileArticleStore, MemoryArticleStore};

/// Crate version, advertised in CAPABILITIES
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
