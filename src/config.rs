//! NNTP server configuration

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Where the article store and group index keep their data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageBackend {
    /// Durable storage under `root` (articles and group journals)
    File {
        /// Storage root directory
        root: PathBuf,
    },
    /// Process-local storage, lost on exit (tests, throwaway servers)
    Memory,
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::File {
            root: PathBuf::from("./storage"),
        }
    }
}

/// A newsgroup created at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Dotted newsgroup name (e.g., "alt.binaries.test")
    pub name: String,

    /// Free-text description shown by LIST NEWSGROUPS
    #[serde(default)]
    pub description: String,

    /// Whether clients may post into this group
    #[serde(default = "default_true")]
    pub posting_allowed: bool,
}

impl GroupConfig {
    /// Create a group definition with posting allowed and no description
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            posting_allowed: true,
        }
    }
}

/// NNTP server configuration
///
/// Every field has a default, so a JSON file only needs the fields it changes.
///
/// # Example
///
/// ```
/// use nntp_server::{GroupConfig, ServerConfig};
///
/// let config = ServerConfig::default()
///     .with_listen("127.0.0.1:1119".parse().unwrap())
///     .with_group(GroupConfig::new("comp.lang.rust"));
/// assert_eq!(config.groups.len(), 2);
/// ```
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP listen address
    pub listen: SocketAddr,

    /// Host name used in the greeting, generated message-ids and Path headers
    pub hostname: String,

    /// Article store and group index backend
    pub storage: StorageBackend,

    /// Server-wide posting switch; when false POST answers 440
    pub allow_posting: bool,

    /// Groups created at startup (existing groups are left as they are)
    pub groups: Vec<GroupConfig>,

    /// Groups returned by LIST SUBSCRIPTIONS
    pub subscriptions: Vec<String>,

    /// Seconds a client may stay silent before the connection is closed
    pub idle_timeout_secs: u64,

    /// Seconds a client may take to drain a response batch
    pub write_timeout_secs: u64,

    /// Maximum concurrent client connections
    pub max_connections: usize,

    /// Longest accepted command or article line, in bytes
    pub max_line_length: usize,

    /// Largest accepted article, in bytes
    pub max_article_bytes: usize,

    /// Article numbers fetched and written per batch on listing commands
    pub batch_size: usize,

    /// Overview rows kept in memory
    pub overview_cache_capacity: usize,
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 5000)),
            hostname: "localhost".to_string(),
            storage: StorageBackend::default(),
            allow_posting: true,
            groups: vec![GroupConfig::new("alt.binaries.test")],
            subscriptions: Vec::new(),
            idle_timeout_secs: 180,
            write_timeout_secs: 60,
            max_connections: 256,
            max_line_length: 2048,
            max_article_bytes: 16 * 1024 * 1024,
            batch_size: 500,
            overview_cache_capacity: 50_000,
        }
    }
}

impl ServerConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Configuration backed by memory storage, with no groups
    pub fn in_memory() -> Self {
        Self {
            storage: StorageBackend::Memory,
            groups: Vec::new(),
            ..Self::default()
        }
    }

    /// Set the listen address
    pub fn with_listen(mut self, listen: SocketAddr) -> Self {
        self.listen = listen;
        self
    }

    /// Set the host name
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Use file storage under `root`
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage = StorageBackend::File { root: root.into() };
        self
    }

    /// Add a group created at startup
    pub fn with_group(mut self, group: GroupConfig) -> Self {
        self.groups.push(group);
        self
    }

    /// Enable or disable posting server-wide
    pub fn with_posting(mut self, allow: bool) -> Self {
        self.allow_posting = allow;
        self
    }

    /// Set the listing batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Idle timeout as a `Duration`
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Write timeout as a `Duration`
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}
