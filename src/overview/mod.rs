//! Overview rows and their cache (RFC 3977 Section 8.3)
//!
//! An [`OverviewRow`] summarizes one article for OVER/XOVER. Rows are
//! derived from the article store and group index on first access and kept
//! in a bounded LRU keyed by `(group, number)`. A cached row is only served
//! while the index still maps that number to the row's message-id, so a
//! removed or reassigned number is never answered from the cache.

mod lru;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use self::lru::LruCache;
use crate::article::Article;
use crate::groups::GroupIndex;
use crate::store::ArticleStore;
use crate::{NntpError, Result};

/// Fields of an overview line, in order, as returned by LIST OVERVIEW.FMT
pub const OVERVIEW_FMT: [&str; 7] = [
    "Subject:",
    "From:",
    "Date:",
    "Message-ID:",
    "References:",
    ":bytes",
    ":lines",
];

/// Summary of one article (RFC 3977 Section 8.3.2)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewRow {
    /// Article number within the group (0 when looked up by message-id)
    pub number: u64,
    /// Subject header, unfolded
    pub subject: String,
    /// From header, unfolded
    pub from: String,
    /// Date header, unfolded
    pub date: String,
    /// Message-ID of the article
    pub message_id: String,
    /// References header, unfolded
    pub references: String,
    /// Article size in bytes
    pub bytes: usize,
    /// Number of body lines
    pub lines: usize,
}

impl OverviewRow {
    /// Summarize an article stored under `number`
    pub fn from_article(number: u64, article: &Article) -> Self {
        let field = |name: &str| article.headers.get_unfolded(name).unwrap_or_default();
        Self {
            number,
            subject: field("Subject"),
            from: field("From"),
            date: field("Date"),
            message_id: article.message_id.clone(),
            references: field("References"),
            bytes: article.byte_size(),
            lines: article.line_count(),
        }
    }

    /// Value of an overview field by header name or metadata item
    ///
    /// Used by HDR for the fields the overview already holds.
    pub fn field(&self, name: &str) -> Option<String> {
        let value = match name.to_ascii_lowercase().as_str() {
            "subject" => self.subject.clone(),
            "from" => self.from.clone(),
            "date" => self.date.clone(),
            "message-id" => self.message_id.clone(),
            "references" => self.references.clone(),
            ":bytes" => self.bytes.to_string(),
            ":lines" | "lines" => self.lines.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

impl fmt::Display for OverviewRow {
    /// Tab-separated overview line without terminator
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.number,
            self.subject,
            self.from,
            self.date,
            self.message_id,
            self.references,
            self.bytes,
            self.lines
        )
    }
}

type RowKey = (String, u64);

/// Cache of overview rows, validated against the group index on every read
///
/// Concurrent readers may derive the same row twice; the second insert
/// simply replaces the first.
pub struct OverviewCache {
    store: Arc<dyn ArticleStore>,
    index: Arc<GroupIndex>,
    rows: Mutex<LruCache<RowKey, Arc<OverviewRow>>>,
}

impl fmt::Debug for OverviewCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverviewCache")
            .field("cached", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl OverviewCache {
    /// Create a cache over `store` and `index` holding at most `capacity` rows
    pub fn new(store: Arc<dyn ArticleStore>, index: Arc<GroupIndex>, capacity: usize) -> Self {
        Self {
            store,
            index,
            rows: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn cached(&self, key: &RowKey, message_id: &str) -> Option<Arc<OverviewRow>> {
        let mut rows = self.rows.lock();
        let stale = match rows.get(key) {
            Some(row) if row.message_id == message_id => return Some(row.clone()),
            Some(_) => true,
            None => false,
        };
        if stale {
            trace!("Dropping stale overview row {}:{}", key.0, key.1);
            rows.remove(key);
        }
        None
    }

    fn derive(&self, group: &str, number: u64, message_id: &str) -> Result<Arc<OverviewRow>> {
        let key = (group.to_string(), number);
        if let Some(row) = self.cached(&key, message_id) {
            return Ok(row);
        }

        let article = self.store.get(message_id)?;
        let row = Arc::new(OverviewRow::from_article(number, &article));
        self.rows.lock().put(key, row.clone());
        Ok(row)
    }

    /// Overview row for `number` in `group`
    ///
    /// Fails with `NoSuchGroup`, `NoSuchArticleNumber` when the index has no
    /// such number, or `NotFound` when the index points at an article the
    /// store no longer has.
    pub fn get(&self, group: &str, number: u64) -> Result<Arc<OverviewRow>> {
        let message_id = self.index.resolve(group, number)?;
        self.derive(group, number, &message_id)
    }

    /// Rows for every live number in `low..=high`, in order
    ///
    /// Numbers whose article is missing from the store are skipped.
    pub fn get_range(&self, group: &str, low: u64, high: u64) -> Result<Vec<Arc<OverviewRow>>> {
        self.get_batch(group, low, high, usize::MAX)
            .map(|(rows, _)| rows)
    }

    /// Like [`get_range`](Self::get_range) but covers at most `limit` index entries
    ///
    /// Returns the rows and the last article number examined (`None` once
    /// the range is exhausted), so a caller can resume from the next number.
    pub fn get_batch(
        &self,
        group: &str,
        low: u64,
        high: u64,
        limit: usize,
    ) -> Result<(Vec<Arc<OverviewRow>>, Option<u64>)> {
        let entries = self.index.list_batch(group, low, high, limit)?;
        let last = entries.last().map(|(number, _)| *number);
        let mut rows = Vec::with_capacity(entries.len());
        for (number, message_id) in entries {
            match self.derive(group, number, &message_id) {
                Ok(row) => rows.push(row),
                Err(NntpError::NotFound(_)) => {
                    debug!("{}:{} points at missing {}", group, number, message_id);
                }
                Err(err) => return Err(err),
            }
        }
        Ok((rows, last))
    }

    /// Row for an article looked up by message-id; never cached
    pub fn get_by_message_id(&self, message_id: &str) -> Result<OverviewRow> {
        let article = self.store.get(message_id)?;
        Ok(OverviewRow::from_article(0, &article))
    }

    /// Cache a row for a freshly posted article
    pub fn insert(&self, group: &str, number: u64, article: &Article) {
        let row = Arc::new(OverviewRow::from_article(number, article));
        self.rows.lock().put((group.to_string(), number), row);
    }

    /// Drop the cached row for one number
    pub fn invalidate(&self, group: &str, number: u64) {
        self.rows.lock().remove(&(group.to_string(), number));
    }

    /// Drop every cached row for a message-id
    pub fn evict_message(&self, message_id: &str) -> usize {
        self.rows
            .lock()
            .remove_where(|_, row| row.message_id == message_id)
    }

    /// Whether a row for this number is currently cached
    pub fn is_cached(&self, group: &str, number: u64) -> bool {
        self.rows.lock().contains(&(group.to_string(), number))
    }

    /// Drop all cached rows
    pub fn clear(&self) {
        self.rows.lock().clear();
    }

    /// Number of cached rows
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    /// Whether no rows are cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached rows
    pub fn capacity(&self) -> usize {
        self.rows.lock().capacity()
    }
}
