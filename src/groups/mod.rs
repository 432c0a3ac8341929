//! Newsgroup index
//!
//! Maps each newsgroup's article numbers to message-ids and keeps the group
//! metadata (watermarks, posting flag, description, creation time).
//!
//! Every group has its own lock, so posts into different groups never
//! contend. Numbers are assigned from a per-group counter: `high + 1`, never
//! reused, even after the article is removed.
//!
//! Watermarks:
//! - `high` is the largest number ever assigned (0 for a fresh group)
//! - `low` is the smallest live number, or `high` when the group is empty
//!
//! so `low <= high` always holds and both only move forward.
//!
//! An index opened with [`GroupIndex::open`] persists each group as
//! `<dir>/<name>.meta` (JSON metadata, written atomically) and
//! `<dir>/<name>.journal` (append-only number assignments and removals).

mod journal;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use self::journal::{Journal, JournalRecord};
use crate::durable::{atomic_write, remove_tmp_files};
use crate::validation::validate_newsgroup_name;
use crate::{NntpError, Result};

/// Group metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    /// Dotted group name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Whether posting into this group is allowed
    pub posting_allowed: bool,
    /// When the group was created
    pub created: DateTime<Utc>,
}

/// Watermarks and article count of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupStats {
    /// Smallest live article number (equals `high` when empty)
    pub low: u64,
    /// Largest article number ever assigned
    pub high: u64,
    /// Number of live articles
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroupMeta {
    name: String,
    #[serde(default)]
    description: String,
    posting_allowed: bool,
    created: i64,
}

#[derive(Debug, Clone)]
struct ArticleEntry {
    message_id: String,
    posted: DateTime<Utc>,
}

#[derive(Debug)]
struct GroupState {
    info: GroupInfo,
    high: u64,
    articles: BTreeMap<u64, ArticleEntry>,
    by_id: HashMap<String, u64>,
    journal: Option<Journal>,
}

impl GroupState {
    fn new(info: GroupInfo, journal: Option<Journal>) -> Self {
        Self {
            info,
            high: 0,
            articles: BTreeMap::new(),
            by_id: HashMap::new(),
            journal,
        }
    }

    fn stats(&self) -> GroupStats {
        let low = self
            .articles
            .keys()
            .next()
            .copied()
            .unwrap_or(self.high);
        GroupStats {
            low,
            high: self.high,
            count: self.articles.len() as u64,
        }
    }

    fn apply(&mut self, record: JournalRecord) {
        match record {
            JournalRecord::Posted {
                number,
                posted,
                message_id,
            } => {
                let posted = DateTime::from_timestamp(posted, 0).unwrap_or_default();
                self.high = self.high.max(number);
                self.by_id.insert(message_id.clone(), number);
                self.articles.insert(number, ArticleEntry { message_id, posted });
            }
            JournalRecord::Removed { number } => {
                if let Some(entry) = self.articles.remove(&number) {
                    self.by_id.remove(&entry.message_id);
                }
            }
        }
    }

    fn record(&mut self, record: JournalRecord) -> Result<()> {
        if let Some(journal) = self.journal.as_mut() {
            journal.append(&record)?;
        }
        self.apply(record);
        Ok(())
    }

    fn remove(&mut self, number: u64) -> Result<String> {
        let message_id = self
            .articles
            .get(&number)
            .map(|entry| entry.message_id.clone())
            .ok_or(NntpError::NoSuchArticleNumber(number))?;
        self.record(JournalRecord::Removed { number })?;
        Ok(message_id)
    }
}

type GroupHandle = Arc<Mutex<GroupState>>;

/// Per-group article numbering and metadata
///
/// # Example
///
/// ```
/// use nntp_server::groups::GroupIndex;
///
/// # fn main() -> nntp_server::Result<()> {
/// let index = GroupIndex::in_memory();
/// index.create_group("alt.binaries.test", true, "")?;
/// assert_eq!(index.post("alt.binaries.test", "<1@test>")?, 1);
/// assert_eq!(index.resolve("alt.binaries.test", 1)?, "<1@test>");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GroupIndex {
    groups: RwLock<BTreeMap<String, GroupHandle>>,
    /// Directory for meta and journal files; `None` keeps everything in memory
    dir: Option<PathBuf>,
}

impl GroupIndex {
    /// Create an index that keeps everything in memory
    pub fn in_memory() -> Self {
        Self {
            groups: RwLock::new(BTreeMap::new()),
            dir: None,
        }
    }

    /// Open (creating if needed) a durable index in `dir` and replay its journals
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let cleaned = remove_tmp_files(&dir)?;
        if cleaned > 0 {
            warn!("Removed {} interrupted group metadata writes", cleaned);
        }

        let mut groups = BTreeMap::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension() != Some("meta".as_ref()) {
                continue;
            }

            let meta: GroupMeta = serde_json::from_slice(&fs::read(&path)?)?;
            let info = GroupInfo {
                name: meta.name.clone(),
                description: meta.description,
                posting_allowed: meta.posting_allowed,
                created: DateTime::from_timestamp(meta.created, 0).unwrap_or_default(),
            };

            let (journal, records) = Journal::open(&journal_path(&dir, &meta.name))?;
            let replayed = records.len();
            let mut state = GroupState::new(info, Some(journal));
            for record in records {
                state.apply(record);
            }

            let stats = state.stats();
            debug!(
                "Loaded group {} ({} journal records, {} articles, high {})",
                meta.name, replayed, stats.count, stats.high
            );
            groups.insert(meta.name, Arc::new(Mutex::new(state)));
        }

        info!("Group index opened at {} with {} groups", dir.display(), groups.len());
        Ok(Self {
            groups: RwLock::new(groups),
            dir: Some(dir),
        })
    }

    fn handle(&self, group: &str) -> Result<GroupHandle> {
        self.groups
            .read()
            .get(group)
            .cloned()
            .ok_or_else(|| NntpError::NoSuchGroup(group.to_string()))
    }

    /// Create a group
    ///
    /// Fails with `GroupExists` if the name is taken and `InvalidName` if it
    /// is not a valid newsgroup name.
    pub fn create_group(&self, name: &str, posting_allowed: bool, description: &str) -> Result<()> {
        validate_newsgroup_name(name)?;

        let mut groups = self.groups.write();
        if groups.contains_key(name) {
            return Err(NntpError::GroupExists(name.to_string()));
        }

        let info = GroupInfo {
            name: name.to_string(),
            description: description.to_string(),
            posting_allowed,
            created: Utc::now(),
        };

        let journal = match &self.dir {
            Some(dir) => {
                let meta = GroupMeta {
                    name: info.name.clone(),
                    description: info.description.clone(),
                    posting_allowed,
                    created: info.created.timestamp(),
                };
                atomic_write(&dir.join(format!("{name}.meta")), &serde_json::to_vec(&meta)?)?;
                let (journal, _) = Journal::open(&journal_path(dir, name))?;
                debug!("Journal for {} at {}", name, journal.path().display());
                Some(journal)
            }
            None => None,
        };

        groups.insert(
            name.to_string(),
            Arc::new(Mutex::new(GroupState::new(info, journal))),
        );
        info!("Created group {} (posting {})", name, posting_allowed);
        Ok(())
    }

    /// Whether a group exists
    pub fn contains(&self, group: &str) -> bool {
        self.groups.read().contains_key(group)
    }

    /// Assign the next article number in `group` to `message_id`
    ///
    /// The assignment is journaled before it becomes visible. Posting an id
    /// that is already mapped in this group returns its existing number.
    pub fn post(&self, group: &str, message_id: &str) -> Result<u64> {
        if message_id.is_empty() || message_id.contains(char::is_whitespace) {
            return Err(NntpError::InvalidName(format!(
                "Message-ID {message_id:?} cannot be indexed"
            )));
        }

        let handle = self.handle(group)?;
        let mut state = handle.lock();
        if let Some(&number) = state.by_id.get(message_id) {
            return Ok(number);
        }

        let number = state.high + 1;
        state.record(JournalRecord::Posted {
            number,
            posted: Utc::now().timestamp(),
            message_id: message_id.to_string(),
        })?;
        debug!("Assigned {}:{} to {}", group, number, message_id);
        Ok(number)
    }

    #[cfg(test)]
    pub(crate) fn poison_journal(&self, group: &str) -> Result<()> {
        if let Some(journal) = self.handle(group)?.lock().journal.as_mut() {
            journal.poison();
        }
        Ok(())
    }

    /// Message-id stored under `number` in `group`
    pub fn resolve(&self, group: &str, number: u64) -> Result<String> {
        let handle = self.handle(group)?;
        let state = handle.lock();
        state
            .articles
            .get(&number)
            .map(|entry| entry.message_id.clone())
            .ok_or(NntpError::NoSuchArticleNumber(number))
    }

    /// Number of `message_id` in `group`, if it is indexed there
    pub fn number_of(&self, group: &str, message_id: &str) -> Result<Option<u64>> {
        let handle = self.handle(group)?;
        let state = handle.lock();
        Ok(state.by_id.get(message_id).copied())
    }

    /// Live `(number, message-id)` pairs with `low <= number <= high`, in order
    pub fn list_range(&self, group: &str, low: u64, high: u64) -> Result<Vec<(u64, String)>> {
        self.list_batch(group, low, high, usize::MAX)
    }

    /// Like [`list_range`](Self::list_range) but returns at most `limit` pairs
    ///
    /// Callers page through a large range by resuming after the last number
    /// returned.
    pub fn list_batch(
        &self,
        group: &str,
        low: u64,
        high: u64,
        limit: usize,
    ) -> Result<Vec<(u64, String)>> {
        let handle = self.handle(group)?;
        if low > high {
            return Ok(Vec::new());
        }
        let state = handle.lock();
        Ok(state
            .articles
            .range(low..=high)
            .take(limit)
            .map(|(&number, entry)| (number, entry.message_id.clone()))
            .collect())
    }

    /// Watermarks and count of a group
    pub fn stats(&self, group: &str) -> Result<GroupStats> {
        Ok(self.handle(group)?.lock().stats())
    }

    /// Metadata of a group
    pub fn info(&self, group: &str) -> Result<GroupInfo> {
        Ok(self.handle(group)?.lock().info.clone())
    }

    /// Every group with its stats, in name order
    pub fn groups(&self) -> Vec<(GroupInfo, GroupStats)> {
        let handles: Vec<GroupHandle> = self.groups.read().values().cloned().collect();
        handles
            .iter()
            .map(|handle| {
                let state = handle.lock();
                (state.info.clone(), state.stats())
            })
            .collect()
    }

    /// First live article after `number`
    pub fn next(&self, group: &str, number: u64) -> Result<Option<(u64, String)>> {
        let handle = self.handle(group)?;
        let state = handle.lock();
        Ok(state
            .articles
            .range(number.saturating_add(1)..)
            .next()
            .map(|(&n, entry)| (n, entry.message_id.clone())))
    }

    /// Last live article before `number`
    pub fn previous(&self, group: &str, number: u64) -> Result<Option<(u64, String)>> {
        let handle = self.handle(group)?;
        let state = handle.lock();
        Ok(state
            .articles
            .range(..number)
            .next_back()
            .map(|(&n, entry)| (n, entry.message_id.clone())))
    }

    /// Withdraw one number from a group; returns the message-id it mapped
    ///
    /// The number is never reassigned.
    pub fn remove(&self, group: &str, number: u64) -> Result<String> {
        let handle = self.handle(group)?;
        let message_id = handle.lock().remove(number)?;
        debug!("Removed {}:{} ({})", group, number, message_id);
        Ok(message_id)
    }

    /// Withdraw `message_id` from every group that indexes it
    ///
    /// Returns the `(group, number)` pairs removed.
    pub fn remove_message(&self, message_id: &str) -> Result<Vec<(String, u64)>> {
        let handles: Vec<(String, GroupHandle)> = self
            .groups
            .read()
            .iter()
            .map(|(name, handle)| (name.clone(), handle.clone()))
            .collect();

        let mut removed = Vec::new();
        for (name, handle) in handles {
            let mut state = handle.lock();
            if let Some(&number) = state.by_id.get(message_id) {
                state.remove(number)?;
                removed.push((name, number));
            }
        }
        Ok(removed)
    }

    /// Message-ids posted to `group` at or after `since`, in number order
    pub fn since(&self, group: &str, since: DateTime<Utc>) -> Result<Vec<String>> {
        let handle = self.handle(group)?;
        let state = handle.lock();
        Ok(state
            .articles
            .values()
            .filter(|entry| entry.posted >= since)
            .map(|entry| entry.message_id.clone())
            .collect())
    }
}

fn journal_path(dir: &Path, group: &str) -> PathBuf {
    dir.join(format!("{group}.journal"))
}
