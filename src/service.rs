//! Shared news service: article store, group index and overview cache
//!
//! Every connection holds an `Arc<NewsService>`. The service owns no
//! per-session state; it only combines the three storage components and
//! runs the posting and cancel pipelines across them.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::article::{Article, ArticleBuilder, ControlMessage};
use crate::config::{ServerConfig, StorageBackend};
use crate::groups::{GroupIndex, GroupInfo, GroupStats};
use crate::overview::{OverviewCache, OverviewRow};
use crate::store::{ArticleStore, FileArticleStore, MemoryArticleStore};
use crate::validation::validate_newsgroup_name;
use crate::wildmat::Wildmat;
use crate::{NntpError, Result};

/// Result of an accepted POST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostOutcome {
    /// Message-ID the article was stored under
    pub message_id: String,
    /// `(group, number)` for every group the article was filed into
    pub posted: Vec<(String, u64)>,
    /// `(group, reason)` for every named group that did not take the article
    pub rejected: Vec<(String, String)>,
    /// Message-ID withdrawn by a cancel control message
    pub cancelled: Option<String>,
}

/// Store, index and overview shared by all sessions
pub struct NewsService {
    config: ServerConfig,
    store: Arc<dyn ArticleStore>,
    index: Arc<GroupIndex>,
    overview: OverviewCache,
}

impl fmt::Debug for NewsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsService")
            .field("hostname", &self.config.hostname)
            .field("store", &self.store)
            .field("overview", &self.overview)
            .finish()
    }
}

impl NewsService {
    /// Combine an existing store and index
    pub fn new(config: ServerConfig, store: Arc<dyn ArticleStore>, index: Arc<GroupIndex>) -> Self {
        let overview = OverviewCache::new(
            store.clone(),
            index.clone(),
            config.overview_cache_capacity,
        );
        Self {
            config,
            store,
            index,
            overview,
        }
    }

    /// Open the configured storage backend and create the configured groups
    ///
    /// File storage keeps articles under `<root>/articles` and the group
    /// index under `<root>/groups`.
    pub fn open(config: ServerConfig) -> Result<Self> {
        let (store, index): (Arc<dyn ArticleStore>, GroupIndex) = match &config.storage {
            StorageBackend::File { root } => {
                info!("Opening file storage at {}", root.display());
                (
                    Arc::new(FileArticleStore::open(root)?),
                    GroupIndex::open(root.join("groups"))?,
                )
            }
            StorageBackend::Memory => {
                info!("Using in-memory storage");
                (Arc::new(MemoryArticleStore::new()), GroupIndex::in_memory())
            }
        };

        let service = Self::new(config, store, Arc::new(index));
        service.create_configured_groups()?;
        Ok(service)
    }

    /// Create every configured group that does not exist yet
    fn create_configured_groups(&self) -> Result<()> {
        for group in &self.config.groups {
            match self
                .index
                .create_group(&group.name, group.posting_allowed, &group.description)
            {
                Ok(()) => {}
                Err(NntpError::GroupExists(_)) => {
                    debug!("Group {} already exists", group.name);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ArticleStore> {
        &self.store
    }

    pub fn index(&self) -> &Arc<GroupIndex> {
        &self.index
    }

    pub fn overview(&self) -> &OverviewCache {
        &self.overview
    }

    /// Whether the server accepts POST at all
    pub fn posting_allowed(&self) -> bool {
        self.config.allow_posting
    }

    /// Article by message-id
    ///
    /// A store miss is reported as `NoSuchArticle`.
    pub fn article(&self, message_id: &str) -> Result<Arc<Article>> {
        self.store.get(message_id).map_err(|err| match err {
            NntpError::NotFound(id) => NntpError::NoSuchArticle(id),
            err => err,
        })
    }

    /// Article by number in `group`
    ///
    /// An index entry whose article is gone from the store is reported as
    /// `NoSuchArticleNumber`, the same as a number that was never assigned.
    pub fn article_by_number(&self, group: &str, number: u64) -> Result<Arc<Article>> {
        let message_id = self.index.resolve(group, number)?;
        self.store.get(&message_id).map_err(|err| match err {
            NntpError::NotFound(_) => NntpError::NoSuchArticleNumber(number),
            err => err,
        })
    }

    /// Groups selected by `wildmat`, in name order
    pub fn list_groups(&self, wildmat: &Wildmat) -> Vec<(GroupInfo, GroupStats)> {
        self.index
            .groups()
            .into_iter()
            .filter(|(info, _)| wildmat.matches(&info.name))
            .collect()
    }

    /// Groups created at or after `since`
    pub fn new_groups(&self, since: DateTime<Utc>) -> Vec<(GroupInfo, GroupStats)> {
        self.index
            .groups()
            .into_iter()
            .filter(|(info, _)| info.created >= since)
            .collect()
    }

    /// Message-ids that arrived at or after `since` in groups matching `wildmat`
    ///
    /// An article crossposted to several matching groups is listed once.
    pub fn new_news(&self, wildmat: &Wildmat, since: DateTime<Utc>) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for (info, _) in self.list_groups(wildmat) {
            for id in self.index.since(&info.name, since)? {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    /// Value of header `field` for up to `limit` index entries of `group` in `low..=high`
    ///
    /// Fields the overview holds come from the overview cache; anything else
    /// is read from the stored article. Missing headers yield an empty value.
    /// Also returns the last number examined, for resuming.
    pub fn header_batch(
        &self,
        group: &str,
        field: &str,
        low: u64,
        high: u64,
        limit: usize,
    ) -> Result<(Vec<(u64, String)>, Option<u64>)> {
        if is_overview_field(field) {
            let (rows, last) = self.overview.get_batch(group, low, high, limit)?;
            let values = rows
                .iter()
                .map(|row| (row.number, row.field(field).unwrap_or_default()))
                .collect();
            return Ok((values, last));
        }

        let entries = self.index.list_batch(group, low, high, limit)?;
        let last = entries.last().map(|(number, _)| *number);
        let mut values = Vec::with_capacity(entries.len());
        for (number, message_id) in entries {
            match self.store.get(&message_id) {
                Ok(article) => values.push((number, header_value(&article, field))),
                Err(NntpError::NotFound(_)) => {
                    debug!("{}:{} points at missing {}", group, number, message_id);
                }
                Err(err) => return Err(err),
            }
        }
        Ok((values, last))
    }

    /// Value of header `field` for one article by message-id
    pub fn header_by_message_id(&self, message_id: &str, field: &str) -> Result<String> {
        let article = self.article(message_id)?;
        Ok(header_value(&article, field))
    }

    /// Overview row for one article by message-id
    pub fn overview_by_message_id(&self, message_id: &str) -> Result<OverviewRow> {
        self.overview
            .get_by_message_id(message_id)
            .map_err(|err| match err {
                NntpError::NotFound(id) => NntpError::NoSuchArticle(id),
                err => err,
            })
    }

    /// Store and index a posted article
    ///
    /// `raw` is the article as received after dot-unstuffing. The article is
    /// validated and completed first, so a malformed post stores nothing.
    /// Named groups that are invalid, unknown or closed to posting are
    /// skipped and reported; if none is left the post fails before the
    /// store is touched. A duplicate message-id is rejected before any
    /// indexing. If indexing fails in every group the stored copy is removed
    /// and the first indexing error is returned. A cancel that fails is
    /// logged and leaves `cancelled` empty.
    pub fn post(&self, raw: &[u8]) -> Result<PostOutcome> {
        if !self.config.allow_posting {
            return Err(NntpError::PostingNotPermitted);
        }

        let article = ArticleBuilder::from_raw(raw)?
            .hostname(self.config.hostname.clone())
            .build()?;

        let mut targets = Vec::new();
        let mut rejected = Vec::new();
        for group in article.headers.newsgroups() {
            if targets.contains(&group) {
                continue;
            }
            match self.check_target(&group) {
                Ok(()) => targets.push(group),
                Err(reason) => rejected.push((group, reason)),
            }
        }
        if targets.is_empty() {
            return Err(NntpError::PostingFailed(
                "No newsgroup accepts this article".to_string(),
            ));
        }

        self.store.put(&article)?;

        let mut posted = Vec::with_capacity(targets.len());
        let mut first_error = None;
        for group in targets {
            match self.index.post(&group, &article.message_id) {
                Ok(number) => {
                    self.overview.insert(&group, number, &article);
                    posted.push((group, number));
                }
                Err(err) => {
                    warn!(
                        "Could not index {} into {}: {}",
                        article.message_id, group, err
                    );
                    rejected.push((group, err.to_string()));
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        if posted.is_empty()
            && let Some(err) = first_error
        {
            // Filed nowhere: take the stored copy back out
            if let Err(undo) = self.store.delete(&article.message_id) {
                warn!("Could not remove unindexed {}: {}", article.message_id, undo);
            }
            return Err(err);
        }

        // A failed cancel leaves the post standing
        let cancelled = match article.control_message() {
            Some(ControlMessage::Cancel { message_id }) => {
                match self.cancel(&article, &message_id) {
                    Ok(cancelled) => cancelled,
                    Err(err) => {
                        warn!("Cancel of {} failed: {}", message_id, err);
                        None
                    }
                }
            }
            _ => None,
        };

        info!(
            "Posted {} to {} group(s), {} rejected",
            article.message_id,
            posted.len(),
            rejected.len()
        );
        Ok(PostOutcome {
            message_id: article.message_id,
            posted,
            rejected,
            cancelled,
        })
    }

    fn check_target(&self, group: &str) -> std::result::Result<(), String> {
        validate_newsgroup_name(group).map_err(|err| err.to_string())?;
        match self.index.info(group) {
            Ok(info) if info.posting_allowed => Ok(()),
            Ok(_) => Err("posting not allowed".to_string()),
            Err(err) => Err(err.to_string()),
        }
    }

    /// Honour `cancel <target>` when the cancel comes from the target's poster
    fn cancel(&self, control: &Article, target: &str) -> Result<Option<String>> {
        let original = match self.store.get(target) {
            Ok(article) => article,
            Err(NntpError::NotFound(_)) => {
                debug!("Cancel for unknown article {}", target);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let sender = control.headers.get_unfolded("From");
        if sender.is_none() || sender != original.headers.get_unfolded("From") {
            warn!(
                "Ignoring cancel of {} from {:?}: sender does not match",
                target, sender
            );
            return Ok(None);
        }

        self.delete_article(target)?;
        Ok(Some(target.to_string()))
    }

    /// Remove an article from the store, every group and the overview cache
    ///
    /// Returns the `(group, number)` entries withdrawn. The numbers are never
    /// reused. Fails with `NotFound` when neither the store nor any group
    /// knew the message-id.
    pub fn delete_article(&self, message_id: &str) -> Result<Vec<(String, u64)>> {
        let stored = match self.store.delete(message_id) {
            Ok(()) => true,
            Err(NntpError::NotFound(_)) => false,
            Err(err) => return Err(err),
        };
        let removed = self.index.remove_message(message_id)?;
        let evicted = self.overview.evict_message(message_id);

        if !stored && removed.is_empty() {
            return Err(NntpError::NotFound(message_id.to_string()));
        }
        info!(
            "Deleted {} ({} index entries, {} overview rows)",
            message_id,
            removed.len(),
            evicted
        );
        Ok(removed)
    }
}

fn is_overview_field(field: &str) -> bool {
    matches!(
        field.to_ascii_lowercase().as_str(),
        "subject" | "from" | "date" | "message-id" | "references" | ":bytes" | ":lines"
    )
}

fn header_value(article: &Article, field: &str) -> String {
    match field.to_ascii_lowercase().as_str() {
        ":bytes" => article.byte_size().to_string(),
        ":lines" => article.line_count().to_string(),
        _ => article.headers.get_unfolded(field).unwrap_or_default(),
    }
}
