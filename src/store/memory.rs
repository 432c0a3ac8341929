use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use super::ArticleStore;
use crate::article::Article;
use crate::{NntpError, Result};

/// In-memory article store
///
/// Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryArticleStore {
    articles: RwLock<HashMap<String, Arc<Article>>>,
}

impl MemoryArticleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored articles
    pub fn len(&self) -> usize {
        self.articles.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.articles.read().is_empty()
    }
}

impl ArticleStore for MemoryArticleStore {
    fn put(&self, article: &Article) -> Result<()> {
        match self.articles.write().entry(article.message_id.clone()) {
            Entry::Occupied(_) => Err(NntpError::DuplicateArticle(article.message_id.clone())),
            Entry::Vacant(slot) => {
                trace!("Stored {} in memory", article.message_id);
                slot.insert(Arc::new(article.clone()));
                Ok(())
            }
        }
    }

    fn get(&self, message_id: &str) -> Result<Arc<Article>> {
        self.articles
            .read()
            .get(message_id)
            .cloned()
            .ok_or_else(|| NntpError::NotFound(message_id.to_string()))
    }

    fn delete(&self, message_id: &str) -> Result<()> {
        self.articles
            .write()
            .remove(message_id)
            .map(|_| ())
            .ok_or_else(|| NntpError::NotFound(message_id.to_string()))
    }

    fn contains(&self, message_id: &str) -> Result<bool> {
        Ok(self.articles.read().contains_key(message_id))
    }
}
