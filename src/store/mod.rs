//! Article storage
//!
//! The [`ArticleStore`] trait is the storage seam: the rest of the server only
//! ever talks to `Arc<dyn ArticleStore>`. Two backends are provided:
//!
//! - [`MemoryArticleStore`]: process-local, for tests and throwaway servers
//! - [`FileArticleStore`]: one durable record per article under a storage root
//!
//! Articles are immutable once stored and keyed by their exact,
//! case-sensitive message-id. Methods are synchronous; async callers run them
//! on the blocking pool so a dropped session never interrupts a write.

mod file;
mod memory;

use std::fmt;
use std::sync::Arc;

use crate::Result;
use crate::article::Article;

pub use self::file::FileArticleStore;
pub use self::memory::MemoryArticleStore;

/// Durable repository of articles keyed by message-id
pub trait ArticleStore: Send + Sync + fmt::Debug {
    /// Store an article
    ///
    /// Fails with `DuplicateArticle` if the message-id is already stored; the
    /// existing article is left untouched. Concurrent puts of the same id
    /// produce exactly one success. Returns only once the article is durable.
    fn put(&self, article: &Article) -> Result<()>;

    /// Fetch an article, or `NotFound`
    fn get(&self, message_id: &str) -> Result<Arc<Article>>;

    /// Remove an article, or `NotFound`
    ///
    /// Group numbering is not touched; dangling references resolve to `NotFound`.
    fn delete(&self, message_id: &str) -> Result<()>;

    /// Whether an article with this message-id is stored
    fn contains(&self, message_id: &str) -> Result<bool>;
}
