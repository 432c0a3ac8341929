use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use fs2::FileExt;
use md5::{Digest, Md5};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::ArticleStore;
use crate::article::{Article, Headers};
use crate::durable::{TMP_EXTENSION, atomic_write, remove_tmp_files, sync_dir};
use crate::{NntpError, Result};

/// On-disk form of one article
#[derive(Debug, Serialize, Deserialize)]
struct ArticleRecord {
    message_id: String,
    headers: Headers,
    /// Base64 of the body bytes
    body: String,
    /// CRC32 of the decoded body
    crc32: u32,
}

/// File-backed article store
///
/// Each article is one JSON record at
/// `<root>/articles/<aa>/<bb>/<md5(message-id)>.json`, where `aa` and `bb`
/// are the first two bytes of the hash. Records are written with
/// temp file + fsync + rename, so a crash leaves either no record or a
/// complete one.
///
/// # Example
///
/// ```no_run
/// use nntp_server::store::{ArticleStore, FileArticleStore};
///
/// # fn main() -> nntp_server::Result<()> {
/// let store = FileArticleStore::open("./storage")?;
/// let article = store.get("<1@test>")?;
/// println!("{} bytes", article.byte_size());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FileArticleStore {
    dir: PathBuf,
    /// Message-ids with a put in flight
    pending: Mutex<HashSet<String>>,
    /// Exclusive lock on `<root>/LOCK`, released on drop
    _lock: File,
}

const LOCK_FILE: &str = "LOCK";

/// Take the exclusive lock on a storage root and record our pid in it
fn lock_root(root: &Path) -> Result<File> {
    let path = root.join(LOCK_FILE);
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(&path)?;

    if file.try_lock_exclusive().is_err() {
        let holder = fs::read_to_string(&path).unwrap_or_default();
        return Err(NntpError::Storage(format!(
            "Storage root {} is locked by another process (pid {})",
            root.display(),
            holder.trim()
        )));
    }

    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    file.sync_all()?;
    debug!("Locked {}", path.display());
    Ok(file)
}

impl FileArticleStore {
    /// Open (creating if needed) the store under `root`
    ///
    /// The root is locked for as long as the store lives; a second open of
    /// the same root, from this process or another, fails with `Storage`.
    /// Leftover temp files from interrupted writes are removed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        let lock = lock_root(root)?;

        let dir = root.join("articles");
        fs::create_dir_all(&dir)?;

        let cleaned = remove_tmp_files(&dir)?;
        if cleaned > 0 {
            warn!("Removed {} interrupted article writes", cleaned);
        }
        info!("Article store opened at {}", dir.display());

        Ok(Self {
            dir,
            pending: Mutex::new(HashSet::new()),
            _lock: lock,
        })
    }

    /// Path of the record for a message-id
    pub fn path_for(&self, message_id: &str) -> PathBuf {
        let digest = Md5::digest(message_id.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        self.dir
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(format!("{hex}.json"))
    }

    fn write_record(&self, path: &Path, article: &Article) -> Result<()> {
        let record = ArticleRecord {
            message_id: article.message_id.clone(),
            headers: article.headers.clone(),
            body: STANDARD.encode(&article.body),
            crc32: crc32fast::hash(&article.body),
        };
        let data = serde_json::to_vec(&record)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        atomic_write(path, &data).inspect_err(|_| {
            let _ = fs::remove_file(path.with_extension(TMP_EXTENSION));
        })
    }

    fn read_record(&self, path: &Path, message_id: &str) -> Result<Article> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(NntpError::NotFound(message_id.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        let record: ArticleRecord = serde_json::from_slice(&data)?;
        if record.message_id != message_id {
            return Err(NntpError::Storage(format!(
                "{} holds {} instead of {}",
                path.display(),
                record.message_id,
                message_id
            )));
        }

        let body = STANDARD.decode(&record.body).map_err(|e| {
            NntpError::Storage(format!("Corrupt body for {message_id}: {e}"))
        })?;
        let crc = crc32fast::hash(&body);
        if crc != record.crc32 {
            return Err(NntpError::Storage(format!(
                "CRC mismatch for {message_id}: stored {:08x}, computed {crc:08x}",
                record.crc32
            )));
        }

        Ok(Article::new(record.message_id, record.headers, body))
    }
}

impl ArticleStore for FileArticleStore {
    fn put(&self, article: &Article) -> Result<()> {
        let id = &article.message_id;
        let path = self.path_for(id);

        {
            let mut pending = self.pending.lock();
            if pending.contains(id) || path.try_exists()? {
                return Err(NntpError::DuplicateArticle(id.clone()));
            }
            pending.insert(id.clone());
        }

        let result = self.write_record(&path, article);
        self.pending.lock().remove(id);

        if result.is_ok() {
            debug!("Stored {} at {}", id, path.display());
        }
        result
    }

    fn get(&self, message_id: &str) -> Result<Arc<Article>> {
        let path = self.path_for(message_id);
        self.read_record(&path, message_id).map(Arc::new)
    }

    fn delete(&self, message_id: &str) -> Result<()> {
        let path = self.path_for(message_id);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(NntpError::NotFound(message_id.to_string()));
            }
            Err(err) => return Err(err.into()),
        }
        if let Some(parent) = path.parent() {
            sync_dir(parent)?;
        }
        debug!("Deleted {}", message_id);
        Ok(())
    }

    fn contains(&self, message_id: &str) -> Result<bool> {
        Ok(self.path_for(message_id).try_exists()?)
    }
}
