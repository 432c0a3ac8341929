//! Append-only per-group journal
//!
//! One line per change:
//!
//! ```text
//! + <number> <unix-seconds> <message-id>
//! - <number>
//! ```
//!
//! Every append is fsynced before it is acknowledged. A failed append is
//! rolled back to the previous length; if that fails too the journal is
//! poisoned and refuses further appends. A final line without its newline is
//! a write torn by a crash; it is dropped on open and the file is truncated
//! back to the last complete line.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{error, warn};

use crate::{NntpError, Result};

/// One journal entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum JournalRecord {
    /// Number assigned to a message-id
    Posted {
        number: u64,
        posted: i64,
        message_id: String,
    },
    /// Number withdrawn; never reassigned
    Removed { number: u64 },
}

impl JournalRecord {
    fn encode(&self) -> String {
        match self {
            JournalRecord::Posted {
                number,
                posted,
                message_id,
            } => format!("+ {number} {posted} {message_id}\n"),
            JournalRecord::Removed { number } => format!("- {number}\n"),
        }
    }

    fn decode(line: &str) -> Option<Self> {
        let mut parts = line.splitn(4, ' ');
        match parts.next()? {
            "+" => {
                let number = parts.next()?.parse().ok()?;
                let posted = parts.next()?.parse().ok()?;
                let message_id = parts.next()?.to_string();
                if message_id.is_empty() {
                    return None;
                }
                Some(JournalRecord::Posted {
                    number,
                    posted,
                    message_id,
                })
            }
            "-" => {
                let number = parts.next()?.parse().ok()?;
                parts.next().is_none().then_some(JournalRecord::Removed { number })
            }
            _ => None,
        }
    }
}

/// Open journal file positioned for appending
#[derive(Debug)]
pub(crate) struct Journal {
    path: PathBuf,
    file: File,
    poisoned: bool,
}

impl Journal {
    /// Open or create the journal at `path` and return its complete records
    pub(crate) fn open(path: &Path) -> Result<(Self, Vec<JournalRecord>)> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        let complete = match data.iter().rposition(|&b| b == b'\n') {
            Some(pos) => pos + 1,
            None => 0,
        };

        let mut records = Vec::new();
        for (line_no, line) in data[..complete].split(|&b| b == b'\n').enumerate() {
            if line.is_empty() {
                continue;
            }
            let record = std::str::from_utf8(line)
                .ok()
                .and_then(JournalRecord::decode)
                .ok_or_else(|| {
                    NntpError::Storage(format!(
                        "Corrupt journal line {} in {}",
                        line_no + 1,
                        path.display()
                    ))
                })?;
            records.push(record);
        }

        if complete < data.len() {
            warn!(
                "Dropping torn journal tail ({} bytes) in {}",
                data.len() - complete,
                path.display()
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(complete as u64)?;
            file.sync_all()?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok((
            Self {
                path: path.to_path_buf(),
                file,
                poisoned: false,
            },
            records,
        ))
    }

    /// Durably append one record
    ///
    /// On error the file is left as it was before the call.
    pub(crate) fn append(&mut self, record: &JournalRecord) -> Result<()> {
        self.append_with(record, |file, bytes| {
            file.write_all(bytes)?;
            file.sync_data()
        })
    }

    fn append_with<F>(&mut self, record: &JournalRecord, write: F) -> Result<()>
    where
        F: FnOnce(&mut File, &[u8]) -> io::Result<()>,
    {
        if self.poisoned {
            return Err(NntpError::Storage(format!(
                "Journal {} is unusable after a failed rollback",
                self.path.display()
            )));
        }

        let len = self.file.metadata()?.len();
        let Err(err) = write(&mut self.file, record.encode().as_bytes()) else {
            return Ok(());
        };

        if let Err(rollback) = self.file.set_len(len).and_then(|_| self.file.sync_all()) {
            error!(
                "Rollback of {} to {} bytes failed: {}",
                self.path.display(),
                len,
                rollback
            );
            self.poisoned = true;
            return Err(NntpError::Storage(format!(
                "Journal {} append failed ({}) and could not be rolled back ({})",
                self.path.display(),
                err,
                rollback
            )));
        }
        warn!("Rolled back failed append to {}: {}", self.path.display(), err);
        Err(err.into())
    }

    #[cfg(test)]
    pub(crate) fn poison(&mut self) {
        self.poisoned = true;
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}
