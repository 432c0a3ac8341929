//! Connection admission control
//!
//! The server holds one permit per open client connection. When every
//! permit is taken, new clients are turned away instead of queued.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Connection limiter using semaphores
///
/// Limits the number of concurrent client connections so a burst of clients
/// cannot exhaust file descriptors or memory.
#[derive(Debug, Clone)]
pub struct ConnectionLimiter {
    /// Semaphore for limiting connections
    semaphore: Arc<Semaphore>,
    /// Maximum number of connections
    max_connections: usize,
}

impl ConnectionLimiter {
    /// Create a limiter admitting at most `max_connections` clients
    ///
    /// # Example
    ///
    /// ```
    /// use nntp_server::ConnectionLimiter;
    ///
    /// let limiter = ConnectionLimiter::new(2);
    /// let first = limiter.try_acquire().unwrap();
    /// let _second = limiter.try_acquire().unwrap();
    /// assert!(limiter.try_acquire().is_none());
    ///
    /// drop(first);
    /// assert_eq!(limiter.available(), 1);
    /// ```
    pub fn new(max_connections: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_connections)),
            max_connections,
        }
    }

    /// Admit a connection if a slot is free
    ///
    /// The slot is released when the returned permit is dropped.
    pub fn try_acquire(&self) -> Option<ConnectionPermit> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| ConnectionPermit { _permit: permit })
    }

    /// Get the maximum number of connections
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Get the number of available connection slots
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Number of connections currently admitted
    pub fn active(&self) -> usize {
        self.max_connections - self.available()
    }
}

/// RAII guard for one admitted connection
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
}
