//! Session state for one client connection

use crate::error::{NntpError, Result};

/// Where a session is in the RFC 3977 reader state machine
///
/// ```text
/// Connected --GROUP--> GroupSelected <--GROUP/NEXT/LAST/ARTICLE n--> GroupSelected
///     \                      |
///      `----QUIT/EOF----> Closed
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No group selected yet
    #[default]
    Connected,
    /// A group is selected
    GroupSelected {
        /// Selected group name
        group: String,
        /// Current article number; `None` when the group was empty on selection
        current: Option<u64>,
    },
    /// Terminal state after QUIT or disconnect
    Closed,
}

impl SessionState {
    /// Select `group`, pointing at `first` (its low watermark when non-empty)
    ///
    /// Has no effect once the session is closed.
    pub fn select(&mut self, group: &str, first: Option<u64>) {
        if self.is_closed() {
            return;
        }
        *self = SessionState::GroupSelected {
            group: group.to_string(),
            current: first,
        };
    }

    /// Move the current article pointer within the selected group
    pub fn set_current(&mut self, number: u64) {
        if let SessionState::GroupSelected { current, .. } = self {
            *current = Some(number);
        }
    }

    /// Enter the terminal state
    pub fn close(&mut self) {
        *self = SessionState::Closed;
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, SessionState::Closed)
    }

    /// Selected group, if any
    pub fn group(&self) -> Option<&str> {
        match self {
            SessionState::GroupSelected { group, .. } => Some(group),
            _ => None,
        }
    }

    /// Current article number, if any
    pub fn current(&self) -> Option<u64> {
        match self {
            SessionState::GroupSelected { current, .. } => *current,
            _ => None,
        }
    }

    /// Selected group or `NoGroupSelected`
    pub fn require_group(&self) -> Result<&str> {
        self.group().ok_or(NntpError::NoGroupSelected)
    }

    /// Selected group and current number, or the matching error
    pub fn require_current(&self) -> Result<(&str, u64)> {
        let group = self.require_group()?;
        let current = self.current().ok_or(NntpError::NoCurrentArticle)?;
        Ok((group, current))
    }
}
