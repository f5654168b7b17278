//! Shared value types for the trigger relay domain.

use chrono::{DateTime, Utc};

use crate::{BranchName, RepositoryId};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Branch assumed when an inbound event does not name one.
pub const DEFAULT_BRANCH: &str = "master";

/// A source-control push, reduced to what job resolution needs.
///
/// `files` holds repository-relative paths of changed files. It is only
/// consulted when file matching is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    /// Repository the push happened in.
    pub repository: RepositoryId,
    /// Branch that received the push.
    pub branch: BranchName,
    /// Changed file paths, relative to the repository root.
    pub files: Vec<String>,
}

impl PushEvent {
    /// Creates an event without any changed-file information.
    pub fn new(repository: RepositoryId, branch: BranchName) -> Self {
        Self {
            repository,
            branch,
            files: Vec::new(),
        }
    }

    /// Attaches changed-file paths to the event.
    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp, for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns the timestamp shifted `delay` into the future.
    ///
    /// Saturates at the unshifted value if `delay` does not fit chrono's range.
    pub fn after(self, delay: std::time::Duration) -> Self {
        match chrono::Duration::from_std(delay) {
            Ok(d) => Self(self.0.checked_add_signed(d).unwrap_or(self.0)),
            Err(_) => self,
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
