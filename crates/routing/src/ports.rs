//! Port traits implemented by infrastructure crates.
//!
//! The relay reaches the outside world only through these two traits. Both are
//! object-safe (via `async_trait`) so the composition root can inject
//! `Box<dyn MappingProvider>` / `Arc<dyn JobTrigger>`.

use async_trait::async_trait;

use crate::{Fingerprint, JobId, SourceError, TriggerError};

/// Supplies raw mapping content and its fingerprint.
#[async_trait]
pub trait MappingProvider: Send + Sync {
    /// Human-readable location (path or URL), used in logs.
    fn location(&self) -> String;

    /// Fetches the full raw content.
    async fn fetch_content(&self) -> Result<Vec<u8>, SourceError>;

    /// Fetches the current fingerprint.
    ///
    /// Must be cheap relative to [`fetch_content`](Self::fetch_content) or at
    /// least avoid a reparse: an unchanged fingerprint skips the reload.
    async fn fetch_fingerprint(&self) -> Result<Fingerprint, SourceError>;

    /// Fingerprint of content already fetched, for sources that can compute
    /// it locally.
    ///
    /// Sources returning `None` are fingerprinted with the value fetched
    /// before the content.
    fn content_fingerprint(&self, _content: &[u8]) -> Option<Fingerprint> {
        None
    }
}

/// Performs the outbound call that starts a build job.
///
/// Best-effort: callers log failures and never retry.
#[async_trait]
pub trait JobTrigger: Send + Sync {
    /// Triggers `job` once.
    async fn fire(&self, job: &JobId) -> Result<(), TriggerError>;
}
