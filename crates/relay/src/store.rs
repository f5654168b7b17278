//! Active mapping table with fingerprint-gated reloads.
//!
//! The active table lives behind `RwLock<Arc<MappingSnapshot>>`. Readers clone
//! the `Arc` and release the lock immediately; a reload builds a complete new
//! snapshot and swaps the pointer. A lookup therefore always sees one whole
//! table, old or new, never a mix.

use std::sync::{Arc, PoisonError, RwLock};

use routing::{Fingerprint, MappingError, MappingProvider, MappingTable};
use tracing::{info, instrument, trace};

/// A table together with the fingerprint of the content it was parsed from.
#[derive(Debug, Default)]
pub struct MappingSnapshot {
    table: MappingTable,
    fingerprint: Option<Fingerprint>,
}

impl MappingSnapshot {
    /// The parsed table.
    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// Fingerprint of the source content; `None` before the first load.
    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprint.as_ref()
    }
}

/// What a call to [`MappingStore::refresh_now`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fingerprint matched the active one; nothing was parsed.
    Unchanged,
    /// A new table was parsed and is now active.
    Replaced {
        /// Distinct keys in the new table.
        keys: usize,
        /// Records the new table was built from.
        records: usize,
    },
}

/// Holds the active mapping table and reloads it from a [`MappingProvider`].
pub struct MappingStore {
    provider: Box<dyn MappingProvider>,
    file_matching: bool,
    active: RwLock<Arc<MappingSnapshot>>,
    // Serializes refreshes so concurrent callers never parse the same change twice.
    refresh_guard: tokio::sync::Mutex<()>,
}

impl MappingStore {
    /// Creates a store with an empty table and no fingerprint.
    ///
    /// Nothing is loaded until [`refresh_now`](Self::refresh_now) is called.
    pub fn new(provider: Box<dyn MappingProvider>, file_matching: bool) -> Self {
        Self {
            provider,
            file_matching,
            active: RwLock::new(Arc::new(MappingSnapshot::default())),
            refresh_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Location of the underlying source.
    pub fn location(&self) -> String {
        self.provider.location()
    }

    /// Returns the active snapshot.
    pub fn snapshot(&self) -> Arc<MappingSnapshot> {
        Arc::clone(&self.active.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Fingerprint of the active table; `None` until a load succeeded.
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.snapshot().fingerprint().cloned()
    }

    /// Returns `true` once a table has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.snapshot().fingerprint().is_some()
    }

    /// Fetches, parses and fingerprints the source without activating it.
    ///
    /// The fingerprint is fetched before the content, so a change landing
    /// mid-load is seen as a change by the next refresh.
    ///
    /// # Errors
    ///
    /// Any source or parse failure; no partial table is ever returned.
    pub async fn load(&self) -> Result<(MappingTable, Fingerprint), MappingError> {
        let fetched = self.provider.fetch_fingerprint().await?;
        self.load_with(fetched).await
    }

    /// Loads the source only if its fingerprint differs from `current`.
    ///
    /// Returns `Ok(None)` when the fingerprint is unchanged.
    pub async fn refresh(
        &self,
        current: Option<&Fingerprint>,
    ) -> Result<Option<(MappingTable, Fingerprint)>, MappingError> {
        let latest = self.provider.fetch_fingerprint().await?;
        match current {
            Some(active) if *active == latest => {
                trace!(fingerprint = %latest, "mapping unchanged");
                return Ok(None);
            }
            Some(active) => {
                info!(old = %active, new = %latest, "hash of mapping has changed");
            }
            None => {}
        }

        self.load_with(latest).await.map(Some)
    }

    /// Reads and parses the content. `fetched` is the fingerprint obtained
    /// before the read; a fingerprint of the bytes actually read wins over it.
    #[instrument(skip_all, fields(location = %self.provider.location()))]
    async fn load_with(&self, fetched: Fingerprint) -> Result<(MappingTable, Fingerprint), MappingError> {
        info!("reading mapping");

        let content = self.provider.fetch_content().await?;
        let text = std::str::from_utf8(&content).map_err(|e| MappingError::Encoding {
            message: e.to_string(),
        })?;
        let table = MappingTable::parse(text, self.file_matching)?;
        let fingerprint = self.provider.content_fingerprint(&content).unwrap_or(fetched);

        info!(
            records = table.record_count(),
            keys = table.len(),
            fingerprint = %fingerprint,
            "successfully read mappings"
        );
        Ok((table, fingerprint))
    }

    /// Refreshes against the active fingerprint and swaps in the result.
    ///
    /// On error the active table and fingerprint are left untouched.
    pub async fn refresh_now(&self) -> Result<RefreshOutcome, MappingError> {
        let _guard = self.refresh_guard.lock().await;

        let current = self.fingerprint();
        let Some((table, fingerprint)) = self.refresh(current.as_ref()).await? else {
            return Ok(RefreshOutcome::Unchanged);
        };

        let outcome = RefreshOutcome::Replaced {
            keys: table.len(),
            records: table.record_count(),
        };
        let next = Arc::new(MappingSnapshot {
            table,
            fingerprint: Some(fingerprint),
        });
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = next;

        Ok(outcome)
    }
}

impl std::fmt::Debug for MappingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingStore")
            .field("location", &self.provider.location())
            .field("file_matching", &self.file_matching)
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
