//! The relay facade used by the request-handling layer.
//!
//! [`TriggerRelay`] ties the three core pieces together:
//!
//! ```text
//! PushEvent ─▶ KeyResolver ─▶ MappingStore (active table) ─▶ job ids
//!                                                              │
//!                                       DebounceScheduler::arm ◀┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use routing::{JobId, KeyResolver, MappingError, PushEvent, ResolveError};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};

use crate::{DebounceScheduler, MappingStore, RefreshOutcome};

/// Shortest refresh period the background loop accepts.
pub const MIN_REFRESH_PERIOD: Duration = Duration::from_secs(1);

/// Resolves events to jobs and schedules their triggers.
#[derive(Debug)]
pub struct TriggerRelay {
    resolver: KeyResolver,
    store: MappingStore,
    scheduler: DebounceScheduler,
}

impl TriggerRelay {
    /// Assembles a relay from its parts.
    ///
    /// `store` should already be loaded; see [`refresh_now`](Self::refresh_now).
    pub fn new(resolver: KeyResolver, store: MappingStore, scheduler: DebounceScheduler) -> Self {
        Self {
            resolver,
            store,
            scheduler,
        }
    }

    /// The key resolver.
    pub fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    /// The mapping store.
    pub fn store(&self) -> &MappingStore {
        &self.store
    }

    /// The debounce scheduler.
    pub fn scheduler(&self) -> &DebounceScheduler {
        &self.scheduler
    }

    /// Returns `true` once a mapping table is active.
    pub fn is_ready(&self) -> bool {
        self.store.is_loaded()
    }

    /// Resolves `event` against the active table.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NoMappingFound`] when no candidate key produced a job.
    pub fn resolve(&self, event: &PushEvent) -> Result<Vec<JobId>, ResolveError> {
        let snapshot = self.store.snapshot();
        self.resolver.resolve(snapshot.table(), event)
    }

    /// Arms the scheduler once per entry in `jobs`.
    pub fn schedule_triggers(&self, jobs: &[JobId]) {
        for job in jobs {
            self.scheduler.arm(job.clone());
        }
    }

    /// Resolves `event` and schedules every matched job.
    #[instrument(
        skip_all,
        fields(repository = %event.repository, branch = %event.branch, files = event.files.len())
    )]
    pub fn handle_event(&self, event: &PushEvent) -> Result<Vec<JobId>, ResolveError> {
        let jobs = match self.resolve(event) {
            Ok(jobs) => jobs,
            Err(e) => {
                debug!(reason = %e, "no job for event");
                return Err(e);
            }
        };

        self.schedule_triggers(&jobs);
        info!(jobs = jobs.len(), "triggers scheduled");
        Ok(jobs)
    }

    /// Reloads the mapping if its fingerprint changed.
    ///
    /// On error the previous table stays active.
    #[instrument(skip_all, fields(location = %self.store.location()))]
    pub async fn refresh_now(&self) -> Result<RefreshOutcome, MappingError> {
        let outcome = self.store.refresh_now().await?;
        if let RefreshOutcome::Replaced { keys, records } = outcome {
            info!(keys, records, "mapping table replaced");
        }
        Ok(outcome)
    }

    /// Refreshes the mapping every `period` until `shutdown` turns `true` or
    /// its sender is dropped.
    ///
    /// The first refresh happens one `period` after the call. Failures are
    /// logged and the loop carries on with the previous table. Periods below
    /// [`MIN_REFRESH_PERIOD`] are raised to it.
    pub async fn run_refresh_loop(self: Arc<Self>, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let period = period.max(MIN_REFRESH_PERIOD);
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(period_secs = period.as_secs(), "mapping refresh loop started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh_now().await {
                        error!(error = %e, "mapping refresh failed; keeping previous mapping");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("mapping refresh loop stopped");
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
