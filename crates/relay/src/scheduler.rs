//! Per-job debounce timers.
//!
//! Each job is either idle or armed. Arming an armed job aborts its timer and
//! starts a new one, so a job fires once per quiet period of silence, no
//! matter how many events matched it in between.
//!
//! ```text
//! idle ──arm──▶ armed ──quiet period elapses──▶ fire ──▶ idle
//!                 │  ▲
//!                 └──┘ arm (abort + restart)
//! ```
//!
//! The pending map is guarded by one mutex. `arm` holds it across
//! remove-abort-spawn-insert; an elapsed timer holds it while it checks that
//! the entry still carries its own [`ArmId`] and removes it. The trigger call
//! happens after the entry is gone and outside the lock: a newer arm then
//! starts a fresh timer instead of aborting the in-flight call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use routing::{ArmId, JobId, JobTrigger, Timestamp};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

#[derive(Debug)]
struct PendingTrigger {
    arm_id: ArmId,
    fires_at: Instant,
    handle: JoinHandle<()>,
}

struct Inner {
    quiet_period: Duration,
    trigger: Arc<dyn JobTrigger>,
    pending: Mutex<HashMap<JobId, PendingTrigger>>,
}

impl Inner {
    fn lock_pending(&self) -> MutexGuard<'_, HashMap<JobId, PendingTrigger>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[instrument(skip_all, fields(job = %job, arm = %arm_id))]
    async fn elapse(&self, job: JobId, arm_id: ArmId) {
        let claimed = {
            let mut pending = self.lock_pending();
            match pending.get(&job) {
                Some(entry) if entry.arm_id == arm_id => pending.remove(&job).is_some(),
                _ => false,
            }
        };
        if !claimed {
            trace!("timer superseded");
            return;
        }

        info!("quiet period exceeded");
        match self.trigger.fire(&job).await {
            Ok(()) => info!("job triggered"),
            Err(e) => warn!(error = %e, "job trigger failed"),
        }
    }
}

/// Coalesces repeated trigger requests per job into one delayed fire.
///
/// Cheap to clone; clones share the same pending map.
#[derive(Clone)]
pub struct DebounceScheduler {
    inner: Arc<Inner>,
}

impl DebounceScheduler {
    /// Creates a scheduler that fires `trigger` after `quiet_period` of silence.
    pub fn new(quiet_period: Duration, trigger: Arc<dyn JobTrigger>) -> Self {
        Self {
            inner: Arc::new(Inner {
                quiet_period,
                trigger,
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The configured quiet period.
    pub fn quiet_period(&self) -> Duration {
        self.inner.quiet_period
    }

    /// Arms (or re-arms) the timer for `job`.
    ///
    /// Any pending timer for the job is aborted first. Must be called from
    /// within a Tokio runtime.
    pub fn arm(&self, job: JobId) -> ArmId {
        let arm_id = ArmId::new_random();
        let quiet_period = self.inner.quiet_period;
        let mut pending = self.inner.lock_pending();

        if let Some(previous) = pending.remove(&job) {
            previous.handle.abort();
            debug!(job = %job, previous = %previous.arm_id, "resetting timer");
        }

        let fires_at = Instant::now() + quiet_period;
        let inner = Arc::clone(&self.inner);
        let timer_job = job.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(fires_at).await;
            inner.elapse(timer_job, arm_id).await;
        });

        debug!(
            job = %job,
            arm = %arm_id,
            quiet_period_secs = quiet_period.as_secs_f64(),
            fires_at = %Timestamp::now().after(quiet_period),
            "timer armed"
        );
        pending.insert(
            job,
            PendingTrigger {
                arm_id,
                fires_at,
                handle,
            },
        );

        arm_id
    }

    /// Returns `true` if `job` has a timer that has not fired yet.
    pub fn is_pending(&self, job: &JobId) -> bool {
        self.inner.lock_pending().contains_key(job)
    }

    /// Deadline of the pending timer for `job`, on the Tokio clock the timer
    /// sleeps on.
    pub fn fires_at(&self, job: &JobId) -> Option<Instant> {
        self.inner.lock_pending().get(job).map(|p| p.fires_at)
    }

    /// Number of armed jobs.
    pub fn pending_count(&self) -> usize {
        self.inner.lock_pending().len()
    }

    /// Jobs that are currently armed, in no particular order.
    pub fn pending_jobs(&self) -> Vec<JobId> {
        self.inner.lock_pending().keys().cloned().collect()
    }
}

impl std::fmt::Debug for DebounceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebounceScheduler")
            .field("quiet_period", &self.inner.quiet_period)
            .field("pending", &self.pending_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
