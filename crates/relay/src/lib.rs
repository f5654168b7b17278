//! Trigger relay orchestration.
//!
//! This crate owns the relay's shared mutable state and the tasks that touch
//! it concurrently:
//!
//! - [`MappingStore`]: the active mapping table, replaced atomically by the
//!   periodic refresh task and read by every request.
//! - [`DebounceScheduler`]: one pending timer per job, armed by requests and
//!   cleared by the timers themselves.
//! - [`TriggerRelay`]: the facade the listener calls: `resolve`,
//!   `schedule_triggers`, `handle_event`, `refresh_now`, and the cancellable
//!   refresh loop.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Sequences calls between the business logic in the
//! [`routing`] crate and the port traits it defines. Contains no parsing or
//! matching rules of its own.

pub mod scheduler;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_support;

pub use scheduler::DebounceScheduler;
pub use service::{TriggerRelay, MIN_REFRESH_PERIOD};
pub use store::{MappingSnapshot, MappingStore, RefreshOutcome};
