//! Core domain for the trigger relay.
//!
//! The relay receives source-control push events and starts build jobs on a
//! downstream build server. This crate holds the part of that which is pure
//! logic: turning an event into lookup keys, parsing the mapping table, and
//! resolving keys to job ids. It also defines the port traits the I/O crates
//! implement.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RepositoryId`, `JobId`, `Fingerprint`, etc.) |
//! | [`types`] | Shared value types (`PushEvent`, `Timestamp`) |
//! | [`mapping`] | `MappingKey`, `MappingTable` and the record parser |
//! | [`resolver`] | `KeyResolver`: candidate keys and exact/greedy lookup |
//! | [`ports`] | `MappingProvider` and `JobTrigger` traits |
//! | [`errors`] | Component and process-level error types |

pub mod errors;
pub mod identifiers;
pub mod mapping;
pub mod ports;
pub mod resolver;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{MappingError, RelayError, ResolveError, SourceError, TriggerError};
pub use identifiers::{ArmId, BranchName, Fingerprint, JobId, RepositoryId};
pub use mapping::{MappingKey, MappingTable, FIELD_SEPARATOR, KEY_SEPARATOR};
pub use ports::{JobTrigger, MappingProvider};
pub use resolver::KeyResolver;
pub use types::{PushEvent, Timestamp, DEFAULT_BRANCH};
