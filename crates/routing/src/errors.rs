//! Error types for the trigger relay domain.
//!
//! Each component has its own error enum. [`RelayError`] is the top-level type
//! for conditions that must stop the process before it starts serving; every
//! other error is recovered locally (logged, prior state preserved).
//!
//! | Error | Produced by | Fatal? |
//! |-------|-------------|--------|
//! | [`ResolveError`] | key lookup | never; reported to the caller as "not found" |
//! | [`MappingError`] | mapping load / refresh | only during startup |
//! | [`SourceError`] | mapping source adapters | only during startup |
//! | [`TriggerError`] | job trigger adapters | never; logged, not retried |
//! | [`RelayError`] | composition root | always |

use thiserror::Error;

use crate::JobId;

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Failure to derive any job from an inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// None of the candidate keys produced a hit, exact or truncated.
    ///
    /// `keys` is the number of candidate keys probed; zero means the event
    /// carried no files while file matching is enabled.
    #[error("no mappings found ({keys} candidate keys probed)")]
    NoMappingFound {
        /// Number of candidate keys probed.
        keys: usize,
    },
}

// ---------------------------------------------------------------------------
// Mapping sources
// ---------------------------------------------------------------------------

/// Failure to obtain raw content or a fingerprint from a mapping source.
///
/// Messages are captured as strings so this crate stays free of I/O types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Local file could not be read.
    #[error("failed to read mapping file '{location}': {message}")]
    Io {
        /// Path of the file.
        location: String,
        /// Underlying I/O error text.
        message: String,
    },

    /// Remote request could not be completed (connect, timeout, body read).
    #[error("request to '{location}' failed: {message}")]
    Http {
        /// Requested URL.
        location: String,
        /// Underlying transport error text.
        message: String,
    },

    /// Remote server answered with a non-2xx status.
    #[error("request to '{location}' returned status {status}")]
    Status {
        /// Requested URL.
        location: String,
        /// HTTP status code received.
        status: u16,
    },

    /// Remote fingerprint resource was empty.
    #[error("fingerprint resource '{location}' is empty")]
    EmptyFingerprint {
        /// Requested URL.
        location: String,
    },
}

// ---------------------------------------------------------------------------
// Mapping table
// ---------------------------------------------------------------------------

/// Failure to load or reload the mapping table.
///
/// Any of these aborts the whole load: a table is never built partially.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The source could not be read.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A record has fewer than the three mandatory fields.
    #[error("line {line}: expected at least 3 fields separated by ';', found {found}")]
    MissingFields {
        /// 1-based line number in the source.
        line: usize,
        /// Number of fields actually present.
        found: usize,
    },

    /// File matching is enabled but a record lacks the fourth (path) field.
    #[error("line {line}: no file matching information provided in mapping")]
    MissingPath {
        /// 1-based line number in the source.
        line: usize,
    },

    /// A mandatory field is present but empty.
    #[error("line {line}: field '{field}' is empty")]
    EmptyField {
        /// 1-based line number in the source.
        line: usize,
        /// Name of the empty field.
        field: &'static str,
    },

    /// The source content is not valid UTF-8.
    #[error("mapping content is not valid UTF-8: {message}")]
    Encoding {
        /// Decoder error text.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Job trigger
// ---------------------------------------------------------------------------

/// Failure of a single outbound trigger attempt.
///
/// Terminal for that attempt: triggers are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerError {
    /// The request could not be sent or timed out.
    #[error("triggering job '{job}' failed: {message}")]
    Request {
        /// Job that was being triggered.
        job: JobId,
        /// Underlying transport error text.
        message: String,
    },

    /// The build server answered with a non-2xx status.
    #[error("triggering job '{job}' returned status {status}")]
    Status {
        /// Job that was being triggered.
        job: JobId,
        /// HTTP status code received.
        status: u16,
    },
}

// ---------------------------------------------------------------------------
// Process-level errors
// ---------------------------------------------------------------------------

/// Errors that prevent the relay from starting.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The runtime configuration is invalid.
    ///
    /// Produced at startup; the relay never serves with an invalid config.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The initial mapping load failed.
    #[error("Initial mapping load failed: {0}")]
    StartupLoad(#[from] MappingError),
}
