//! Composite lookup keys and the mapping table they index.
//!
//! ## Source format
//!
//! One mapping per line, fields separated by `;`:
//!
//! ```text
//! repository;branch;job[;path]
//! ```
//!
//! The `path` field is mandatory exactly when file matching is enabled. Lines
//! sharing a key append to the same job list in order of appearance;
//! duplicates are kept.

use std::collections::HashMap;

use crate::{JobId, MappingError};

/// Separator between the components of a serialized [`MappingKey`].
pub const KEY_SEPARATOR: char = '|';

/// Separator between the fields of a mapping record.
pub const FIELD_SEPARATOR: char = ';';

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// A serialized `(repository, branch[, path])` tuple.
///
/// Opaque after construction: two keys are equal iff their joined strings are
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MappingKey(String);

impl MappingKey {
    /// Builds a `repository|branch` key.
    pub fn branch(repository: &str, branch: &str) -> Self {
        Self::from_parts(&[repository, branch])
    }

    /// Builds a `repository|branch|path` key.
    pub fn file(repository: &str, branch: &str, path: &str) -> Self {
        Self::from_parts(&[repository, branch, path])
    }

    fn from_parts(parts: &[&str]) -> Self {
        let mut joined = String::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                joined.push(KEY_SEPARATOR);
            }
            joined.push_str(part);
        }
        Self(joined)
    }

    /// Returns the serialized key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MappingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Immutable key → job-list table.
///
/// Built in full from a record set and never mutated afterwards; reloading
/// produces a new table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: HashMap<String, Vec<JobId>>,
    records: usize,
}

impl MappingTable {
    /// Parses a complete record set.
    ///
    /// Any malformed record fails the whole parse. Blank lines are skipped and
    /// a trailing `\r` is ignored so CRLF files parse the same as LF files.
    pub fn parse(content: &str, file_matching: bool) -> Result<Self, MappingError> {
        let mut entries: HashMap<String, Vec<JobId>> = HashMap::new();
        let mut records = 0;

        for (index, raw) in content.lines().enumerate() {
            let line = index + 1;
            let record = raw.strip_suffix('\r').unwrap_or(raw);
            if record.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
            if fields.len() < 3 {
                return Err(MappingError::MissingFields {
                    line,
                    found: fields.len(),
                });
            }

            let repository = required(fields[0], line, "repository")?;
            let branch = required(fields[1], line, "branch")?;
            let job = JobId::new(fields[2]).ok_or(MappingError::EmptyField { line, field: "job" })?;

            let key = if file_matching {
                let path = fields
                    .get(3)
                    .filter(|p| !p.is_empty())
                    .ok_or(MappingError::MissingPath { line })?;
                MappingKey::file(repository, branch, path)
            } else {
                MappingKey::branch(repository, branch)
            };

            entries.entry(key.0).or_default().push(job);
            records += 1;
        }

        Ok(Self { entries, records })
    }

    /// Returns the jobs stored under `key`, in insertion order.
    pub fn get(&self, key: &str) -> Option<&[JobId]> {
        self.entries
            .get(key)
            .map(Vec::as_slice)
            .filter(|jobs| !jobs.is_empty())
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records the table was built from.
    pub fn record_count(&self) -> usize {
        self.records
    }
}

fn required<'a>(value: &'a str, line: usize, field: &'static str) -> Result<&'a str, MappingError> {
    if value.is_empty() {
        Err(MappingError::EmptyField { line, field })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
#[path = "mapping_tests.rs"]
mod tests;
