//! Event → candidate keys → job ids.
//!
//! [`KeyResolver`] turns a [`PushEvent`] into one or more [`MappingKey`]s and
//! probes a [`MappingTable`] with them.
//!
//! ## Lookup
//!
//! Each candidate key is probed independently:
//!
//! 1. An exact hit appends all of the key's jobs to the result.
//! 2. Otherwise, with file matching enabled, the key is shortened one
//!    character at a time and re-probed after each removal. The first hit
//!    wins; the walk gives up once a single character is left.
//!
//! The walk is not path-aware. `repo|main|folder` matches a changed file
//! `foldergreedy` as well as `folder/sub`.
//!
//! Results across keys are concatenated without de-duplication.

use tracing::{debug, trace};

use crate::{JobId, MappingKey, MappingTable, PushEvent, ResolveError};

/// Builds candidate keys from events and resolves them against a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyResolver {
    file_matching: bool,
    semantic_repo_prefix: Option<String>,
}

impl KeyResolver {
    /// Creates a resolver.
    ///
    /// An empty `semantic_repo_prefix` is treated as not configured.
    pub fn new(file_matching: bool, semantic_repo_prefix: Option<String>) -> Self {
        Self {
            file_matching,
            semantic_repo_prefix: semantic_repo_prefix.filter(|p| !p.is_empty()),
        }
    }

    /// Returns `true` if keys include changed-file paths.
    pub fn file_matching(&self) -> bool {
        self.file_matching
    }

    /// Derives the ordered list of candidate keys for `event`.
    ///
    /// - File matching disabled: exactly one `repository|branch` key.
    /// - File matching enabled: one `repository|branch|path` key per file,
    ///   with the semantic package name prepended to each path when the
    ///   repository belongs to the semantic group. No files, no keys.
    pub fn candidate_keys(&self, event: &PushEvent) -> Vec<MappingKey> {
        let repository = event.repository.as_str();
        let branch = event.branch.as_str();

        if !self.file_matching {
            return vec![MappingKey::branch(repository, branch)];
        }

        match self.package_name(repository) {
            Some(package) => event
                .files
                .iter()
                .map(|file| MappingKey::file(repository, branch, &format!("{package}/{file}")))
                .collect(),
            None => event
                .files
                .iter()
                .map(|file| MappingKey::file(repository, branch, file))
                .collect(),
        }
    }

    /// Reduces `repository` to a package name using the semantic prefix.
    ///
    /// Returns `None` when no prefix is configured, the repository is outside
    /// the prefix, or the remainder still looks like a path or URL.
    pub fn package_name<'a>(&self, repository: &'a str) -> Option<&'a str> {
        let prefix = self.semantic_repo_prefix.as_deref()?;
        let name = repository.strip_suffix(".git").unwrap_or(repository);
        let remainder = name.strip_prefix(prefix)?;

        if remainder.is_empty() || remainder.contains(['/', ':', '.']) {
            return None;
        }

        debug!(repository, package = remainder, "found semantic repository");
        Some(remainder)
    }

    /// Probes `table` with every key and collects the hits.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NoMappingFound`] if no key produced any job.
    pub fn lookup(&self, table: &MappingTable, keys: &[MappingKey]) -> Result<Vec<JobId>, ResolveError> {
        let mut hits = Vec::new();

        for key in keys {
            trace!(key = key.as_str(), "searching mappings");

            if let Some(jobs) = table.get(key.as_str()) {
                hits.extend_from_slice(jobs);
            } else if self.file_matching {
                if let Some(jobs) = truncated_match(table, key.as_str()) {
                    hits.extend_from_slice(jobs);
                }
            }
        }

        if hits.is_empty() {
            return Err(ResolveError::NoMappingFound { keys: keys.len() });
        }

        debug!(count = hits.len(), "mappings found");
        Ok(hits)
    }

    /// Derives keys for `event` and looks them up in one step.
    pub fn resolve(&self, table: &MappingTable, event: &PushEvent) -> Result<Vec<JobId>, ResolveError> {
        let keys = self.candidate_keys(event);
        self.lookup(table, &keys)
    }
}

/// Drops one trailing character at a time until a probe hits or one
/// character is left.
fn truncated_match<'t>(table: &'t MappingTable, key: &str) -> Option<&'t [JobId]> {
    truncations(key).find_map(|probe| {
        let jobs = table.get(probe)?;
        trace!(key, matched = probe, "greedy match");
        Some(jobs)
    })
}

/// Successively shorter prefixes of `key`, one character less each time,
/// ending with the one-character prefix.
fn truncations(key: &str) -> impl Iterator<Item = &str> {
    key.char_indices().skip(1).collect::<Vec<_>>().into_iter().rev().map(move |(end, _)| &key[..end])
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
