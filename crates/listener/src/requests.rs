//! Turning inbound HTTP requests into [`PushEvent`]s.
//!
//! Two request shapes are accepted:
//!
//! - a plain query string: `?repo=<url>&branch=<name>&files=<path>&files=<path>`
//!   (`file=` is accepted as an alias of `files=`);
//! - a GitLab push webhook body.

use std::collections::BTreeSet;

use routing::{BranchName, PushEvent, RepositoryId};
use serde::Deserialize;
use thiserror::Error;

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// A request that cannot be turned into an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The `repo` parameter is absent or empty.
    #[error("repo is missing")]
    MissingRepository,

    /// The webhook body is not valid JSON of the expected shape.
    #[error("malformed webhook body: {message}")]
    MalformedBody {
        /// Decoder error text.
        message: String,
    },
}

/// Builds an event from query-string pairs.
///
/// The first non-empty `repo` and `branch` win; a missing branch means
/// [`routing::DEFAULT_BRANCH`]. Files are only collected when `file_matching` is on.
pub fn parse_query(pairs: &[(String, String)], file_matching: bool) -> Result<PushEvent, RequestError> {
    let first = |name: &str| {
        pairs
            .iter()
            .find(|(k, v)| k == name && !v.is_empty())
            .map(|(_, v)| v.as_str())
    };

    let repository = first("repo")
        .and_then(RepositoryId::new)
        .ok_or(RequestError::MissingRepository)?;
    let branch = branch_or_default(first("branch"));

    let files = if file_matching {
        pairs
            .iter()
            .filter(|(k, v)| (k == "files" || k == "file") && !v.is_empty())
            .map(|(_, v)| v.clone())
            .collect()
    } else {
        Vec::new()
    };

    Ok(PushEvent::new(repository, branch).with_files(files))
}

#[derive(Debug, Default, Deserialize)]
struct GitLabProject {
    #[serde(default)]
    git_http_url: String,
    #[serde(default)]
    git_ssh_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct GitLabCommit {
    #[serde(default)]
    added: Vec<String>,
    #[serde(default)]
    modified: Vec<String>,
    #[serde(default)]
    removed: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabPush {
    #[serde(rename = "ref", default)]
    git_ref: String,
    #[serde(default)]
    project: GitLabProject,
    #[serde(default)]
    commits: Vec<GitLabCommit>,
}

/// Builds one event per repository URL (HTTP, then SSH) of a GitLab push.
///
/// Changed files are the de-duplicated, sorted union over all commits and
/// are only collected when `file_matching` is on. Empty URLs are skipped, so
/// the result may be empty.
pub fn parse_gitlab_push(body: &[u8], file_matching: bool) -> Result<Vec<PushEvent>, RequestError> {
    let push: GitLabPush = serde_json::from_slice(body).map_err(|e| RequestError::MalformedBody {
        message: e.to_string(),
    })?;

    let branch = branch_or_default(push.git_ref.strip_prefix(BRANCH_REF_PREFIX));

    let files: Vec<String> = if file_matching {
        push.commits
            .iter()
            .flat_map(|c| c.added.iter().chain(&c.modified).chain(&c.removed))
            .filter(|f| !f.is_empty())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    } else {
        Vec::new()
    };

    let events = [push.project.git_http_url, push.project.git_ssh_url]
        .into_iter()
        .filter_map(RepositoryId::new)
        .map(|repository| PushEvent::new(repository, branch.clone()).with_files(files.iter().cloned()))
        .collect();
    Ok(events)
}

fn branch_or_default(branch: Option<&str>) -> BranchName {
    branch
        .and_then(BranchName::new)
        .unwrap_or_else(BranchName::default_branch)
}

#[cfg(test)]
#[path = "requests_tests.rs"]
mod tests;
