//! Build server trigger adapter.
//!
//! Implements the [`routing::JobTrigger`] trait against the Jenkins remote
//! build API: `POST <server>[/job/<folder>]/job/<job>/build`.
//!
//! ## Authentication
//!
//! - User configured: HTTP basic auth with `user:token`.
//! - No user: the token is sent as the job's remote trigger token
//!   (`?token=<token>`).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL layout, authentication and HTTP transport live
//! here. The scheduler only sees [`routing::JobTrigger`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use routing::{JobId, JobTrigger, TriggerError};
use thiserror::Error;
use tracing::{debug, instrument};

/// Timeout applied to every trigger request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for the build server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JenkinsConfig {
    /// Server base URL, e.g. `https://ci.example.com`.
    pub url: String,
    /// Folder or multibranch root every job lives under.
    pub folder: Option<String>,
    /// User for basic auth. Without one the token is a remote trigger token.
    pub user: Option<String>,
    /// API token (with `user`) or remote trigger token (without).
    pub token: String,
    /// Skip TLS certificate verification.
    pub accept_invalid_certs: bool,
}

/// Errors building a [`JenkinsTrigger`].
#[derive(Debug, Error)]
pub enum JenkinsError {
    /// Server URL missing.
    #[error("no build server URL defined")]
    MissingUrl,

    /// Token missing.
    #[error("no build server token defined")]
    MissingToken,

    /// HTTP client could not be created.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Triggers jobs on a Jenkins server.
#[derive(Debug, Clone)]
pub struct JenkinsTrigger {
    client: Client,
    project_url: String,
    user: Option<String>,
    token: String,
}

impl JenkinsTrigger {
    /// Validates `config` and creates a trigger with [`REQUEST_TIMEOUT`].
    pub fn new(config: JenkinsConfig) -> Result<Self, JenkinsError> {
        let base = config.url.trim_end_matches('/');
        if base.is_empty() {
            return Err(JenkinsError::MissingUrl);
        }
        if config.token.is_empty() {
            return Err(JenkinsError::MissingToken);
        }

        let project_url = match config.folder.as_deref().filter(|f| !f.is_empty()) {
            Some(folder) => format!("{base}/job/{folder}"),
            None => base.to_string(),
        };
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            project_url,
            user: config.user.filter(|u| !u.is_empty()),
            token: config.token,
        })
    }

    /// URL jobs are resolved against, including the folder if any.
    pub fn project_url(&self) -> &str {
        &self.project_url
    }

    /// Build URL for `job`.
    pub fn job_url(&self, job: &JobId) -> String {
        format!("{}/job/{}/build", self.project_url, job)
    }
}

#[async_trait]
impl JobTrigger for JenkinsTrigger {
    #[instrument(skip_all, fields(job = %job))]
    async fn fire(&self, job: &JobId) -> Result<(), TriggerError> {
        let url = self.job_url(job);
        let request = match &self.user {
            Some(user) => self.client.post(&url).basic_auth(user, Some(&self.token)),
            None => self.client.post(&url).query(&[("token", &self.token)]),
        };

        debug!(url = %url, "sending build request");
        let response = request.send().await.map_err(|e| TriggerError::Request {
            job: job.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TriggerError::Status {
                job: job.clone(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
